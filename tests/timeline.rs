use midi_replay::prelude::*;
use pretty_assertions::assert_eq;

/// Deterministic pseudo random timestamps
fn timestamps(n: usize, mut seed: u64) -> Vec<f64> {
    (0..n)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) % 5000) as f64 / 4.
        })
        .collect()
}

fn assert_partitioned(timeline: &Timeline) {
    let all = timeline.all();
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    if let (Some(last), Some(first)) = (timeline.played().last(), timeline.next_pending()) {
        assert!(last.timestamp <= first.timestamp);
    }
}

#[test]
fn one_by_one_insertion_matches_batch_sort() {
    let events: Vec<_> = timestamps(200, 7)
        .into_iter()
        .enumerate()
        .map(|(i, ts)| NoteEvent::note_on(0, (i % 128) as i32, ts, 64))
        .collect();

    let mut one_by_one = Timeline::new();
    for event in events.iter().cloned() {
        one_by_one.insert(event, 0.);
        assert_partitioned(&one_by_one);
    }

    let mut batch = Timeline::new();
    batch.load(events, 0);

    assert_eq!(one_by_one.all(), batch.all());
}

#[test]
fn insertion_while_partitioned_keeps_the_invariant() {
    let mut timeline = Timeline::new();
    timeline.load(
        timestamps(50, 11)
            .into_iter()
            .map(|ts| NoteEvent::note_off(1, 40, ts))
            .collect(),
        0,
    );
    for (i, ts) in timestamps(100, 3).into_iter().enumerate() {
        let cursor = (i * 13 % 1250) as f64;
        timeline.seek(cursor);
        timeline.insert(NoteEvent::note_on(1, 40, ts, 1), cursor);
        assert_partitioned(&timeline);
    }
    assert_eq!(timeline.len(), 150);
}

#[test]
fn remove_events_superset_semantics() {
    let a = NoteEvent::note_on(0, 12, 0., 100);
    let b = NoteEvent::note_off(0, 12, 100.);
    let c = NoteEvent::note_on(0, 14, 200., 100);

    let mut timeline = Timeline::new();
    timeline.load(vec![a.clone(), b.clone(), c.clone()], 0);
    assert_eq!(timeline.remove_matching(&Pattern::new().with("note", 12)), 2);
    assert_eq!(timeline.all(), vec![c.clone()]);

    timeline.load(vec![a, b, c], 0);
    assert_eq!(timeline.remove_matching(&Pattern::new()), 3);
    assert!(timeline.is_empty());
}

#[test]
fn extra_fields_survive_every_operation() {
    let mut timeline = Timeline::new();
    timeline.load(
        vec![
            NoteEvent::note_on(0, 60, 0., 90).with_field("hand", "left"),
            NoteEvent::note_off(0, 60, 400.).with_field("hand", "left"),
            NoteEvent::note_on(0, 72, 100., 90).with_field("hand", "right"),
            NoteEvent::note_off(0, 72, 300.).with_field("hand", "right"),
        ],
        0,
    );
    timeline.insert(
        NoteEvent::note_on(0, 65, 350., 90).with_field("hand", "left"),
        0.,
    );
    timeline.reverse();
    timeline.seek(150.);

    let left = Pattern::new().with("hand", "left");
    assert_eq!(timeline.iter().filter(|e| left.matches(e)).count(), 3);
    assert_eq!(timeline.remove_matching(&Pattern::new().with("hand", "right")), 2);
    assert_eq!(timeline.len(), 3);
}

#[test]
fn reverse_twice_is_identity() {
    let mut events = Vec::new();
    for (i, start) in [0., 120., 240., 240., 480., 1000.].into_iter().enumerate() {
        let note = 60 + i as i32;
        let length = 100. + 50. * i as f64;
        events.push(NoteEvent::note_on(0, note, start, 100).with_length(length));
        events.push(NoteEvent::note_off(0, note, start + length));
    }
    let mut timeline = Timeline::new();
    timeline.load(events, 0);
    let before = timeline.all();

    timeline.reverse();
    assert_ne!(timeline.all(), before);
    assert_eq!(timeline.all()[0].timestamp, 0.);
    timeline.reverse();
    assert_eq!(timeline.all(), before);
}

#[test]
fn seek_boundary_is_pending() {
    let mut timeline = Timeline::new();
    timeline.load(
        vec![
            NoteEvent::note_on(0, 60, 100., 1),
            NoteEvent::note_on(0, 61, 200., 1),
            NoteEvent::note_on(0, 62, 200., 1),
        ],
        0,
    );
    timeline.seek(300.);
    timeline.seek(200.);
    assert_eq!(timeline.played().len(), 1);
    assert_eq!(timeline.pending().len(), 2);
    timeline.seek(200.);
    assert_eq!(timeline.pending().len(), 2);
}
