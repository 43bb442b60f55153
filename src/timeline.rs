#![doc = r#"
The ordered, seekable store of [`NoteEvent`]s behind a player.

Events are split at the play cursor into a *played* run and a *pending* run. Both runs are
sorted by timestamp, and every played event is no later than every pending event, so the
two runs concatenated are the whole timeline in order.

# Example
```rust
# use midi_replay::prelude::*;
let mut timeline = Timeline::new();
timeline.load(
    vec![
        NoteEvent::note_on(0, 60, 0., 100),
        NoteEvent::note_off(0, 60, 500.),
    ],
    0,
);
timeline.seek(250.);
assert_eq!(timeline.played().len(), 1);
assert_eq!(timeline.next_pending().map(|e| e.timestamp), Some(500.));
assert_eq!(timeline.duration(), 500.);
```
"#]

use crate::prelude::*;
use std::collections::VecDeque;

/// Events partitioned at the play cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    played: Vec<NoteEvent>,
    pending: VecDeque<NoteEvent>,
    duration: f64,
}

impl Timeline {
    /// An empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every event with `events`, all pending.
    ///
    /// The events are sorted by timestamp (keeping the given order among equal timestamps)
    /// and `note_shift` is added to every key.
    pub fn load(&mut self, mut events: Vec<NoteEvent>, note_shift: i32) {
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        if note_shift != 0 {
            for event in &mut events {
                event.note = event.note.saturating_add(note_shift);
            }
        }
        self.played.clear();
        self.pending = events.into();
        self.update_duration();
    }

    /// Moves events between the runs so the cursor sits at `target`.
    ///
    /// Events strictly before `target` end up played. Events at or after it end up pending,
    /// so an event exactly at `target` is dispatched when playback resumes.
    pub fn seek(&mut self, target: f64) {
        while let Some(event) = self.pending.pop_front() {
            if event.timestamp < target {
                self.played.push(event);
            } else {
                self.pending.push_front(event);
                break;
            }
        }
        while let Some(event) = self.played.pop() {
            if event.timestamp >= target {
                self.pending.push_front(event);
            } else {
                self.played.push(event);
                break;
            }
        }
    }

    /// Inserts one event in timestamp order.
    ///
    /// The event joins the played run when it is not after `current_time` and not after the
    /// first pending event; otherwise it is pending. Among equal timestamps it lands last.
    pub fn insert(&mut self, event: NoteEvent, current_time: f64) {
        let ts = event.timestamp;
        let before_pending = self.pending.front().is_none_or(|next| ts <= next.timestamp);
        if ts <= current_time && before_pending {
            let at = self.played.partition_point(|e| e.timestamp <= ts);
            self.played.insert(at, event);
        } else {
            let at = self.pending.partition_point(|e| e.timestamp <= ts);
            self.pending.insert(at, event);
        }
        self.update_duration();
    }

    /// Removes every event matched by `pattern` from both runs, returning how many went.
    pub fn remove_matching(&mut self, pattern: &Pattern) -> usize {
        let before = self.len();
        self.played.retain(|e| !pattern.matches(e));
        self.pending.retain(|e| !pattern.matches(e));
        self.update_duration();
        before - self.len()
    }

    /// A copy of every event, in order.
    pub fn all(&self) -> Vec<NoteEvent> {
        self.iter().cloned().collect()
    }

    /// A copy of the events with `start <= timestamp <= end`, in order.
    pub fn range(&self, start: f64, end: f64) -> Vec<NoteEvent> {
        self.iter()
            .filter(|e| start <= e.timestamp && e.timestamp <= end)
            .cloned()
            .collect()
    }

    /// Iterates over every event, played first.
    pub fn iter(&self) -> impl Iterator<Item = &NoteEvent> {
        self.played.iter().chain(self.pending.iter())
    }

    /// Turns the timeline around for backward playback.
    ///
    /// Every timestamp `t` becomes `duration - t`. Each `noteOff` is then mirrored again
    /// around the next `noteOn` of the same key that follows it, so notes still start before
    /// they stop and keep their length. The result is shifted to start at 0 and loaded, so
    /// every event is pending afterwards. Reversing twice restores the events as loaded.
    pub fn reverse(&mut self) {
        let duration = self.duration;
        let mut events: Vec<NoteEvent> = self
            .played
            .drain(..)
            .chain(self.pending.drain(..))
            .rev()
            .map(|mut e| {
                e.timestamp = duration - e.timestamp;
                e
            })
            .collect();

        for i in 0..events.len() {
            if !events[i].is_note_off() {
                continue;
            }
            let note = events[i].note;
            if let Some(on) = events[i + 1..]
                .iter()
                .find(|e| e.is_note_on() && e.note == note)
                .map(|e| e.timestamp)
            {
                events[i].timestamp = 2. * on - events[i].timestamp;
            }
        }

        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        if let Some(start) = events.first().map(|e| e.timestamp) {
            for event in &mut events {
                event.timestamp -= start;
            }
        }
        tracing::debug!(events = events.len(), duration, "reversed timeline");
        self.load(events, 0);
    }

    /// Timestamp of the last event, or 0 when empty
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The earliest pending event
    pub fn next_pending(&self) -> Option<&NoteEvent> {
        self.pending.front()
    }

    /// Moves the earliest pending event to the played run.
    pub fn advance(&mut self) -> Option<&NoteEvent> {
        let event = self.pending.pop_front()?;
        self.played.push(event);
        self.played.last()
    }

    /// Events before the cursor
    pub fn played(&self) -> &[NoteEvent] {
        &self.played
    }

    /// Events at or after the cursor
    pub fn pending(&self) -> &VecDeque<NoteEvent> {
        &self.pending
    }

    /// Total number of events
    pub fn len(&self) -> usize {
        self.played.len() + self.pending.len()
    }

    /// True when there are no events at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update_duration(&mut self) {
        self.duration = self
            .pending
            .back()
            .or(self.played.last())
            .map_or(0., |e| e.timestamp);
    }
}

#[cfg(test)]
fn song() -> Vec<NoteEvent> {
    vec![
        NoteEvent::note_on(0, 60, 0., 100).with_length(500.),
        NoteEvent::note_off(0, 60, 500.),
        NoteEvent::note_on(0, 62, 500., 90).with_length(250.),
        NoteEvent::note_off(0, 62, 750.),
    ]
}

#[cfg(test)]
fn timestamps(events: &[NoteEvent]) -> Vec<f64> {
    events.iter().map(|e| e.timestamp).collect()
}

#[cfg(test)]
fn assert_partitioned(timeline: &Timeline) {
    let all = timeline.all();
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    if let (Some(last), Some(first)) = (timeline.played().last(), timeline.next_pending()) {
        assert!(last.timestamp <= first.timestamp);
    }
}

#[test]
fn load_sorts_and_shifts() {
    let mut timeline = Timeline::new();
    let mut events = song();
    events.reverse();
    timeline.load(events, 12);
    assert_eq!(timestamps(&timeline.all()), vec![0., 500., 500., 750.]);
    assert_eq!(timeline.all()[0].note, 72);
    assert_eq!(timeline.duration(), 750.);
    assert!(timeline.played().is_empty());

    timeline.load(song(), i32::MAX);
    assert!(timeline.all().iter().all(|e| e.note == i32::MAX));
}

#[test]
fn seek_puts_events_at_the_target_in_pending() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);

    timeline.seek(500.);
    assert_eq!(timeline.played().len(), 1);
    assert_eq!(timeline.pending().len(), 3);

    timeline.seek(600.);
    assert_eq!(timeline.played().len(), 3);
    assert_partitioned(&timeline);

    timeline.seek(0.);
    assert_eq!(timeline.played().len(), 0);
    assert_eq!(timeline.pending().len(), 4);
}

#[test]
fn insert_keeps_order_and_partition() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);
    timeline.seek(600.);

    timeline.insert(NoteEvent::note_on(0, 70, 100., 1), 600.);
    timeline.insert(NoteEvent::note_on(0, 71, 700., 1), 600.);
    timeline.insert(NoteEvent::note_on(0, 72, 1000., 1), 600.);
    assert_partitioned(&timeline);
    assert_eq!(timeline.played().len(), 4);
    assert_eq!(timeline.pending().len(), 3);
    assert_eq!(timeline.duration(), 1000.);

    // At the cursor but after the next pending event: must stay pending
    timeline.seek(500.);
    timeline.insert(NoteEvent::note_on(0, 73, 550., 1), 600.);
    assert_partitioned(&timeline);
    assert_eq!(timeline.next_pending().map(|e| e.timestamp), Some(500.));
}

#[test]
fn equal_timestamps_insert_after_existing_ones() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);
    timeline.insert(NoteEvent::note_on(0, 80, 500., 1), 0.);
    let notes: Vec<_> = timeline.all().iter().map(|e| e.note).collect();
    assert_eq!(notes, vec![60, 60, 62, 80, 62]);
}

#[test]
fn remove_matching_uses_superset_semantics() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);
    timeline.seek(600.);
    assert_eq!(timeline.remove_matching(&Pattern::new().with("note", 60)), 2);
    assert_eq!(timeline.len(), 2);
    assert_partitioned(&timeline);
    assert_eq!(timeline.remove_matching(&Pattern::new()), 2);
    assert!(timeline.is_empty());
    assert_eq!(timeline.duration(), 0.);
}

#[test]
fn range_is_inclusive() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);
    assert_eq!(timestamps(&timeline.range(500., 750.)), vec![500., 500., 750.]);
    assert_eq!(timestamps(&timeline.range(501., 749.)), Vec::<f64>::new());
}

#[test]
fn snapshots_are_copies() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);
    let mut snapshot = timeline.all();
    snapshot[0].note = 1;
    snapshot.clear();
    assert_eq!(timeline.all(), song());
}

#[test]
fn reverse_keeps_notes_ordered() {
    let mut timeline = Timeline::new();
    timeline.load(song(), 0);
    timeline.reverse();
    let reversed = timeline.all();
    assert_eq!(reversed[0].timestamp, 0.);
    for (i, on) in reversed.iter().enumerate().filter(|(_, e)| e.is_note_on()) {
        let off = reversed[i + 1..]
            .iter()
            .find(|e| e.is_note_off() && e.note == on.note)
            .unwrap();
        assert_eq!(Some(off.timestamp - on.timestamp), on.length);
    }
}

#[test]
fn reversing_twice_restores_the_events() {
    use pretty_assertions::assert_eq;
    let chord = vec![
        NoteEvent::note_on(0, 60, 0., 100),
        NoteEvent::note_on(0, 64, 0., 100),
        NoteEvent::note_off(0, 60, 500.),
        NoteEvent::note_off(0, 64, 500.),
    ];
    for events in [song(), chord] {
        let mut timeline = Timeline::new();
        timeline.load(events.clone(), 0);
        timeline.reverse();
        timeline.reverse();
        assert_eq!(timeline.all(), events);
    }
}
