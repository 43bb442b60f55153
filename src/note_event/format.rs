use crate::prelude::*;

/// Reduces a merged event stream to its note events.
///
/// See [`format_events_shifted`].
pub fn format_events(events: impl IntoIterator<Item = TimedEvent>) -> Vec<NoteEvent> {
    format_events_shifted(events, 0)
}

/// Reduces a merged event stream to its note events, adding `note_shift` to every key.
///
/// Only `noteOn` and `noteOff` channel events are kept, in stream order. Each `noteOn` gets
/// a `length`: the time to the next `noteOff` with the same key found scanning forward. A
/// `noteOn` without such a `noteOff` keeps no length.
///
/// The pairing does not track overlapping notes: a key struck again before its release has
/// its first `noteOn` paired with the first `noteOff` that follows, whichever strike it ends.
pub fn format_events_shifted(
    events: impl IntoIterator<Item = TimedEvent>,
    note_shift: i32,
) -> Vec<NoteEvent> {
    let mut notes: Vec<NoteEvent> = events
        .into_iter()
        .filter_map(|timed| {
            let TrackEventKind::Channel { channel, message } = timed.event.into_kind() else {
                return None;
            };
            let (kind, note, velocity) = match message {
                ChannelMessage::NoteOn { note, velocity } => (EventType::NoteOn, note, velocity),
                ChannelMessage::NoteOff { note, velocity } => (EventType::NoteOff, note, velocity),
                _ => return None,
            };
            let note = i32::from(note).saturating_add(note_shift);
            Some(
                NoteEvent::new(kind, channel, note, timed.timestamp)
                    .with_track(timed.track)
                    .with_velocity(velocity),
            )
        })
        .collect();

    for i in 0..notes.len() {
        if !notes[i].is_note_on() {
            continue;
        }
        let (note, start) = (notes[i].note, notes[i].timestamp);
        if let Some(off) = notes[i + 1..]
            .iter()
            .find(|e| e.is_note_off() && e.note == note)
        {
            notes[i].length = Some(off.timestamp - start);
        }
    }
    notes
}

#[cfg(test)]
fn timed(timestamp: f64, message: ChannelMessage) -> TimedEvent {
    TimedEvent {
        timestamp,
        track: 0,
        ticks_to_event: 0,
        event: TrackEvent::new(0, TrackEventKind::Channel { channel: 0, message }),
    }
}

#[test]
fn keeps_only_notes_and_pairs_lengths() {
    use pretty_assertions::assert_eq;
    let events = vec![
        timed(0., ChannelMessage::ProgramChange { program: 4 }),
        timed(0., ChannelMessage::NoteOn { note: 60, velocity: 80 }),
        timed(100., ChannelMessage::NoteOn { note: 64, velocity: 70 }),
        timed(500., ChannelMessage::NoteOff { note: 60, velocity: 0 }),
        timed(600., ChannelMessage::Controller { controller: 7, value: 100 }),
        timed(900., ChannelMessage::NoteOff { note: 64, velocity: 0 }),
    ];
    assert_eq!(
        format_events(events),
        vec![
            NoteEvent::note_on(0, 60, 0., 80).with_length(500.),
            NoteEvent::note_on(0, 64, 100., 70).with_length(800.),
            NoteEvent::note_off(0, 60, 500.).with_velocity(0),
            NoteEvent::note_off(0, 64, 900.).with_velocity(0),
        ]
    );
}

#[test]
fn unreleased_notes_have_no_length() {
    let notes = format_events([timed(0., ChannelMessage::NoteOn { note: 60, velocity: 1 })]);
    assert_eq!(notes[0].length, None);
}

#[test]
fn overlapping_strikes_pair_with_the_first_release() {
    let notes = format_events([
        timed(0., ChannelMessage::NoteOn { note: 60, velocity: 80 }),
        timed(100., ChannelMessage::NoteOn { note: 60, velocity: 80 }),
        timed(200., ChannelMessage::NoteOff { note: 60, velocity: 0 }),
        timed(400., ChannelMessage::NoteOff { note: 60, velocity: 0 }),
    ]);
    assert_eq!(notes[0].length, Some(200.));
    assert_eq!(notes[1].length, Some(100.));
}

#[test]
fn shift_moves_every_key() {
    let notes = format_events_shifted(
        [
            timed(0., ChannelMessage::NoteOn { note: 60, velocity: 80 }),
            timed(10., ChannelMessage::NoteOff { note: 60, velocity: 0 }),
        ],
        -12,
    );
    assert_eq!(notes[0].note, 48);
    assert_eq!(notes[1].note, 48);
    assert_eq!(notes[0].length, Some(10.));

    let extreme = format_events_shifted(
        [timed(0., ChannelMessage::NoteOn { note: 60, velocity: 80 })],
        i32::MAX,
    );
    assert_eq!(extreme[0].note, i32::MAX);
}
