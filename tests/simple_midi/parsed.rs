use midi_replay::prelude::*;
use pretty_assertions::assert_eq;

const SIMPLE: &[u8] = include_bytes!("./simple.mid");

#[test]
fn test_parse() {
    let parsed = MidiFile::parse(SIMPLE).unwrap();

    assert_eq!(parsed.header().format(), Some(FormatType::SingleMultiChannel));
    assert_eq!(parsed.header().ticks_per_beat(), 96);
    assert_eq!(parsed.tracks().len(), 1);

    let track = &parsed.tracks()[0];
    assert_eq!(track.len(), 12);

    let mut events = track.events().iter();
    assert_eq!(
        events.next().unwrap().kind(),
        &TrackEventKind::Meta(MetaEvent::TrackName("Piano".to_string()))
    );
    assert_eq!(
        events.next().unwrap().kind(),
        &TrackEventKind::Meta(MetaEvent::TimeSignature(TimeSignature {
            numerator: 4,
            denominator: 4,
            metronome: 24,
            thirty_seconds: 8,
        }))
    );
    assert_eq!(events.next().unwrap().tempo(), Some(Tempo::new(500_000)));

    note_on(events.next().unwrap(), 0, 2, 48, 112);
    // running status
    note_on(events.next().unwrap(), 0, 2, 60, 112);
    note_on(events.next().unwrap(), 96, 1, 67, 80);
    note_on(events.next().unwrap(), 96, 0, 76, 49);
    note_off(events.next().unwrap(), 192, 2, 48);
    note_off(events.next().unwrap(), 0, 2, 60);
    note_off(events.next().unwrap(), 0, 1, 67);
    // note on with no velocity
    note_off(events.next().unwrap(), 0, 0, 76);
    assert_eq!(events.next().unwrap().subtype(), "endOfTrack");
    assert!(events.next().is_none());
}

#[test]
fn test_note_events() {
    let notes = MidiFile::parse(SIMPLE).unwrap().into_note_events();
    let summary: Vec<_> = notes
        .iter()
        .map(|e| (e.kind, e.note, e.timestamp, e.length))
        .collect();

    use EventType::*;
    assert_eq!(
        summary,
        vec![
            (NoteOn, 48, 0., Some(2000.)),
            (NoteOn, 60, 0., Some(2000.)),
            (NoteOn, 67, 500., Some(1500.)),
            (NoteOn, 76, 1000., Some(1000.)),
            (NoteOff, 48, 2000., None),
            (NoteOff, 60, 2000., None),
            (NoteOff, 67, 2000., None),
            (NoteOff, 76, 2000., None),
        ]
    );
    assert_eq!(notes[2].channel, 1);
    assert_eq!(notes[2].velocity, Some(80));
}

fn note_on(e: &TrackEvent, delta_time: u32, channel: u8, note: u8, velocity: u8) {
    assert_eq!(e.delta_time(), delta_time);
    assert_eq!(
        e.kind(),
        &TrackEventKind::Channel {
            channel,
            message: ChannelMessage::NoteOn { note, velocity },
        }
    );
}

fn note_off(e: &TrackEvent, delta_time: u32, channel: u8, note: u8) {
    assert_eq!(e.delta_time(), delta_time);
    let TrackEventKind::Channel {
        channel: c,
        message: ChannelMessage::NoteOff { note: n, .. },
    } = e.kind()
    else {
        panic!("expected a note off, got {:?}", e.kind());
    };
    assert_eq!((*c, *n), (channel, note));
}
