use midi_replay::prelude::*;
use pretty_assertions::assert_eq;

fn smf(ticks_per_beat: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend(6u32.to_be_bytes());
    bytes.extend(1u16.to_be_bytes());
    bytes.extend((tracks.len() as u16).to_be_bytes());
    bytes.extend(ticks_per_beat.to_be_bytes());
    for track in tracks {
        bytes.extend(b"MTrk");
        bytes.extend((track.len() as u32).to_be_bytes());
        bytes.extend(track);
    }
    bytes
}

const END_OF_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];

#[test]
fn minimal_file_round_trip() {
    let mut track = vec![0x00, 0x90, 60, 80, 0x83, 0x60, 0x80, 60, 0];
    track.extend(END_OF_TRACK);
    let notes = MidiFile::parse(&smf(480, &[track])).unwrap().into_note_events();

    assert_eq!(
        notes,
        vec![
            NoteEvent::note_on(0, 60, 0., 80).with_length(500.),
            NoteEvent::note_off(0, 60, 500.).with_velocity(0),
        ]
    );
}

#[test]
fn tempo_change_mid_track() {
    let mut track = vec![
        0x00, 0x90, 60, 80, // beat 0
        0x83, 0x60, 0x80, 60, 0, // beat 1
        0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 60 BPM from here
        0x83, 0x60, 0x90, 62, 80, // beat 2
        0x83, 0x60, 0x80, 62, 0, // beat 3
    ];
    track.extend(END_OF_TRACK);
    let file = MidiFile::parse(&smf(480, &[track])).unwrap();
    let timestamps: Vec<_> = file.into_events().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![0., 500., 500., 1500., 2500., 2500.]);
}

#[test]
fn running_status_decodes_like_explicit_status() {
    let explicit = vec![0x00, 0x90, 60, 80, 0x10, 0x90, 64, 80, 0x10, 0x90, 60, 0, 0x10, 0x90, 64, 0];
    let running = vec![0x00, 0x90, 60, 80, 0x10, 64, 80, 0x10, 60, 0, 0x10, 64, 0];
    let explicit = MidiFile::parse(&smf(96, &[explicit])).unwrap();
    let running = MidiFile::parse(&smf(96, &[running])).unwrap();
    assert_eq!(explicit, running);
    assert_eq!(explicit.into_note_events(), running.into_note_events());
}

#[test]
fn running_status_does_not_cross_tracks() {
    let first = vec![0x00, 0x90, 60, 80];
    let second = vec![0x00, 62, 80];
    let err = MidiFile::parse(&smf(96, &[first, second])).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::RunningStatus));
}

#[test]
fn merged_stream_is_chronological() {
    let tracks = vec![
        vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x81, 0x00, 0xFF, 0x51, 0x03, 0x03, 0xD0, 0x90],
        vec![0x30, 0x91, 40, 90, 0x60, 0x81, 40, 0, 0x05, 0x91, 41, 90, 0x7F, 0x81, 41, 0],
        vec![0x00, 0x92, 50, 90, 0x82, 0x00, 0x82, 50, 0],
    ];
    let events: Vec<_> = MidiFile::parse(&smf(96, &tracks)).unwrap().into_events().collect();
    assert_eq!(events.len(), 9);
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    let notes = format_events(events);
    assert!(notes.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(notes.iter().filter(|e| e.is_note_on()).count(), 3);
}

#[test]
fn note_shift_applies_while_formatting() {
    let track = vec![0x00, 0x90, 60, 80, 0x60, 0x80, 60, 0];
    let file = MidiFile::parse(&smf(96, &[track])).unwrap();
    let notes = format_events_shifted(file.into_events(), 5);
    assert_eq!(notes[0].note, 65);
    assert_eq!(notes[1].note, 65);
}

#[test]
fn non_note_channel_events_are_dropped() {
    let track = vec![
        0x00, 0xC0, 5, // program change
        0x00, 0xB0, 7, 100, // controller
        0x00, 0xE0, 0x00, 0x40, // pitch bend
        0x00, 0xD0, 30, // channel aftertouch
        0x00, 0xA0, 60, 30, // note aftertouch
        0x00, 0xF0, 0x01, 0xF7, // sysex
    ];
    let file = MidiFile::parse(&smf(96, &[track])).unwrap();
    let subtypes: Vec<_> = file.tracks()[0].events().iter().map(TrackEvent::subtype).collect();
    assert_eq!(
        subtypes,
        vec![
            "programChange",
            "controller",
            "pitchBend",
            "channelAftertouch",
            "noteAftertouch",
            "sysEx"
        ]
    );
    assert_eq!(file.into_note_events(), vec![]);
}

#[test]
fn format_errors() {
    let bad_header_id = {
        let mut bytes = smf(96, &[]);
        bytes[..4].copy_from_slice(b"RIFF");
        bytes
    };
    assert!(matches!(
        MidiFile::parse(&bad_header_id).unwrap_err().parse_error(),
        Some(ParseError::ChunkId { expected: "MThd", found }) if found == "RIFF"
    ));

    let bad_status = smf(96, &[vec![0x00, 0xF4]]);
    assert_eq!(
        MidiFile::parse(&bad_status).unwrap_err().parse_error(),
        Some(&ParseError::Status(0xF4))
    );

    let bad_tempo = smf(96, &[vec![0x00, 0xFF, 0x51, 0x02, 0x07, 0xA1]]);
    assert!(matches!(
        MidiFile::parse(&bad_tempo).unwrap_err().parse_error(),
        Some(ParseError::MetaLength {
            kind: "setTempo",
            expected: 3,
            actual: 2
        })
    ));
}

#[test]
fn truncated_files_fail() {
    let mut track = vec![0x00, 0x90, 60, 80, 0x83, 0x60, 0x80, 60, 0];
    track.extend(END_OF_TRACK);
    let bytes = smf(480, &[track]);
    for len in [0, 3, 10, 14, 20] {
        assert!(
            MidiFile::parse(&bytes[..len]).unwrap_err().is_out_of_bounds(),
            "{len} bytes"
        );
    }
    // cut inside the last event
    let err = MidiFile::parse(&bytes[..bytes.len() - 1]);
    assert!(err.is_err());
}

#[test]
fn zero_ticks_per_beat_is_rejected() {
    let mut track = vec![0x00, 0x90, 60, 80, 0x60, 0x80, 60, 0];
    track.extend(END_OF_TRACK);
    let err = MidiFile::parse(&smf(0, &[track])).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::ZeroTicksPerBeat));
    assert_eq!(err.position(), 14);
}
