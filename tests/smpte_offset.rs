use midi_replay::prelude::*;
use pretty_assertions::assert_eq;

/// A one track file starting with a SMPTE offset meta event, followed by a single note.
/// `division` is written to the header as is.
fn create_midi_with_smpte_offset(division: u16, offset: [u8; 5]) -> Vec<u8> {
    let mut bytes = Vec::new();

    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x00]); // format 0
    bytes.extend_from_slice(&[0x00, 0x01]); // one track
    bytes.extend_from_slice(&division.to_be_bytes());

    let mut track = vec![0x00, 0xFF, 0x54, 0x05];
    track.extend_from_slice(&offset);
    track.extend_from_slice(&[0x00, 0x90, 0x3C, 0x64]);
    track.extend_from_slice(&[0x60, 0x80, 0x3C, 0x40]);
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&track);
    bytes
}

fn first_offset(bytes: &[u8]) -> SmpteOffset {
    let file = MidiFile::parse(bytes).unwrap();
    match file.tracks()[0].events()[0].kind() {
        TrackEventKind::Meta(MetaEvent::SmpteOffset(offset)) => *offset,
        other => panic!("Expected SMPTE offset meta event, got {other:?}"),
    }
}

#[test]
fn test_smpte_offset_24fps() {
    // 12:30:15, frame 18, subframe 50
    let bytes = create_midi_with_smpte_offset(96, [0x0C, 30, 15, 18, 50]);
    let offset = first_offset(&bytes);
    assert_eq!(offset.fps, SmpteFps::TwentyFour);
    assert_eq!(
        (offset.hour, offset.minute, offset.second, offset.frame, offset.subframe),
        (12, 30, 15, 18, 50)
    );

    let expected_millis = (12 * 3600 + 30 * 60 + 15) as f64 * 1000. + 18.5 / 24. * 1000.;
    assert!((offset.as_millis() - expected_millis).abs() < 1e-6);
}

#[test]
fn test_smpte_offset_29_97_drop_frame() {
    let bytes = create_midi_with_smpte_offset(96, [(0b10 << 5) | 23, 59, 59, 28, 99]);
    let offset = first_offset(&bytes);
    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.hour, 23);
    assert_eq!(offset.fps.as_u8(), 29);
}

#[test]
fn test_smpte_offset_does_not_move_events() {
    let bytes = create_midi_with_smpte_offset(96, [0x20, 0, 1, 0, 0]);
    let notes = MidiFile::parse(&bytes).unwrap().into_note_events();
    assert_eq!(notes[0].timestamp, 0.);
    assert_eq!(notes[0].length, Some(500.));
}

#[test]
fn test_smpte_offset_wrong_length() {
    let mut bytes = create_midi_with_smpte_offset(96, [0; 5]);
    // declared length of the meta event
    bytes[25] = 0x04;
    let err = MidiFile::parse(&bytes).unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::MetaLength {
            kind: "smpteOffset",
            expected: 5,
            actual: 4,
        })
    );
    assert_eq!(
        err.to_string(),
        "Reading at Position 26, Parsing expected length for smpteOffset event is 5, got 4"
    );
}

#[test]
fn test_smpte_time_division_is_unsupported() {
    // -25 frames per second, 40 ticks per frame
    let bytes = create_midi_with_smpte_offset(0xE728, [0x20, 0, 0, 0, 0]);
    let err = MidiFile::parse(&bytes).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::SmpteTiming(0xE728)));
}
