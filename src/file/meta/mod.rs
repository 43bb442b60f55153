#![doc = r#"
Meta events: information for sequencers that is not itself sent to a synthesizer.

Encoded in a track as `FF <subtype> <varlen length> <payload>`.
"#]

mod smpte_offset;
pub use smpte_offset::*;

mod tempo;
pub use tempo::*;

use crate::prelude::*;
use num_enum::TryFromPrimitive;

/// The meta subtypes this crate knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MetaType {
    /// `FF 00 02`
    SequenceNumber = 0x00,
    /// `FF 01 len`
    Text = 0x01,
    /// `FF 02 len`
    CopyrightNotice = 0x02,
    /// `FF 03 len`
    TrackName = 0x03,
    /// `FF 04 len`
    InstrumentName = 0x04,
    /// `FF 05 len`
    Lyrics = 0x05,
    /// `FF 06 len`
    Marker = 0x06,
    /// `FF 07 len`
    CuePoint = 0x07,
    /// `FF 20 01`
    MidiChannelPrefix = 0x20,
    /// `FF 2F 00`
    EndOfTrack = 0x2F,
    /// `FF 51 03`
    SetTempo = 0x51,
    /// `FF 54 05`
    SmpteOffset = 0x54,
    /// `FF 58 04`
    TimeSignature = 0x58,
    /// `FF 59 02`
    KeySignature = 0x59,
    /// `FF 7F len`
    SequencerSpecific = 0x7F,
}

impl MetaType {
    /// The payload length the file format mandates, for fixed size events
    pub const fn fixed_length(&self) -> Option<u32> {
        match self {
            Self::SequenceNumber => Some(2),
            Self::MidiChannelPrefix => Some(1),
            Self::EndOfTrack => Some(0),
            Self::SetTempo => Some(3),
            Self::SmpteOffset => Some(5),
            Self::TimeSignature => Some(4),
            Self::KeySignature => Some(2),
            _ => None,
        }
    }

    /// Lower camel case name of the subtype
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SequenceNumber => "sequenceNumber",
            Self::Text => "text",
            Self::CopyrightNotice => "copyrightNotice",
            Self::TrackName => "trackName",
            Self::InstrumentName => "instrumentName",
            Self::Lyrics => "lyrics",
            Self::Marker => "marker",
            Self::CuePoint => "cuePoint",
            Self::MidiChannelPrefix => "midiChannelPrefix",
            Self::EndOfTrack => "endOfTrack",
            Self::SetTempo => "setTempo",
            Self::SmpteOffset => "smpteOffset",
            Self::TimeSignature => "timeSignature",
            Self::KeySignature => "keySignature",
            Self::SequencerSpecific => "sequencerSpecific",
        }
    }
}

/// `FF 58 04 nn dd cc bb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// The beat unit, already raised from the stored power of two (`dd = 3` is 8)
    pub denominator: u16,
    /// MIDI clocks per metronome click
    pub metronome: u8,
    /// Notated 32nd notes per 24 MIDI clocks
    pub thirty_seconds: u8,
}

/// The two scales a key signature can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// `mi = 0`
    Major,
    /// `mi = 1`
    Minor,
}

/// `FF 59 02 sf mi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySignature {
    /// Number of sharps (positive) or flats (negative)
    pub key: i8,
    /// Major or minor
    pub scale: Scale,
}

/// A decoded meta event.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaEvent {
    /// Number identifying the sequence
    SequenceNumber(u16),
    /// Any text
    Text(String),
    /// Copyright notice
    CopyrightNotice(String),
    /// Sequence or track name
    TrackName(String),
    /// Instrument description
    InstrumentName(String),
    /// A lyric, usually one syllable
    Lyrics(String),
    /// Rehearsal letter or section name
    Marker(String),
    /// Description of something happening on stage
    CuePoint(String),
    /// Associates following sysex and meta events with a channel
    MidiChannelPrefix(u8),
    /// The mandatory last event of a track
    EndOfTrack,
    /// Changes the tempo for every track from this point on
    SetTempo(Tempo),
    /// Track start time in SMPTE time code
    SmpteOffset(SmpteOffset),
    /// Time signature
    TimeSignature(TimeSignature),
    /// Key signature
    KeySignature(KeySignature),
    /// Opaque data for a specific sequencer
    SequencerSpecific(Vec<u8>),
    /// A subtype this crate does not decode, with its raw payload
    Unknown {
        /// The subtype byte
        subtype: u8,
        /// The payload
        data: Vec<u8>,
    },
}

impl MetaEvent {
    /// Reads a meta event whose `FF` status byte has already been consumed.
    pub(crate) fn read(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let subtype = reader.read_u8()?;
        let length = reader.read_varlen()?;

        let Ok(kind) = MetaType::try_from(subtype) else {
            let data = read_payload(reader, length)?;
            tracing::trace!(subtype, length, "keeping unknown meta event");
            return Ok(MetaEvent::Unknown {
                subtype,
                data: data.to_vec(),
            });
        };

        if let Some(expected) = kind.fixed_length() {
            if expected != length {
                return Err(inv_data(
                    reader,
                    ParseError::MetaLength {
                        kind: kind.name(),
                        expected,
                        actual: length,
                    },
                ));
            }
        }
        let data = read_payload(reader, length)?;

        use MetaType as T;
        let event = match kind {
            T::SequenceNumber => MetaEvent::SequenceNumber(u16::from_be_bytes([data[0], data[1]])),
            T::Text => MetaEvent::Text(text(data)),
            T::CopyrightNotice => MetaEvent::CopyrightNotice(text(data)),
            T::TrackName => MetaEvent::TrackName(text(data)),
            T::InstrumentName => MetaEvent::InstrumentName(text(data)),
            T::Lyrics => MetaEvent::Lyrics(text(data)),
            T::Marker => MetaEvent::Marker(text(data)),
            T::CuePoint => MetaEvent::CuePoint(text(data)),
            T::MidiChannelPrefix => MetaEvent::MidiChannelPrefix(data[0]),
            T::EndOfTrack => MetaEvent::EndOfTrack,
            T::SetTempo => MetaEvent::SetTempo(Tempo::from_bytes([data[0], data[1], data[2]])),
            T::SmpteOffset => MetaEvent::SmpteOffset(SmpteOffset::from_bytes([
                data[0], data[1], data[2], data[3], data[4],
            ])),
            T::TimeSignature => MetaEvent::TimeSignature(TimeSignature {
                numerator: data[0],
                denominator: 1u16.checked_shl(data[1] as u32).unwrap_or(0),
                metronome: data[2],
                thirty_seconds: data[3],
            }),
            T::KeySignature => MetaEvent::KeySignature(KeySignature {
                key: data[0] as i8,
                scale: if data[1] == 0 {
                    Scale::Major
                } else {
                    Scale::Minor
                },
            }),
            T::SequencerSpecific => MetaEvent::SequencerSpecific(data.to_vec()),
        };
        Ok(event)
    }

    /// Lower camel case name of the event's subtype
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SequenceNumber(_) => MetaType::SequenceNumber.name(),
            Self::Text(_) => MetaType::Text.name(),
            Self::CopyrightNotice(_) => MetaType::CopyrightNotice.name(),
            Self::TrackName(_) => MetaType::TrackName.name(),
            Self::InstrumentName(_) => MetaType::InstrumentName.name(),
            Self::Lyrics(_) => MetaType::Lyrics.name(),
            Self::Marker(_) => MetaType::Marker.name(),
            Self::CuePoint(_) => MetaType::CuePoint.name(),
            Self::MidiChannelPrefix(_) => MetaType::MidiChannelPrefix.name(),
            Self::EndOfTrack => MetaType::EndOfTrack.name(),
            Self::SetTempo(_) => MetaType::SetTempo.name(),
            Self::SmpteOffset(_) => MetaType::SmpteOffset.name(),
            Self::TimeSignature(_) => MetaType::TimeSignature.name(),
            Self::KeySignature(_) => MetaType::KeySignature.name(),
            Self::SequencerSpecific(_) => MetaType::SequencerSpecific.name(),
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Reads a payload that must be complete, since its bytes are indexed.
fn read_payload<'a>(reader: &mut Reader<'a>, length: u32) -> ReadResult<&'a [u8]> {
    let data = reader.read(length as usize);
    if data.len() != length as usize {
        return Err(ReaderError::oob(reader.buffer_position()));
    }
    Ok(data)
}

fn text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

#[cfg(test)]
fn read_meta(bytes: &[u8]) -> ReadResult<MetaEvent> {
    MetaEvent::read(&mut Reader::from_byte_slice(bytes))
}

#[test]
fn decodes_fixed_size_meta_events() {
    use pretty_assertions::assert_eq;
    assert_eq!(
        read_meta(&[0x51, 0x03, 0x07, 0xA1, 0x20]).unwrap(),
        MetaEvent::SetTempo(Tempo::new(500_000))
    );
    assert_eq!(
        read_meta(&[0x58, 0x04, 0x06, 0x03, 0x24, 0x08]).unwrap(),
        MetaEvent::TimeSignature(TimeSignature {
            numerator: 6,
            denominator: 8,
            metronome: 36,
            thirty_seconds: 8,
        })
    );
    assert_eq!(
        read_meta(&[0x59, 0x02, 0xFD, 0x01]).unwrap(),
        MetaEvent::KeySignature(KeySignature {
            key: -3,
            scale: Scale::Minor,
        })
    );
    assert_eq!(read_meta(&[0x2F, 0x00]).unwrap(), MetaEvent::EndOfTrack);
}

#[test]
fn decodes_text_and_unknown_meta_events() {
    use pretty_assertions::assert_eq;
    assert_eq!(
        read_meta(&[0x03, 0x05, b'P', b'i', b'a', b'n', b'o']).unwrap(),
        MetaEvent::TrackName("Piano".to_string())
    );
    assert_eq!(
        read_meta(&[0x60, 0x02, 0x01, 0x02]).unwrap(),
        MetaEvent::Unknown {
            subtype: 0x60,
            data: vec![0x01, 0x02],
        }
    );
}

#[test]
fn wrong_fixed_length_is_a_format_error() {
    let err = read_meta(&[0x51, 0x02, 0x07, 0xA1]).unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::MetaLength {
            kind: "setTempo",
            expected: 3,
            actual: 2,
        })
    );
    assert!(err.to_string().contains("expected length for setTempo event is 3, got 2"));
}

#[test]
fn truncated_meta_payload_is_out_of_bounds() {
    let err = read_meta(&[0x51, 0x03, 0x07]).unwrap_err();
    assert!(err.is_out_of_bounds());
}
