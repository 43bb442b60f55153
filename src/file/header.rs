use crate::prelude::*;
use num_enum::TryFromPrimitive;

/// How the tracks of a file relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum FormatType {
    /// Format 0: a single multi-channel track
    SingleMultiChannel = 0,
    /// Format 1: several tracks played at the same time
    Simultaneous = 1,
    /// Format 2: independent single-track patterns
    SequentiallyIndependent = 2,
}

#[doc = r#"
   Contents of the `MThd` chunk.

   Only metrical time division (ticks per beat) is supported; a division with its top
   bit set describes SMPTE frames and is rejected with [`ParseError::SmpteTiming`].
   A division of 0 ticks per beat is rejected with [`ParseError::ZeroTicksPerBeat`].
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiFileHeader {
    format_type: u16,
    track_count: u16,
    ticks_per_beat: u16,
}

impl MidiFileHeader {
    /// Create a new header
    pub const fn new(format_type: u16, track_count: u16, ticks_per_beat: u16) -> Self {
        Self {
            format_type,
            track_count,
            ticks_per_beat,
        }
    }

    /// Decodes the 6 byte payload of the header chunk.
    pub(crate) fn read(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let format_type = reader.read_u16_be()?;
        let track_count = reader.read_u16_be()?;
        let time_division = reader.read_u16_be()?;
        if time_division & 0x8000 != 0 {
            return Err(inv_data(reader, ParseError::SmpteTiming(time_division)));
        }
        if time_division == 0 {
            return Err(inv_data(reader, ParseError::ZeroTicksPerBeat));
        }
        Ok(Self::new(format_type, track_count, time_division))
    }

    /// The raw format number stored in the file
    pub const fn format_type(&self) -> u16 {
        self.format_type
    }

    /// The format, if it is one of the three defined by the standard
    pub fn format(&self) -> Option<FormatType> {
        FormatType::try_from(self.format_type).ok()
    }

    /// Number of `MTrk` chunks declared by the header
    pub const fn track_count(&self) -> u16 {
        self.track_count
    }

    /// MIDI ticks in one beat (quarter note)
    pub const fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }
}

#[test]
fn rejects_smpte_division() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x01, 0x00, 0x02, 0xE7, 0x28]);
    let err = MidiFileHeader::read(&mut reader).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::SmpteTiming(0xE728)));
}

#[test]
fn rejects_zero_ticks_per_beat() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x00, 0x00, 0x01, 0x00, 0x00]);
    let err = MidiFileHeader::read(&mut reader).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::ZeroTicksPerBeat));
    assert_eq!(err.position(), 6);
}

#[test]
fn reads_metrical_header() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x01, 0x00, 0x02, 0x01, 0xE0]);
    let header = MidiFileHeader::read(&mut reader).unwrap();
    assert_eq!(header.format(), Some(FormatType::Simultaneous));
    assert_eq!(header.track_count(), 2);
    assert_eq!(header.ticks_per_beat(), 480);
}
