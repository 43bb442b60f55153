#![doc = r#"
Rusty representation of a Standard MIDI File

A file is a header chunk followed by `trackCount` track chunks:

```text
"MThd" <len = 6> <format u16> <trackCount u16> <ticksPerBeat u16>
"MTrk" <len> <event>*
...
```

Every event starts with a variable-length delta time, followed by a status byte:
`FF` (meta), `F0` / `F7` (system exclusive), or `8n`-`En` (channel events, which may
omit the status byte under running status).
"#]

mod channel;
pub use channel::*;

mod chunk;
pub use chunk::*;

mod event;
pub use event::*;

mod header;
pub use header::*;

mod meta;
pub use meta::*;

mod track;
pub use track::*;

mod timed_event_iter;
pub use timed_event_iter::*;

use crate::prelude::*;

#[doc = r#"
A decoded Standard MIDI File: its header and the raw events of each track.
"#]
#[derive(Clone, Debug, PartialEq)]
pub struct MidiFile {
    header: MidiFileHeader,
    tracks: Vec<Track>,
}

impl MidiFile {
    /// Create a file from an already decoded header and tracks
    pub fn new(header: MidiFileHeader, tracks: Vec<Track>) -> Self {
        Self { header, tracks }
    }

    /// Parse a set of bytes into a file struct.
    ///
    /// Exactly `trackCount` chunks are read after the header, each of which must be a
    /// track chunk. Any bytes after the last track are ignored.
    pub fn parse(bytes: &[u8]) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(bytes);

        let chunk = RawChunk::read(&mut reader)?;
        chunk.expect_id(HEADER_CHUNK_ID)?;
        if chunk.length() != 6 {
            return Err(ReaderError::new(
                chunk.offset().saturating_sub(4),
                ParseError::HeaderLength(chunk.length()).into(),
            ));
        }
        let header = MidiFileHeader::read(&mut Reader::from_byte_slice(chunk.data()))
            .map_err(|e| e.offset_by(chunk.offset()))?;
        tracing::debug!(
            format = header.format_type(),
            tracks = header.track_count(),
            ticks_per_beat = header.ticks_per_beat(),
            "decoded midi header"
        );

        let mut tracks = Vec::with_capacity(header.track_count() as usize);
        for _ in 0..header.track_count() {
            let chunk = RawChunk::read(&mut reader)?;
            chunk.expect_id(TRACK_CHUNK_ID)?;
            tracks.push(Track::read(&chunk)?);
        }

        if !reader.eof() {
            tracing::warn!(
                trailing = reader.remaining(),
                "ignoring bytes after the last track"
            );
        }

        Ok(Self { header, tracks })
    }

    /// Returns header info
    pub fn header(&self) -> &MidiFileHeader {
        &self.header
    }

    /// Returns the tracks in file order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Consumes the file, returning its tracks
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }

    /// Returns every event of every track, merged in time order and timestamped in
    /// milliseconds.
    pub fn into_events(self) -> TimedEventIterator {
        TimedEventIterator::new(self)
    }

    /// Returns the note on / note off events of the file, with note lengths.
    pub fn into_note_events(self) -> Vec<NoteEvent> {
        format_events(self.into_events())
    }
}

#[cfg(test)]
fn smf(ticks_per_beat: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend(6u32.to_be_bytes());
    bytes.extend(1u16.to_be_bytes());
    bytes.extend((tracks.len() as u16).to_be_bytes());
    bytes.extend(ticks_per_beat.to_be_bytes());
    for track in tracks {
        bytes.extend(b"MTrk");
        bytes.extend((track.len() as u32).to_be_bytes());
        bytes.extend(*track);
    }
    bytes
}

#[test]
fn parses_header_and_tracks() {
    let bytes = smf(
        96,
        &[
            &[0x00, 0xFF, 0x2F, 0x00],
            &[0x00, 0x90, 0x3C, 0x40, 0x60, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00],
        ],
    );
    let file = MidiFile::parse(&bytes).unwrap();
    assert_eq!(file.header().ticks_per_beat(), 96);
    assert_eq!(file.tracks().len(), 2);
    assert_eq!(file.tracks()[1].len(), 3);
    assert_eq!(
        file.tracks()[1].events()[1].kind(),
        &TrackEventKind::Channel {
            channel: 0,
            message: ChannelMessage::NoteOff {
                note: 0x3C,
                velocity: 0
            }
        }
    );
}

#[test]
fn rejects_wrong_header_id() {
    let mut bytes = smf(96, &[]);
    bytes[0] = b'X';
    let err = MidiFile::parse(&bytes).unwrap_err();
    assert!(matches!(
        err.parse_error(),
        Some(ParseError::ChunkId { expected: "MThd", .. })
    ));
}

#[test]
fn rejects_wrong_header_length() {
    let mut bytes = smf(96, &[]);
    bytes[7] = 8;
    bytes.extend([0, 0]);
    let err = MidiFile::parse(&bytes).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::HeaderLength(8)));
}

#[test]
fn rejects_foreign_chunk_in_place_of_track() {
    let mut bytes = smf(96, &[&[0x00, 0xFF, 0x2F, 0x00]]);
    bytes[14..18].copy_from_slice(b"XFIH");
    let err = MidiFile::parse(&bytes).unwrap_err();
    assert_eq!(err.position(), 14);
    assert!(matches!(
        err.parse_error(),
        Some(ParseError::ChunkId { expected: "MTrk", .. })
    ));
}

#[test]
fn missing_track_is_out_of_bounds() {
    let mut bytes = smf(96, &[&[0x00, 0xFF, 0x2F, 0x00]]);
    bytes[11] = 2;
    assert!(MidiFile::parse(&bytes).unwrap_err().is_out_of_bounds());
}

#[test]
fn track_errors_report_file_offsets() {
    let bytes = smf(96, &[&[0x00, 0xF3, 0x00]]);
    let err = MidiFile::parse(&bytes).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::Status(0xF3)));
    assert_eq!(err.position(), 22 + 2);
}
