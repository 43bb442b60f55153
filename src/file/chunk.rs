#![doc = r#"
MIDI files are organized into chunks, each identified by a 4-character ASCII type identifier
followed by a 32-bit big-endian length field and then the chunk data.

```text
[Header Chunk: "MThd"]
[Track Chunk 1: "MTrk"]
...
[Track Chunk N: "MTrk"]
```
"#]

use crate::prelude::*;

/// Identifier of the header chunk
pub const HEADER_CHUNK_ID: &str = "MThd";
/// Identifier of a track chunk
pub const TRACK_CHUNK_ID: &str = "MTrk";

/// A chunk as it appears in the file, before its payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    id: [u8; 4],
    length: u32,
    offset: usize,
    data: &'a [u8],
}

impl<'a> RawChunk<'a> {
    /// Reads the id, length and payload of the next chunk.
    ///
    /// A payload shorter than the declared length is returned truncated.
    pub fn read(reader: &mut Reader<'a>) -> ReadResult<Self> {
        let id_bytes = reader.read(4);
        let id: [u8; 4] = id_bytes
            .try_into()
            .map_err(|_| ReaderError::oob(reader.buffer_position()))?;
        let length = reader.read_u32_be()?;
        let offset = reader.buffer_position();
        let data = reader.read(length as usize);
        Ok(Self {
            id,
            length,
            offset,
            data,
        })
    }

    /// Fails with [`ParseError::ChunkId`] unless this chunk carries the `expected` id.
    pub fn expect_id(&self, expected: &'static str) -> ReadResult<()> {
        if self.id == expected.as_bytes() {
            return Ok(());
        }
        Err(ReaderError::new(
            self.offset.saturating_sub(8),
            ParseError::ChunkId {
                expected,
                found: String::from_utf8_lossy(&self.id).into_owned(),
            }
            .into(),
        ))
    }

    /// The four byte identifier
    pub const fn id(&self) -> &[u8; 4] {
        &self.id
    }

    /// The length declared in the chunk header
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Offset of the first payload byte within the file
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The payload bytes
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[test]
fn reads_chunk_and_checks_id() {
    let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 2, 0xAA, 0xBB, 0xCC];
    let mut reader = Reader::from_byte_slice(&bytes);
    let chunk = RawChunk::read(&mut reader).unwrap();
    assert_eq!(chunk.length(), 2);
    assert_eq!(chunk.offset(), 8);
    assert_eq!(chunk.data(), &[0xAA, 0xBB]);
    assert!(chunk.expect_id(TRACK_CHUNK_ID).is_ok());

    let err = chunk.expect_id(HEADER_CHUNK_ID).unwrap_err();
    assert_eq!(err.position(), 0);
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::ChunkId {
            expected: "MThd",
            found: "MTrk".to_string(),
        })
    );
}
