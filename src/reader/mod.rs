#![doc = r#"
Sequential access to the raw bytes of a MIDI file.

A [`Reader`] is a cursor over an immutable byte buffer. Every read advances the cursor.

Raw byte runs ([`Reader::read`]) are lenient: asking for more bytes than remain yields the
bytes that are left. Integer reads are strict and fail with
[`ReaderErrorKind::OutOfBounds`] when the buffer runs dry, so a truncated file is reported
instead of silently decoding garbage.
"#]

mod error;
pub use error::*;

/// A cursor over a byte buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub const fn from_byte_slice(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The offset of the next byte to be read.
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    /// Number of bytes between the cursor and the end of the buffer.
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// True once every byte has been consumed.
    pub const fn eof(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Returns the next `n` bytes and advances the cursor by `n`.
    ///
    /// Past the end of the buffer the returned slice is truncated (possibly empty).
    pub fn read(&mut self, n: usize) -> &'a [u8] {
        let start = self.position.min(self.data.len());
        let end = self.position.saturating_add(n).min(self.data.len());
        self.position = self.position.saturating_add(n);
        &self.data[start..end]
    }

    /// Reads exactly `N` bytes.
    fn read_exact_size<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let bytes = self.read(N);
        bytes
            .try_into()
            .map_err(|_| ReaderError::oob(self.data.len()))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> ReadResult<u32> {
        self.read_exact_size().map(u32::from_be_bytes)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> ReadResult<u16> {
        self.read_exact_size().map(u16::from_be_bytes)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        self.read_exact_size::<1>().map(|[b]| b)
    }

    /// Reads a single byte as two's complement, so `0xFF` is `-1`.
    pub fn read_i8(&mut self) -> ReadResult<i8> {
        self.read_exact_size::<1>().map(|[b]| b as i8)
    }

    /// Reads a MIDI variable-length quantity.
    ///
    /// Each byte contributes its low 7 bits, most significant group first. The quantity
    /// ends at the first byte whose top bit is clear.
    pub fn read_varlen(&mut self) -> ReadResult<u32> {
        let mut result: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            result = (result << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
    }

    /// Reads a variable-length quantity followed by that many bytes.
    pub fn read_varlen_slice(&mut self) -> ReadResult<&'a [u8]> {
        let len = self.read_varlen()?;
        Ok(self.read(len as usize))
    }
}

#[test]
fn reads_big_endian_integers() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x00, 0x01, 0xE0, 0x12, 0x34, 0xFF]);
    assert_eq!(reader.read_u32_be().unwrap(), 480);
    assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
    assert_eq!(reader.read_i8().unwrap(), -1);
    assert!(reader.eof());
}

#[test]
fn reads_variable_length_quantities() {
    let cases: [(&[u8], u32); 6] = [
        (&[0x00], 0),
        (&[0x7F], 0x7F),
        (&[0x81, 0x00], 0x80),
        (&[0x83, 0x60], 480),
        (&[0xFF, 0x7F], 0x3FFF),
        (&[0xFF, 0xFF, 0xFF, 0x7F], 0x0FFF_FFFF),
    ];
    for (bytes, expected) in cases {
        let mut reader = Reader::from_byte_slice(bytes);
        assert_eq!(reader.read_varlen().unwrap(), expected);
        assert!(reader.eof());
    }
}

#[test]
fn raw_reads_truncate_past_the_end() {
    let mut reader = Reader::from_byte_slice(&[1, 2, 3]);
    assert_eq!(reader.read(2), &[1, 2]);
    assert_eq!(reader.read(5), &[3]);
    assert_eq!(reader.read(1), &[] as &[u8]);
    assert!(reader.eof());
}

#[test]
fn integer_reads_past_the_end_fail() {
    let mut reader = Reader::from_byte_slice(&[0x81]);
    let err = reader.read_varlen().unwrap_err();
    assert!(err.is_out_of_bounds());

    let mut reader = Reader::from_byte_slice(&[0x00, 0x01]);
    assert!(reader.read_u32_be().unwrap_err().is_out_of_bounds());
}
