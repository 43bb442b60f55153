use super::Reader;
use crate::ParseError;
use thiserror::Error;

#[doc = r#"
A decode failure, tagged with the byte offset into the file where it was detected.

Errors raised while decoding a chunk payload are rebased onto the whole file before they
leave [`MidiFile::parse`](crate::file::MidiFile::parse), so `position` always counts from
the first byte of `MThd`.
"#]
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Reading at Position {position}, {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// Why decoding stopped
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReaderErrorKind {
    /// The bytes break the Standard MIDI File grammar
    #[error("Parsing {0}")]
    ParseError(#[from] ParseError),
    /// The file ended in the middle of a number, a chunk or a fixed size payload
    #[error("Read out of bounds!")]
    OutOfBounds,
}

impl ReaderError {
    /// An error of `kind` at byte `position`
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }

    /// The file was cut short at byte `position`
    pub const fn oob(position: usize) -> Self {
        Self::new(position, ReaderErrorKind::OutOfBounds)
    }

    /// Moves an error found inside a chunk payload to its place in the whole file.
    pub(crate) fn offset_by(self, base: usize) -> Self {
        Self::new(base + self.position, self.kind)
    }

    /// True for a truncated file
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }

    /// What went wrong
    pub fn kind(&self) -> &ReaderErrorKind {
        &self.kind
    }

    /// The grammar violation, `None` for a truncated file
    pub fn parse_error(&self) -> Option<&ParseError> {
        match &self.kind {
            ReaderErrorKind::ParseError(e) => Some(e),
            ReaderErrorKind::OutOfBounds => None,
        }
    }

    /// Byte offset from the start of the file
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Result of every decoding step
pub type ReadResult<T> = Result<T, ReaderError>;

/// Tags `error` with the reader's current offset.
pub(crate) fn inv_data(reader: &Reader<'_>, error: impl Into<ParseError>) -> ReaderError {
    ReaderError::new(reader.buffer_position(), ReaderErrorKind::ParseError(error.into()))
}

#[test]
fn chunk_errors_rebase_onto_the_file() {
    let err = ReaderError::oob(3).offset_by(22);
    assert_eq!(err.position(), 25);
    assert!(err.is_out_of_bounds());
    assert_eq!(err.to_string(), "Reading at Position 25, Read out of bounds!");
}
