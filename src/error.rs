#![doc = r#"
Errors produced while decoding files and while driving playback.

Decode failures are [`ParseError`]s wrapped in a [`ReaderError`] that remembers the byte
offset. Misuse of the playback API (bad speed, malformed events) is a [`ValidationError`],
raised at the call site without touching any state.
"#]

use crate::reader::ReaderError;
use thiserror::Error;

/// The bytes given to the decoder are not a Standard MIDI File this crate can read.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A chunk started with an unexpected four byte identifier
    #[error("expected chunk {expected:?}, found {found:?}")]
    ChunkId {
        /// `MThd` or `MTrk`
        expected: &'static str,
        /// The identifier that was actually read, lossily decoded
        found: String,
    },
    /// The header chunk must always be 6 bytes long
    #[error("header chunk length must be 6, was {0}")]
    HeaderLength(u32),
    /// SMPTE frame based time division is not supported
    #[error("SMPTE time division is not supported (division {0:#06x})")]
    SmpteTiming(u16),
    /// A beat must span at least one tick
    #[error("time division must be at least 1 tick per beat")]
    ZeroTicksPerBeat,
    /// A fixed size meta event declared a different length
    #[error("expected length for {kind} event is {expected}, got {actual}")]
    MetaLength {
        /// Name of the meta event
        kind: &'static str,
        /// Length required by the file format
        expected: u32,
        /// Length declared in the file
        actual: u32,
    },
    /// The status byte does not start any event allowed in a track, channel events
    /// included
    #[error("unrecognised MIDI event type byte: {0:#04x}")]
    Status(u8),
    /// A data byte arrived where a status byte was needed and no running status was active
    #[error("data byte found with no running status active")]
    RunningStatus,
}

/// A caller handed the player something it cannot use.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field of an event record is absent
    #[error("event is missing required field `{0}`")]
    MissingField(&'static str),
    /// A field of an event record holds a value of the wrong type
    #[error("event field `{field}` must be {expected}")]
    FieldType {
        /// The offending field
        field: &'static str,
        /// Human readable description of the accepted values
        expected: &'static str,
    },
    /// Event timestamps must be finite
    #[error("event timestamp must be a finite number, got {0}")]
    Timestamp(f64),
    /// Speed multipliers must be positive
    #[error("speed must be a positive number, got {0}")]
    Speed(f64),
    /// Play time can only be moved to a finite number of milliseconds
    #[error("seek target must be a finite number, got {0}")]
    Seek(f64),
}

/// Any error the crate can return.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be decoded
    #[error(transparent)]
    Read(#[from] ReaderError),
    /// The base64 text could not be decoded into bytes
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A call was made with invalid arguments
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Crate wide result type.
pub type Result<T, E = Error> = core::result::Result<T, E>;
