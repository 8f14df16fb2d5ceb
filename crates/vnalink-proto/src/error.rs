use crate::kind::RecordKind;

/// Errors that can occur while moving records over a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// A record could not be encoded into the supplied buffer.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before another record was received.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Failure of the frame encoder. Encoding itself is total; the only
/// failure is an output slice that cannot hold the worst-case frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("insufficient space for frame ({needed} bytes needed, {available} available)")]
    InsufficientSpace { needed: usize, available: usize },
}

/// A frame that was delimited on the wire but could not be turned into a
/// record. None of these are fatal: the decoder drops the frame and keeps
/// scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The trailing CRC does not match the kind and payload bytes.
    #[error("checksum mismatch (expected {expected:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Checksum was valid but the kind byte is not a known record kind.
    #[error("unknown record kind {0}")]
    UnknownKind(u8),

    /// Checksum was valid but the frame contained an escape followed by a
    /// value that is not an escaped reserved byte (the end marker when the
    /// escape dangled at the close).
    #[error("malformed escape sequence (escaped byte {0:#04x})")]
    MalformedEscape(u8),

    /// A new start marker arrived before the current frame was closed.
    #[error("frame truncated by a new start marker")]
    Truncated,

    /// The frame body cannot even hold a kind byte and a checksum.
    #[error("frame too short ({len} bytes)")]
    TooShort { len: usize },

    /// The frame body grew past the configured maximum without an end marker.
    #[error("frame exceeds {max} bytes")]
    Oversized { max: usize },

    /// The payload length does not match the fixed layout of its kind.
    #[error("{kind} payload is {actual} bytes, expected {expected}")]
    LengthMismatch {
        kind: RecordKind,
        expected: usize,
        actual: usize,
    },

    /// A selector field holds a value outside its defined range.
    #[error("{kind} field `{field}` has invalid value {value}")]
    InvalidField {
        kind: RecordKind,
        field: &'static str,
        value: u8,
    },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
