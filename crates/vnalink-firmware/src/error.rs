use vnalink_proto::{ProtoError, RecordKind};

/// Errors raised while splitting an image into chunks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// The padded image would run past the end of the 32-bit address space.
    #[error("image of {len} bytes at {base:#010x} does not fit the 32-bit address space")]
    AddressOverflow { base: u32, len: usize },
}

/// Errors that abort a firmware update.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// There is nothing to transfer.
    #[error("firmware image is empty")]
    EmptyImage,

    /// The image cannot be addressed.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// The device kept rejecting (or never answered) one record.
    #[error("{kind} not acknowledged after {attempts} attempts")]
    RetriesExhausted {
        kind: RecordKind,
        address: Option<u32>,
        attempts: u32,
    },

    /// The link itself failed.
    #[error("link error: {0}")]
    Link(#[from] ProtoError),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
