//! Serial record protocol for vector network analyzers.
//!
//! # Crate Structure
//!
//! - [`proto`]: records, frame encoder, stream decoder, blocking and async I/O adapters
//! - [`firmware`]: image chunking and acknowledged updates (behind `firmware` feature)

/// Re-export protocol types.
pub mod proto {
    pub use vnalink_proto::*;
}

/// Re-export firmware update types (requires `firmware` feature).
#[cfg(feature = "firmware")]
pub mod firmware {
    pub use vnalink_firmware::*;
}

pub use vnalink_proto::{encode, DecodeError, Decoded, Record, RecordKind, StreamDecoder};
