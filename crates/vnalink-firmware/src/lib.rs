//! Firmware image chunking and acknowledged transfer.
//!
//! An update is always `ClearFlash`, then the image as 256-byte
//! [`FirmwarePacket`](vnalink_proto::FirmwarePacket)s in ascending address
//! order, then `PerformFirmwareUpdate`. Each record must be acknowledged
//! before the next one is sent.

pub mod chunker;
pub mod error;
pub mod link;
pub mod update;

pub use chunker::{chunk_count, chunk_image, chunks, update_sequence, Chunks};
pub use error::{ChunkError, Result, UpdateError};
pub use link::StreamLink;
pub use update::{
    FirmwareUpdater, RecordLink, Reply, Stage, UpdateConfig, UpdateProgress, UpdateReport,
};
