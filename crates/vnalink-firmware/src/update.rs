use tracing::{debug, info, warn};
use vnalink_proto::{ProtoError, Record};

use crate::chunker::{chunk_count, chunks};
use crate::error::{Result, UpdateError};

/// Device answer to one mutating record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Nack,
    /// No answer within the link's timeout.
    Timeout,
}

/// A bidirectional record channel to the device.
///
/// How long `await_reply` waits before returning [`Reply::Timeout`] is up
/// to the implementation.
pub trait RecordLink {
    fn send(&mut self, record: &Record) -> std::result::Result<(), ProtoError>;

    fn await_reply(&mut self) -> std::result::Result<Reply, ProtoError>;
}

impl<L: RecordLink + ?Sized> RecordLink for &mut L {
    fn send(&mut self, record: &Record) -> std::result::Result<(), ProtoError> {
        (**self).send(record)
    }

    fn await_reply(&mut self) -> std::result::Result<Reply, ProtoError> {
        (**self).await_reply()
    }
}

/// Configuration for a firmware update.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Resends allowed per record after the first attempt.
    pub max_retries: u32,
    /// Flash address of the first image byte.
    pub base_address: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_address: 0,
        }
    }
}

/// Phase of an update, as reported to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Erasing,
    Writing,
    Applying,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProgress {
    pub stage: Stage,
    pub chunks_sent: usize,
    pub chunks_total: usize,
}

/// Summary of a completed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateReport {
    pub chunks: usize,
    /// Resends across all records.
    pub retries: u32,
}

/// Drives `ClearFlash`, every chunk and `PerformFirmwareUpdate` over a link,
/// waiting for an `Ack` after each record.
pub struct FirmwareUpdater<L> {
    link: L,
    config: UpdateConfig,
}

impl<L: RecordLink> FirmwareUpdater<L> {
    pub fn new(link: L) -> Self {
        Self::with_config(link, UpdateConfig::default())
    }

    pub fn with_config(link: L, config: UpdateConfig) -> Self {
        Self { link, config }
    }

    /// Transfer and apply `image`.
    pub fn run(&mut self, image: &[u8]) -> Result<UpdateReport> {
        self.run_with_progress(image, |_| {})
    }

    /// Transfer and apply `image`, calling `progress` after each phase
    /// change and each acknowledged chunk.
    pub fn run_with_progress<F>(&mut self, image: &[u8], mut progress: F) -> Result<UpdateReport>
    where
        F: FnMut(UpdateProgress),
    {
        if image.is_empty() {
            return Err(UpdateError::EmptyImage);
        }
        let packets = chunks(image, self.config.base_address)?;
        let total = chunk_count(image.len());
        let mut report = UpdateReport {
            chunks: total,
            retries: 0,
        };
        let mut notify = |stage: Stage, chunks_sent: usize| {
            progress(UpdateProgress {
                stage,
                chunks_sent,
                chunks_total: total,
            })
        };

        info!(
            bytes = image.len(),
            chunks = total,
            base = format_args!("{:#010x}", self.config.base_address),
            "starting firmware update"
        );

        notify(Stage::Erasing, 0);
        report.retries += self.transact(&Record::ClearFlash)?;

        notify(Stage::Writing, 0);
        for (index, packet) in packets.enumerate() {
            report.retries += self.transact(&Record::FirmwarePacket(packet))?;
            notify(Stage::Writing, index + 1);
        }

        notify(Stage::Applying, total);
        report.retries += self.transact(&Record::PerformFirmwareUpdate)?;

        notify(Stage::Done, total);
        info!(retries = report.retries, "firmware update complete");
        Ok(report)
    }

    /// Borrow the link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Consume the updater and return the link.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Send `record` until it is acknowledged; returns the number of resends.
    fn transact(&mut self, record: &Record) -> Result<u32> {
        let attempts = self.config.max_retries.saturating_add(1);
        for attempt in 1..=attempts {
            self.link.send(record)?;
            match self.link.await_reply()? {
                Reply::Ack => {
                    debug!(kind = %record.kind(), attempt, "acknowledged");
                    return Ok(attempt - 1);
                }
                reply => {
                    if attempt < attempts {
                        warn!(
                            kind = %record.kind(),
                            ?reply,
                            "record not acknowledged (attempt {attempt}/{attempts}), resending"
                        );
                    }
                }
            }
        }

        Err(UpdateError::RetriesExhausted {
            kind: record.kind(),
            address: match record {
                Record::FirmwarePacket(packet) => Some(packet.address),
                _ => None,
            },
            attempts,
        })
    }
}
