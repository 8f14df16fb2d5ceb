use std::io::{ErrorKind, Read, Write};

use tracing::debug;
use vnalink_proto::{ProtoError, Record, RecordReader, RecordWriter};

use crate::update::{RecordLink, Reply};

/// [`RecordLink`] over a blocking reader/writer pair, e.g. the two halves of
/// a serial port.
///
/// The read side's own timeout decides when a reply counts as missing: a
/// `TimedOut` or `WouldBlock` read becomes [`Reply::Timeout`]. Records other
/// than `Ack`/`Nack` that arrive while waiting are skipped.
///
/// Replies carry no sequence number. After a timeout the next `send` first
/// discards everything the reader has buffered, including a half-received
/// reply, so a late `Ack` already in hand cannot answer the resend. An `Ack`
/// still in flight (not yet read from the device) when the resend goes out
/// is indistinguishable from the real answer; read timeouts should be set
/// well above the device's worst-case reply latency.
pub struct StreamLink<R, W> {
    reader: RecordReader<R>,
    writer: RecordWriter<W>,
    timed_out: bool,
}

impl<R: Read, W: Write> StreamLink<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::from_parts(RecordReader::new(reader), RecordWriter::new(writer))
    }

    pub fn from_parts(reader: RecordReader<R>, writer: RecordWriter<W>) -> Self {
        Self {
            reader,
            writer,
            timed_out: false,
        }
    }

    pub fn into_parts(self) -> (RecordReader<R>, RecordWriter<W>) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W: Write> RecordLink for StreamLink<R, W> {
    fn send(&mut self, record: &Record) -> Result<(), ProtoError> {
        if std::mem::take(&mut self.timed_out) {
            debug!("discarding stale input before resend");
            self.reader.reset();
        }
        self.writer.send(record)
    }

    fn await_reply(&mut self) -> Result<Reply, ProtoError> {
        loop {
            match self.reader.read_record() {
                Ok(Record::Ack) => return Ok(Reply::Ack),
                Ok(Record::Nack) => return Ok(Reply::Nack),
                Ok(other) => debug!(kind = %other.kind(), "ignoring record while awaiting reply"),
                Err(ProtoError::Io(err))
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    self.timed_out = true;
                    return Ok(Reply::Timeout);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
