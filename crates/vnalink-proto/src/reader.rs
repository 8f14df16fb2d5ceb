use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::decoder::{Decoded, DecoderConfig, DecoderStats, StreamDecoder};
use crate::error::{ProtoError, Result};
use crate::record::Record;

const READ_CHUNK_SIZE: usize = 1024;

/// Reads records from any `Read` stream.
///
/// Partial reads are handled internally. Rejected frames are skipped by
/// [`read_record`](Self::read_record) and surfaced by
/// [`next_decoded`](Self::next_decoded).
pub struct RecordReader<T> {
    inner: T,
    decoder: StreamDecoder,
    pending: VecDeque<Decoded>,
}

impl<T: Read> RecordReader<T> {
    /// Create a new record reader with default decoder configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Create a new record reader with explicit decoder configuration.
    pub fn with_config(inner: T, config: DecoderConfig) -> Self {
        Self {
            inner,
            decoder: StreamDecoder::with_config(config),
            pending: VecDeque::new(),
        }
    }

    /// Read the next valid record (blocking), skipping rejected frames.
    ///
    /// Returns `Err(ProtoError::ConnectionClosed)` when EOF is reached.
    pub fn read_record(&mut self) -> Result<Record> {
        loop {
            if let Ok(record) = self.next_decoded()? {
                return Ok(record);
            }
        }
    }

    /// Read the next decoder outcome (blocking), including rejections.
    ///
    /// The outer `Result` carries I/O failures and end of stream; the inner
    /// one is the frame outcome.
    pub fn next_decoded(&mut self) -> Result<Decoded> {
        loop {
            if let Some(decoded) = self.pending.pop_front() {
                return Ok(decoded);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ProtoError::Io(err)),
            };

            if read == 0 {
                return Err(ProtoError::ConnectionClosed);
            }

            self.pending.extend(self.decoder.feed(&chunk[..read]));
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Counters of the underlying decoder.
    pub fn stats(&self) -> &DecoderStats {
        self.decoder.stats()
    }

    /// Drop buffered outcomes and any partial frame.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.decoder.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::encoder::{encode, encode_into, FRAME_END, FRAME_START};
    use crate::error::DecodeError;
    use crate::record::GeneratorSettings;

    #[test]
    fn read_single_record() {
        let mut reader = RecordReader::new(Cursor::new(encode(&Record::Ack).to_vec()));
        assert_eq!(reader.read_record().unwrap(), Record::Ack);
    }

    #[test]
    fn read_multiple_records() {
        let generator = Record::GeneratorSettings(GeneratorSettings {
            frequency: 915_000_000,
            level_cdbm: -500,
            active_port: 1,
        });
        let mut wire = BytesMut::new();
        encode_into(&Record::Ack, &mut wire);
        encode_into(&generator, &mut wire);
        encode_into(&Record::Nack, &mut wire);

        let mut reader = RecordReader::new(Cursor::new(wire.to_vec()));
        assert_eq!(reader.read_record().unwrap(), Record::Ack);
        assert_eq!(reader.read_record().unwrap(), generator);
        assert_eq!(reader.read_record().unwrap(), Record::Nack);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: encode(&Record::ClearFlash).to_vec(),
            pos: 0,
        };
        let mut reader = RecordReader::new(byte_reader);
        assert_eq!(reader.read_record().unwrap(), Record::ClearFlash);
    }

    #[test]
    fn rejected_frames_skipped_by_read_record() {
        let mut wire = vec![FRAME_START, 0x01, 0x02, FRAME_END];
        wire.extend_from_slice(&encode(&Record::Ack));

        let mut reader = RecordReader::new(Cursor::new(wire));
        assert_eq!(reader.read_record().unwrap(), Record::Ack);
        assert_eq!(reader.stats().malformed_frames, 1);
    }

    #[test]
    fn rejections_surfaced_by_next_decoded() {
        let mut wire = vec![FRAME_START, FRAME_END];
        wire.extend_from_slice(&encode(&Record::Ack));

        let mut reader = RecordReader::new(Cursor::new(wire));
        assert_eq!(
            reader.next_decoded().unwrap(),
            Err(DecodeError::TooShort { len: 0 })
        );
        assert_eq!(reader.next_decoded().unwrap(), Ok(Record::Ack));
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = RecordReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, ProtoError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let frame = encode(&Record::Ack);
        let mut reader = RecordReader::new(Cursor::new(frame[..4].to_vec()));
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, ProtoError::ConnectionClosed));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: encode(&Record::Nack).to_vec(),
            pos: 0,
        };
        let mut framed = RecordReader::new(reader);
        assert_eq!(framed.read_record().unwrap(), Record::Nack);
    }

    #[test]
    fn timeout_propagates_as_io_error() {
        let mut reader = RecordReader::new(TimedOutReader);
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, ProtoError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = RecordReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct TimedOutReader;

    impl Read for TimedOutReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }
}
