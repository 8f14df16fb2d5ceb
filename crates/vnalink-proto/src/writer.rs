use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::encoder::{encode_into, MAX_FRAME_LEN};
use crate::error::{ProtoError, Result};
use crate::record::Record;

/// Writes encoded records to any `Write` stream.
pub struct RecordWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> RecordWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Encode and send one record, then flush (blocking).
    pub fn send(&mut self, record: &Record) -> Result<()> {
        self.buf.clear();
        encode_into(record, &mut self.buf);
        trace!(kind = %record.kind(), len = self.buf.len(), "sending record");

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(ProtoError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ProtoError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ProtoError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::decoder::StreamDecoder;
    use crate::reader::RecordReader;
    use crate::record::SweepSettings;

    #[test]
    fn written_bytes_decode() {
        let settings = Record::SweepSettings(SweepSettings {
            start: 50_000,
            stop: 8_500_000_000,
            points: 1001,
            if_bandwidth: 100,
            excitation_cdbm: -2000,
            excite_port1: true,
            excite_port2: true,
            suppress_peaks: false,
        });
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(&Record::Ack).unwrap();
        writer.send(&settings).unwrap();

        let wire = writer.into_inner().into_inner();
        let out = StreamDecoder::new().feed(&wire);
        assert_eq!(out, vec![Ok(Record::Ack), Ok(settings)]);
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = RecordWriter::new(sink);

        writer.send(&Record::Ack).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = RecordWriter::new(writer_impl);
        writer.send(&Record::ClearFlash).unwrap();

        let inner = writer.into_inner();
        assert_eq!(
            StreamDecoder::new().feed(&inner.data),
            vec![Ok(Record::ClearFlash)]
        );
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = RecordWriter::new(ZeroWriter);
        let err = writer.send(&Record::Ack).unwrap_err();
        assert!(matches!(err, ProtoError::ConnectionClosed));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = RecordWriter::new(left);
        let mut reader = RecordReader::new(right);

        writer.send(&Record::RequestDeviceLimits).unwrap();
        writer.send(&Record::Nack).unwrap();

        assert_eq!(reader.read_record().unwrap(), Record::RequestDeviceLimits);
        assert_eq!(reader.read_record().unwrap(), Record::Nack);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
