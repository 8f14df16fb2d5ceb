//! `tokio_util::codec` adapter around the stream decoder and frame encoder.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::decoder::{Decoded, DecoderConfig, StreamDecoder};
use crate::encoder::encode_into;
use crate::error::ProtoError;
use crate::record::Record;

/// Codec yielding one [`Decoded`] outcome per delimited frame.
///
/// Rejected frames are items, not stream errors, so a `FramedRead` keeps
/// running across line noise. Only I/O failures end the stream.
#[derive(Debug, Default)]
pub struct RecordCodec {
    decoder: StreamDecoder,
}

impl RecordCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            decoder: StreamDecoder::with_config(config),
        }
    }

    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }
}

impl Decoder for RecordCodec {
    type Item = Decoded;
    type Error = ProtoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut consumed = 0;
        let mut outcome = None;
        for &byte in src.iter() {
            consumed += 1;
            if let Some(decoded) = self.decoder.push_byte(byte) {
                outcome = Some(decoded);
                break;
            }
        }
        src.advance(consumed);
        Ok(outcome)
    }
}

impl Encoder<Record> for RecordCodec {
    type Error = ProtoError;

    fn encode(&mut self, record: Record, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(&record, dst);
        Ok(())
    }
}

impl Encoder<&Record> for RecordCodec {
    type Error = ProtoError;

    fn encode(&mut self, record: &Record, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(record, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::encoder::{encode, FRAME_END, FRAME_START};
    use crate::error::DecodeError;
    use crate::record::GeneratorSettings;

    #[test]
    fn decode_leaves_nothing_buffered() {
        let mut codec = RecordCodec::new();
        let frame = encode(&Record::Ack);
        let mut src = BytesMut::from(&frame[..3]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(src.is_empty());

        src.extend_from_slice(&frame[3..]);
        src.extend_from_slice(&encode(&Record::Nack));
        assert_eq!(codec.decode(&mut src).unwrap(), Some(Ok(Record::Ack)));
        assert_eq!(codec.decode(&mut src).unwrap(), Some(Ok(Record::Nack)));
        assert!(codec.decode(&mut src).unwrap().is_none());
    }

    #[tokio::test]
    async fn framed_read_yields_records_and_rejections() {
        let mut wire = vec![0x00, 0x11, FRAME_START, FRAME_END];
        wire.extend_from_slice(&encode(&Record::PerformFirmwareUpdate));

        let mut framed = FramedRead::new(wire.as_slice(), RecordCodec::new());
        assert_eq!(
            framed.next().await.unwrap().unwrap(),
            Err(DecodeError::TooShort { len: 0 })
        );
        assert_eq!(
            framed.next().await.unwrap().unwrap(),
            Ok(Record::PerformFirmwareUpdate)
        );
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_write_then_read() {
        let generator = Record::GeneratorSettings(GeneratorSettings {
            frequency: 2_400_000_000,
            level_cdbm: -1000,
            active_port: 2,
        });

        let mut sink = FramedWrite::new(Vec::new(), RecordCodec::new());
        sink.send(Record::RequestDeviceLimits).await.unwrap();
        sink.send(&generator).await.unwrap();
        let wire = sink.into_inner();

        let decoded: Vec<_> = FramedRead::new(wire.as_slice(), RecordCodec::new())
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(decoded, vec![Ok(Record::RequestDeviceLimits), Ok(generator)]);
    }
}
