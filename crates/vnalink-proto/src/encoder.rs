use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum;
use crate::error::EncodeError;
use crate::kind::RecordKind;
use crate::layout::{write_payload, MAX_PAYLOAD_LEN};
use crate::record::Record;

/// Marks the first byte of a frame.
pub const FRAME_START: u8 = 0x5A;

/// Marks the last byte of a frame.
pub const FRAME_END: u8 = 0xA5;

/// Introduces an escaped reserved byte.
pub const FRAME_ESCAPE: u8 = 0x7D;

/// An escaped byte is sent as `FRAME_ESCAPE, byte ^ ESCAPE_XOR`.
pub const ESCAPE_XOR: u8 = 0x20;

/// Length of the trailing checksum.
pub const CHECKSUM_LEN: usize = 4;

/// Worst-case frame size over all record kinds.
pub const MAX_FRAME_LEN: usize = escaped_bound(MAX_PAYLOAD_LEN);

/// Unescaped body size (kind + payload + checksum) of the largest kind.
pub const MAX_BODY_LEN: usize = 1 + MAX_PAYLOAD_LEN + CHECKSUM_LEN;

const fn escaped_bound(payload_len: usize) -> usize {
    2 + 2 * (1 + payload_len + CHECKSUM_LEN)
}

/// True for the bytes that may only appear literally at frame boundaries.
pub const fn is_reserved(byte: u8) -> bool {
    matches!(byte, FRAME_START | FRAME_END | FRAME_ESCAPE)
}

/// Worst-case encoded size of a record of `kind`, assuming every body byte
/// needs escaping.
pub const fn max_encoded_len(kind: RecordKind) -> usize {
    escaped_bound(kind.payload_len())
}

/// Encode a record into a freshly allocated frame.
///
/// Wire format:
/// ```text
/// ┌───────┬──────────────────────────────────────────────┬───────┐
/// │ START │ escaped( kind (1B) │ payload │ CRC-32 (4B LE) ) │  END  │
/// │ 0x5A  │                                              │ 0xA5  │
/// └───────┴──────────────────────────────────────────────┴───────┘
/// ```
pub fn encode(record: &Record) -> Bytes {
    let mut dst = BytesMut::with_capacity(max_encoded_len(record.kind()));
    encode_into(record, &mut dst);
    dst.freeze()
}

/// Append the frame for `record` to `dst`.
pub fn encode_into(record: &Record, dst: &mut BytesMut) {
    dst.reserve(max_encoded_len(record.kind()));
    write_frame(record, dst);
}

/// Encode into a caller-owned slice and return the number of bytes written.
///
/// The slice must be able to hold [`max_encoded_len`] for the record's
/// kind; otherwise nothing is written and `InsufficientSpace` is returned.
pub fn encode_to_slice(record: &Record, out: &mut [u8]) -> Result<usize, EncodeError> {
    let needed = max_encoded_len(record.kind());
    if out.len() < needed {
        return Err(EncodeError::InsufficientSpace {
            needed,
            available: out.len(),
        });
    }
    let available = out.len();
    let mut cursor = &mut out[..];
    write_frame(record, &mut cursor);
    Ok(available - cursor.len())
}

fn write_frame(record: &Record, dst: &mut impl BufMut) {
    let kind = record.kind();

    let mut payload = [0u8; MAX_PAYLOAD_LEN];
    let payload_len = kind.payload_len();
    write_payload(record, &mut &mut payload[..payload_len]);
    let payload = &payload[..payload_len];

    let running = checksum::update(checksum::INITIAL, &[kind.code()]);
    let crc = checksum::finalize(checksum::update(running, payload));

    dst.put_u8(FRAME_START);
    put_escaped(dst, kind.code());
    for &byte in payload {
        put_escaped(dst, byte);
    }
    for byte in crc.to_le_bytes() {
        put_escaped(dst, byte);
    }
    dst.put_u8(FRAME_END);
}

fn put_escaped(dst: &mut impl BufMut, byte: u8) {
    if is_reserved(byte) {
        dst.put_u8(FRAME_ESCAPE);
        dst.put_u8(byte ^ ESCAPE_XOR);
    } else {
        dst.put_u8(byte);
    }
}
