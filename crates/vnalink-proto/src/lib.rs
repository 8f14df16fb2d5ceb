//! Byte-stuffed, CRC-protected record framing for VNA serial links.
//!
//! Every record travels as one frame:
//! - a start marker (`0x5A`)
//! - the escaped body: kind byte, fixed-layout payload, CRC-32 (little-endian)
//! - an end marker (`0xA5`)
//!
//! The stream decoder resynchronizes after noise or corruption on its own;
//! callers only ever see whole records or a reason a frame was dropped.

pub mod checksum;
#[cfg(feature = "async")]
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod kind;
pub mod layout;
pub mod reader;
pub mod record;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(feature = "async")]
pub use codec::RecordCodec;
pub use decoder::{Decoded, DecoderConfig, DecoderStats, StreamDecoder};
pub use encoder::{
    encode, encode_into, encode_to_slice, is_reserved, max_encoded_len, FRAME_END, FRAME_ESCAPE,
    FRAME_START, MAX_BODY_LEN, MAX_FRAME_LEN,
};
pub use error::{DecodeError, EncodeError, ProtoError, Result};
pub use kind::RecordKind;
pub use reader::RecordReader;
pub use record::*;
pub use writer::RecordWriter;
