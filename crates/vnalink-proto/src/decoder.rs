use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::checksum;
use crate::encoder::{
    is_reserved, CHECKSUM_LEN, ESCAPE_XOR, FRAME_END, FRAME_ESCAPE, FRAME_START, MAX_BODY_LEN,
};
use crate::error::DecodeError;
use crate::kind::RecordKind;
use crate::layout::read_payload;
use crate::record::Record;

/// Outcome of one delimited frame: a record, or the reason it was dropped.
pub type Decoded = Result<Record, DecodeError>;

/// Configuration for the stream decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Largest unescaped frame body (kind + payload + checksum) accepted
    /// before the candidate is dropped as oversized. Default: the body size
    /// of the largest record kind.
    pub max_body_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_body_len: MAX_BODY_LEN,
        }
    }
}

/// Running counters, useful for link-quality diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub records: u64,
    pub checksum_mismatches: u64,
    pub unknown_kinds: u64,
    pub malformed_escapes: u64,
    /// Truncated, too short, oversized and layout rejections.
    pub malformed_frames: u64,
    /// Bytes discarded while looking for a start marker.
    pub noise_bytes: u64,
}

impl DecoderStats {
    pub fn rejected(&self) -> u64 {
        self.checksum_mismatches + self.unknown_kinds + self.malformed_escapes + self.malformed_frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Body,
    Escape,
}

/// Resumable frame decoder for one byte stream.
///
/// Bytes may be fed in any chunking; the decoder carries all partial state
/// between calls, so splitting the same input differently never changes the
/// output. Bytes outside a frame are discarded immediately, and a frame body
/// is bounded by [`DecoderConfig::max_body_len`], so memory stays bounded
/// even against a peer that never sends a valid frame.
///
/// A literal start marker inside a body always aborts that body and starts
/// a new candidate, so a dropped frame never hides a start marker that
/// would otherwise have begun the next valid frame.
///
/// An escape followed by a value that is not a transformed reserved byte
/// poisons the candidate without ending it: the bytes up to the end marker
/// still belong to the frame, which is then validated as usual and can never
/// be emitted as a record.
#[derive(Debug)]
pub struct StreamDecoder {
    body: BytesMut,
    running_crc: u32,
    state: State,
    noise_run: usize,
    /// First invalid escaped value seen in the current candidate.
    poisoned: Option<u8>,
    config: DecoderConfig,
    stats: DecoderStats,
}

impl StreamDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            body: BytesMut::with_capacity(config.max_body_len),
            running_crc: checksum::INITIAL,
            state: State::Scanning,
            noise_run: 0,
            poisoned: None,
            config,
            stats: DecoderStats::default(),
        }
    }

    /// Consume `bytes` and return every frame they completed, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        let mut out = Vec::new();
        for &byte in bytes {
            if let Some(decoded) = self.push_byte(byte) {
                out.push(decoded);
            }
        }
        out
    }

    /// Discard any partial frame and return to scanning for a start marker.
    pub fn reset(&mut self) {
        self.body.clear();
        self.running_crc = checksum::INITIAL;
        self.state = State::Scanning;
        self.noise_run = 0;
        self.poisoned = None;
    }

    /// True when no partial frame is buffered.
    pub fn is_idle(&self) -> bool {
        self.state == State::Scanning
    }

    /// Number of unescaped body bytes held for the current candidate frame.
    pub fn buffered_len(&self) -> usize {
        self.body.len()
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub(crate) fn push_byte(&mut self, byte: u8) -> Option<Decoded> {
        match self.state {
            State::Scanning => {
                if byte == FRAME_START {
                    if self.noise_run > 0 {
                        trace!(skipped = self.noise_run, "start marker after noise");
                        self.noise_run = 0;
                    }
                    self.begin();
                } else {
                    self.noise_run += 1;
                    self.stats.noise_bytes += 1;
                }
                None
            }
            State::Body => match byte {
                FRAME_START => {
                    let rejected = self.reject(DecodeError::Truncated);
                    self.begin();
                    Some(rejected)
                }
                FRAME_END => {
                    self.state = State::Scanning;
                    Some(self.finish())
                }
                FRAME_ESCAPE => {
                    self.state = State::Escape;
                    None
                }
                raw => self.push_body(raw),
            },
            State::Escape => match byte {
                FRAME_START => {
                    let rejected = self.reject(DecodeError::Truncated);
                    self.begin();
                    Some(rejected)
                }
                FRAME_END => {
                    // The dangling escape is dropped; the frame closes here.
                    self.poisoned.get_or_insert(byte);
                    self.state = State::Scanning;
                    Some(self.finish())
                }
                escaped if is_reserved(escaped ^ ESCAPE_XOR) => {
                    self.state = State::Body;
                    self.push_body(escaped ^ ESCAPE_XOR)
                }
                escaped => {
                    self.poisoned.get_or_insert(escaped);
                    self.state = State::Body;
                    self.push_body(escaped)
                }
            },
        }
    }

    fn begin(&mut self) {
        self.body.clear();
        self.running_crc = checksum::INITIAL;
        self.poisoned = None;
        self.state = State::Body;
    }

    fn push_body(&mut self, raw: u8) -> Option<Decoded> {
        if self.body.len() >= self.config.max_body_len {
            self.state = State::Scanning;
            return Some(self.reject(DecodeError::Oversized {
                max: self.config.max_body_len,
            }));
        }
        // The last CHECKSUM_LEN bytes might be the trailer; everything
        // before them is covered by the checksum.
        if self.body.len() >= CHECKSUM_LEN {
            let settled = self.body[self.body.len() - CHECKSUM_LEN];
            self.running_crc = checksum::update(self.running_crc, &[settled]);
        }
        self.body.put_u8(raw);
        None
    }

    fn finish(&mut self) -> Decoded {
        let len = self.body.len();
        if len < 1 + CHECKSUM_LEN {
            return self.reject(DecodeError::TooShort { len });
        }

        let trailer = &self.body[len - CHECKSUM_LEN..];
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = checksum::finalize(self.running_crc);
        if expected != computed {
            return self.reject(DecodeError::ChecksumMismatch { expected, computed });
        }
        if let Some(escaped) = self.poisoned {
            return self.reject(DecodeError::MalformedEscape(escaped));
        }

        let code = self.body[0];
        let Some(kind) = RecordKind::from_code(code) else {
            return self.reject(DecodeError::UnknownKind(code));
        };

        match read_payload(kind, &self.body[1..len - CHECKSUM_LEN]) {
            Ok(record) => {
                self.body.clear();
                self.running_crc = checksum::INITIAL;
                self.poisoned = None;
                self.stats.records += 1;
                trace!(kind = %kind, "decoded record");
                Ok(record)
            }
            Err(err) => self.reject(err),
        }
    }

    fn reject(&mut self, err: DecodeError) -> Decoded {
        match err {
            DecodeError::ChecksumMismatch { .. } => self.stats.checksum_mismatches += 1,
            DecodeError::UnknownKind(_) => self.stats.unknown_kinds += 1,
            DecodeError::MalformedEscape(_) => self.stats.malformed_escapes += 1,
            _ => self.stats.malformed_frames += 1,
        }
        debug!(error = %err, "dropping frame");
        self.body.clear();
        self.running_crc = checksum::INITIAL;
        self.poisoned = None;
        Err(err)
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
