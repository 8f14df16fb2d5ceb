//! Table-driven CRC-32 used to protect every frame.
//!
//! Parameters (shared bit-for-bit with the instrument firmware):
//! reflected polynomial `0xEDB88320`, initial register `0xFFFFFFFF`,
//! final XOR `0xFFFFFFFF`. This is the IEEE/zlib CRC-32.
//!
//! The running value is kept un-finalized so that disjoint, consecutive byte
//! ranges can be folded in one after another.

/// Reflected form of the IEEE 802.3 polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Register value before any byte has been folded in.
pub const INITIAL: u32 = 0xFFFF_FFFF;

const FINAL_XOR: u32 = 0xFFFF_FFFF;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Fold `bytes` into a running register value.
#[inline]
pub fn update(running: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(running, |crc, &byte| {
        TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8)
    })
}

/// Turn a running register value into the transmitted checksum.
#[inline]
pub fn finalize(running: u32) -> u32 {
    running ^ FINAL_XOR
}

/// One-shot checksum of a contiguous buffer.
pub fn crc32(bytes: &[u8]) -> u32 {
    finalize(update(INITIAL, bytes))
}

/// Incremental CRC-32 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    running: u32,
}

impl Crc32 {
    pub const fn new() -> Self {
        Self { running: INITIAL }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.running = update(self.running, bytes);
    }

    pub fn update_byte(&mut self, byte: u8) {
        self.running = update(self.running, &[byte]);
    }

    pub fn finalize(self) -> u32 {
        finalize(self.running)
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
