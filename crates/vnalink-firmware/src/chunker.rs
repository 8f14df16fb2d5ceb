use std::iter::FusedIterator;

use vnalink_proto::{FirmwarePacket, Record, FIRMWARE_CHUNK_SIZE};

use crate::error::ChunkError;

/// Number of packets needed for an image of `len` bytes.
pub const fn chunk_count(len: usize) -> usize {
    len.div_ceil(FIRMWARE_CHUNK_SIZE)
}

/// Lazily split `image` into addressed packets starting at `base_address`.
///
/// Fails up front if the last (padded) chunk would extend past
/// `u32::MAX`, so the iterator itself never has to.
pub fn chunks(image: &[u8], base_address: u32) -> Result<Chunks<'_>, ChunkError> {
    let padded_end = u64::from(base_address) + (chunk_count(image.len()) * FIRMWARE_CHUNK_SIZE) as u64;
    if padded_end > 1 << 32 {
        return Err(ChunkError::AddressOverflow {
            base: base_address,
            len: image.len(),
        });
    }
    Ok(Chunks {
        inner: image.chunks(FIRMWARE_CHUNK_SIZE),
        address: base_address,
    })
}

/// Split `image` into packets covering it in ascending address order.
/// The final packet is zero padded to a full chunk.
pub fn chunk_image(image: &[u8], base_address: u32) -> Result<Vec<FirmwarePacket>, ChunkError> {
    Ok(chunks(image, base_address)?.collect())
}

/// The full record sequence of an update: `ClearFlash`, every chunk, then
/// `PerformFirmwareUpdate`.
pub fn update_sequence(image: &[u8], base_address: u32) -> Result<Vec<Record>, ChunkError> {
    let chunks = chunks(image, base_address)?;
    let mut records = Vec::with_capacity(chunks.len() + 2);
    records.push(Record::ClearFlash);
    records.extend(chunks.map(Record::FirmwarePacket));
    records.push(Record::PerformFirmwareUpdate);
    Ok(records)
}

/// Iterator returned by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    inner: std::slice::Chunks<'a, u8>,
    address: u32,
}

impl Iterator for Chunks<'_> {
    type Item = FirmwarePacket;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.inner.next()?;
        let packet = FirmwarePacket::from_slice(self.address, data)?;
        self.address = self.address.wrapping_add(FIRMWARE_CHUNK_SIZE as u32);
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}
