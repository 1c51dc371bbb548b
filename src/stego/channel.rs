// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit-plane channels: where payload bits live inside the pixels.
//!
//! Three strategies, all MSB-first within each payload byte:
//!
//! - **Alpha LSB**: one bit per pixel in the least significant bit of alpha,
//!   starting at column 0 of a designated row and continuing in raster order
//!   into the following rows when the payload is longer than one row.
//! - **RGB LSB**: three bits per pixel (R, G, B least significant bits) in a
//!   single row. Redundancy comes from writing identical copies into several
//!   rows with [`write_redundant`]; a reader probes each row on its own.
//! - **Byte plane**: a whole byte per R, G and B value across a single row.
//!   Higher capacity, no resilience; the reader searches the full row for
//!   magic because the payload offset within the row is not fixed.
//!
//! Writers touch only their designated plane. LSB writers mask the target bit
//! (`v & !1 | bit`) and leave the other seven bits alone; alpha is never
//! touched by the RGB strategies and RGB never by the alpha strategy.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::stego::error::ChannelError;
use crate::stego::frame::{bits_to_bytes, bytes_to_bits};

/// Index of the alpha component in an RGBA pixel.
const ALPHA: usize = 3;

/// Which pixel plane carries payload data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    AlphaLsb,
    RgbLsb,
    BytePlane,
}

impl ChannelKind {
    /// Payload bits stored per slot.
    fn bits_per_slot(self) -> usize {
        match self {
            Self::AlphaLsb | Self::RgbLsb => 1,
            Self::BytePlane => 8,
        }
    }
}

/// A channel strategy anchored at a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    pub kind: ChannelKind,
    pub row: u32,
}

impl Channel {
    pub fn new(kind: ChannelKind, row: u32) -> Self {
        Self { kind, row }
    }

    pub fn alpha_lsb(row: u32) -> Self {
        Self::new(ChannelKind::AlphaLsb, row)
    }

    pub fn rgb_lsb(row: u32) -> Self {
        Self::new(ChannelKind::RgbLsb, row)
    }

    pub fn byte_plane(row: u32) -> Self {
        Self::new(ChannelKind::BytePlane, row)
    }

    /// Payload bits this channel can hold in `image`.
    pub fn capacity_bits(&self, image: &RgbaImage) -> usize {
        let (w, h) = image.dimensions();
        if self.row >= h {
            return 0;
        }
        let slots = match self.kind {
            ChannelKind::AlphaLsb => w as usize * (h - self.row) as usize,
            ChannelKind::RgbLsb | ChannelKind::BytePlane => w as usize * 3,
        };
        slots * self.kind.bits_per_slot()
    }

    /// Write `bits` (one bit per element, MSB-first order) into the plane.
    ///
    /// For the byte plane the bits are packed into bytes first and a partial
    /// last byte is zero-padded.
    ///
    /// # Errors
    /// - [`ChannelError::RowOutOfBounds`] if the row is outside the image.
    /// - [`ChannelError::CapacityExceeded`] if `bits` does not fit.
    pub fn write_bits(&self, image: &mut RgbaImage, bits: &[u8]) -> Result<(), ChannelError> {
        self.check_row(image)?;
        let capacity = self.capacity_bits(image);
        if bits.len() > capacity {
            return Err(ChannelError::CapacityExceeded { needed: bits.len(), capacity });
        }
        match self.kind {
            ChannelKind::AlphaLsb | ChannelKind::RgbLsb => {
                for ((x, y, c), &bit) in self.slots(image).zip(bits) {
                    let value = &mut image.get_pixel_mut(x, y).0[c];
                    *value = (*value & !1) | (bit & 1);
                }
            }
            ChannelKind::BytePlane => {
                let bytes = bits_to_bytes(bits);
                for ((x, y, c), byte) in self.slots(image).zip(bytes) {
                    image.get_pixel_mut(x, y).0[c] = byte;
                }
            }
        }
        Ok(())
    }

    /// Read up to `bit_count` bits, clamped to the channel capacity.
    ///
    /// Only the pixels holding those bits are inspected.
    pub fn read_bits(&self, image: &RgbaImage, bit_count: usize) -> Result<Vec<u8>, ChannelError> {
        self.check_row(image)?;
        let count = bit_count.min(self.capacity_bits(image));
        let bits = match self.kind {
            ChannelKind::AlphaLsb | ChannelKind::RgbLsb => self
                .slots(image)
                .take(count)
                .map(|(x, y, c)| image.get_pixel(x, y).0[c] & 1)
                .collect(),
            ChannelKind::BytePlane => {
                let bytes: Vec<u8> = self
                    .slots(image)
                    .take(count.div_ceil(8))
                    .map(|(x, y, c)| image.get_pixel(x, y).0[c])
                    .collect();
                let mut bits = bytes_to_bits(&bytes);
                bits.truncate(count);
                bits
            }
        };
        Ok(bits)
    }

    /// Write whole bytes.
    pub fn write_bytes(&self, image: &mut RgbaImage, bytes: &[u8]) -> Result<(), ChannelError> {
        self.write_bits(image, &bytes_to_bits(bytes))
    }

    /// Read up to `max_bytes` whole bytes, fewer if the channel is smaller.
    pub fn read_bytes(&self, image: &RgbaImage, max_bytes: usize) -> Result<Vec<u8>, ChannelError> {
        let available = self.capacity_bits(image) / 8;
        let bits = self.read_bits(image, max_bytes.min(available) * 8)?;
        Ok(bits_to_bytes(&bits))
    }

    /// Zero the whole plane, leaving every other bit of each pixel as it was.
    pub fn clear(&self, image: &mut RgbaImage) -> Result<(), ChannelError> {
        self.check_row(image)?;
        let zeros = vec![0u8; self.capacity_bits(image)];
        self.write_bits(image, &zeros)
    }

    fn check_row(&self, image: &RgbaImage) -> Result<(), ChannelError> {
        let height = image.height();
        if self.row >= height {
            return Err(ChannelError::RowOutOfBounds { row: self.row, height });
        }
        Ok(())
    }

    /// `(x, y, component)` of every slot, in payload order.
    fn slots(&self, image: &RgbaImage) -> Box<dyn Iterator<Item = (u32, u32, usize)>> {
        let (w, h) = image.dimensions();
        let row = self.row;
        match self.kind {
            ChannelKind::AlphaLsb => Box::new((row..h).flat_map(move |y| (0..w).map(move |x| (x, y, ALPHA)))),
            ChannelKind::RgbLsb | ChannelKind::BytePlane => {
                Box::new((0..w).flat_map(move |x| (0..3).map(move |c| (x, row, c))))
            }
        }
    }
}

/// Write identical RGB-LSB copies of `bytes` into each of `rows`.
///
/// # Errors
/// Fails before touching the image if any row is out of bounds or too narrow.
pub fn write_redundant(image: &mut RgbaImage, bytes: &[u8], rows: &[u32]) -> Result<(), ChannelError> {
    let bits = bytes_to_bits(bytes);
    for &row in rows {
        let channel = Channel::rgb_lsb(row);
        channel.check_row(image)?;
        let capacity = channel.capacity_bits(image);
        if bits.len() > capacity {
            return Err(ChannelError::CapacityExceeded { needed: bits.len(), capacity });
        }
    }
    for &row in rows {
        Channel::rgb_lsb(row).write_bits(image, &bits)?;
    }
    Ok(())
}

/// First, middle and last row of a strip of `height` rows, deduplicated.
pub fn redundant_rows(height: u32) -> Vec<u32> {
    let mut rows = Vec::with_capacity(3);
    for row in [0, height / 2, height.saturating_sub(1)] {
        if row < height && !rows.contains(&row) {
            rows.push(row);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn strip(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                ((x * 17 + y) % 256) as u8,
                ((y * 23 + x) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
                255 - (x % 7) as u8,
            ])
        })
    }

    #[test]
    fn capacities() {
        let img = strip(100, 4);
        assert_eq!(Channel::alpha_lsb(0).capacity_bits(&img), 400);
        assert_eq!(Channel::alpha_lsb(3).capacity_bits(&img), 100);
        assert_eq!(Channel::rgb_lsb(2).capacity_bits(&img), 300);
        assert_eq!(Channel::byte_plane(1).capacity_bits(&img), 2400);
        assert_eq!(Channel::alpha_lsb(4).capacity_bits(&img), 0);
    }

    #[test]
    fn roundtrip_each_kind() {
        let data = b"PXID\x01 roundtrip";
        for channel in [Channel::alpha_lsb(1), Channel::rgb_lsb(2), Channel::byte_plane(3)] {
            let mut img = strip(64, 4);
            channel.write_bytes(&mut img, data).unwrap();
            let back = channel.read_bytes(&img, data.len()).unwrap();
            assert_eq!(back, data, "{channel:?}");
        }
    }

    #[test]
    fn alpha_lsb_spills_into_next_rows() {
        let mut img = strip(10, 4);
        let bytes = [0xA5u8; 3]; // 24 bits over a 10-pixel row
        Channel::alpha_lsb(1).write_bytes(&mut img, &bytes).unwrap();
        assert_eq!(Channel::alpha_lsb(1).read_bytes(&img, 3).unwrap(), bytes);
        // MSB of 0xA5 lands at (0, 1), bit 10 at (0, 2).
        assert_eq!(img.get_pixel(0, 1).0[3] & 1, 1);
        assert_eq!(img.get_pixel(0, 2).0[3] & 1, (0xA5 >> 5) & 1);
    }

    #[test]
    fn lsb_writers_touch_only_target_bit() {
        let original = strip(40, 3);
        let payload = [0xFFu8, 0x00, 0x5A];

        let mut img = original.clone();
        Channel::alpha_lsb(0).write_bytes(&mut img, &payload).unwrap();
        for (a, b) in original.pixels().zip(img.pixels()) {
            assert_eq!(a.0[..3], b.0[..3], "RGB changed by alpha writer");
            assert_eq!(a.0[3] & !1, b.0[3] & !1, "upper alpha bits changed");
        }

        let mut img = original.clone();
        Channel::rgb_lsb(1).write_bytes(&mut img, &payload).unwrap();
        for (x, y, b) in img.enumerate_pixels() {
            let a = original.get_pixel(x, y);
            assert_eq!(a.0[3], b.0[3], "alpha changed by RGB writer");
            for c in 0..3 {
                assert_eq!(a.0[c] & !1, b.0[c] & !1);
            }
            if y != 1 {
                assert_eq!(a, b, "row {y} outside the designated row changed");
            }
        }
    }

    #[test]
    fn byte_plane_preserves_alpha_and_other_rows() {
        let original = strip(16, 3);
        let mut img = original.clone();
        Channel::byte_plane(2).write_bytes(&mut img, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(img.get_pixel(0, 2).0, [1, 2, 3, original.get_pixel(0, 2).0[3]]);
        assert_eq!(img.get_pixel(1, 2).0[..2], [4, 5]);
        assert_eq!(img.get_pixel(1, 2).0[2], original.get_pixel(1, 2).0[2]);
        for y in 0..2 {
            for x in 0..16 {
                assert_eq!(img.get_pixel(x, y), original.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn capacity_exceeded() {
        let mut img = strip(10, 1);
        let err = Channel::rgb_lsb(0).write_bytes(&mut img, &[0u8; 4]).unwrap_err();
        assert_eq!(err, ChannelError::CapacityExceeded { needed: 32, capacity: 30 });
    }

    #[test]
    fn row_out_of_bounds() {
        let mut img = strip(10, 2);
        assert_eq!(
            Channel::alpha_lsb(2).write_bytes(&mut img, &[1]),
            Err(ChannelError::RowOutOfBounds { row: 2, height: 2 })
        );
        assert!(Channel::byte_plane(5).read_bits(&img, 8).is_err());
    }

    #[test]
    fn read_is_clamped_to_capacity() {
        let img = strip(4, 2);
        assert_eq!(Channel::rgb_lsb(0).read_bits(&img, 1000).unwrap().len(), 12);
        assert_eq!(Channel::rgb_lsb(0).read_bytes(&img, 1000).unwrap().len(), 1);
    }

    #[test]
    fn clear_zeroes_only_the_plane() {
        let original = strip(8, 2);
        let mut img = original.clone();
        Channel::rgb_lsb(1).clear(&mut img).unwrap();
        assert!(Channel::rgb_lsb(1).read_bits(&img, 24).unwrap().iter().all(|&b| b == 0));
        for x in 0..8 {
            for c in 0..4 {
                assert_eq!(img.get_pixel(x, 1).0[c] | 1, original.get_pixel(x, 1).0[c] | 1);
            }
        }
    }

    #[test]
    fn redundant_copies_are_identical() {
        let mut img = strip(48, 9);
        let rows = redundant_rows(9);
        assert_eq!(rows, vec![0, 4, 8]);
        write_redundant(&mut img, b"copy", &rows).unwrap();
        for row in rows {
            assert_eq!(Channel::rgb_lsb(row).read_bytes(&img, 4).unwrap(), b"copy");
        }
    }

    #[test]
    fn redundant_write_is_all_or_nothing() {
        let original = strip(8, 3);
        let mut img = original.clone();
        assert!(write_redundant(&mut img, b"x", &[0, 7]).is_err());
        assert_eq!(img, original);
    }

    #[test]
    fn redundant_rows_small_strips() {
        assert_eq!(redundant_rows(1), vec![0]);
        assert_eq!(redundant_rows(2), vec![0, 1]);
        assert!(redundant_rows(0).is_empty());
    }
}
