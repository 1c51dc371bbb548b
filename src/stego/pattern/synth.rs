// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Frequency pattern synthesis.
//!
//! A pattern is a square grayscale tile built from three sinusoidal bands
//! whose frequency, phase and amplitude are drawn from a linear congruential
//! generator seeded with a 32-bit key hash. Patterns are never transmitted:
//! the marking side paints one, the scanning side recomputes the same tile
//! from the same key and correlates. Every numeric step must therefore
//! reproduce exactly, including the LCG constants and the draw order.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::det_math::sin_turns;
use crate::stego::hash::string_hash;

pub const LCG_MULTIPLIER: u64 = 9301;
pub const LCG_INCREMENT: u64 = 49297;
pub const LCG_MODULUS: u64 = 233_280;

/// `(lowest frequency, number of frequencies)` per band, in whole cycles per
/// tile: 2–6, 6–10 and 12–17.
const BANDS: [(u32, u32); 3] = [(2, 5), (6, 5), (12, 6)];

/// Minimum band amplitude; draws scale it up to 1.0.
const MIN_AMPLITUDE: f64 = 0.5;

/// The `seed * 9301 + 49297 mod 233280` generator.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: u64::from(seed) }
    }

    /// Advance and return the new state.
    pub fn next_state(&mut self) -> u64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state
    }

    /// Advance and return a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.next_state() as f64 / LCG_MODULUS as f64
    }
}

/// How the tile is presented on the page. Only the gray baseline differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Mid-gray noise texture, baseline 128.
    NoiseTexture,
    /// Near-white paper grain, baseline 245.
    PageGrain,
}

impl Presentation {
    pub fn baseline(self) -> f64 {
        match self {
            Self::NoiseTexture => 128.0,
            Self::PageGrain => 245.0,
        }
    }
}

/// One sinusoidal component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Whole cycles across the tile.
    pub frequency: u32,
    /// Phase offset in turns, `[0, 1)`.
    pub phase: f64,
    pub amplitude: f64,
}

/// Draw the three bands for `seed`: frequency, phase, amplitude per band.
pub fn derive_bands(seed: u32) -> [Band; 3] {
    let mut lcg = Lcg::new(seed);
    BANDS.map(|(low, count)| {
        let frequency = low + (lcg.next_unit() * f64::from(count)).floor() as u32;
        let phase = lcg.next_unit();
        let amplitude = MIN_AMPLITUDE + (1.0 - MIN_AMPLITUDE) * lcg.next_unit();
        Band { frequency, phase, amplitude }
    })
}

/// A synthesized square grayscale tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyPattern {
    size: u32,
    seed: u32,
    pixels: Vec<u8>,
}

impl FrequencyPattern {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Row-major gray values.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Gray value at `(x, y)`, or `None` outside the tile.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels.get(y as usize * self.size as usize + x as usize).copied()
    }

    /// Gray values as floats, the form the correlator consumes.
    pub fn to_f64(&self) -> Vec<f64> {
        self.pixels.iter().map(|&v| f64::from(v)).collect()
    }
}

/// Synthesize the pattern for an already-hashed seed.
///
/// Band 1 varies along x, band 2 along y, band 3 along the diagonal. The gray
/// value is `baseline + intensity * 255 * mean(terms)`, rounded and clamped
/// to a byte.
pub fn synthesize(seed: u32, size: u32, intensity: f64, presentation: Presentation) -> FrequencyPattern {
    let bands = derive_bands(seed);
    let baseline = presentation.baseline();
    let scale = intensity * 255.0 / bands.len() as f64;
    let n = f64::from(size.max(1));

    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        let v = f64::from(y) / n;
        for x in 0..size {
            let u = f64::from(x) / n;
            let terms = band_term(&bands[0], u) + band_term(&bands[1], v) + band_term(&bands[2], u + v);
            let gray = (baseline + scale * terms).round().clamp(0.0, 255.0);
            pixels.push(gray as u8);
        }
    }

    FrequencyPattern { size, seed, pixels }
}

/// Synthesize the pattern for a seed key string.
pub fn tile(seed_key: &str, size: u32, intensity: f64, presentation: Presentation) -> FrequencyPattern {
    synthesize(string_hash(seed_key), size, intensity, presentation)
}

#[inline]
fn band_term(band: &Band, position: f64) -> f64 {
    band.amplitude * sin_turns(f64::from(band.frequency) * position + band.phase)
}

/// Paint `pattern` as gray into the RGB channels with its top-left corner at
/// `(x, y)`. Alpha is left alone; the part outside the image is clipped.
pub fn paint_pattern(image: &mut RgbaImage, x: u32, y: u32, pattern: &FrequencyPattern) {
    let (w, h) = image.dimensions();
    let size = pattern.size() as usize;
    if size == 0 {
        return;
    }
    let rows = pattern.pixels().chunks_exact(size);
    for (ty, row) in (0..h.saturating_sub(y)).zip(rows) {
        for (tx, &gray) in (0..w.saturating_sub(x)).zip(row) {
            let px = image.get_pixel_mut(x + tx, y + ty);
            px.0[0] = gray;
            px.0[1] = gray;
            px.0[2] = gray;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn lcg_sequence() {
        let mut lcg = Lcg::new(0);
        assert_eq!(lcg.next_state(), 49297);
        assert_eq!(lcg.next_state(), (49297 * 9301 + 49297) % 233_280);
        let mut lcg = Lcg::new(u32::MAX);
        let expected = (u64::from(u32::MAX) * 9301 + 49297) % 233_280;
        assert_eq!(lcg.next_state(), expected);
    }

    #[test]
    fn unit_draws_in_range() {
        let mut lcg = Lcg::new(12345);
        for _ in 0..1000 {
            let r = lcg.next_unit();
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn bands_stay_in_their_ranges() {
        for seed in (0..5000u32).map(|i| i.wrapping_mul(2_654_435_761)) {
            let [a, b, c] = derive_bands(seed);
            assert!((2..=6).contains(&a.frequency), "seed {seed}");
            assert!((6..=10).contains(&b.frequency), "seed {seed}");
            assert!((12..=17).contains(&c.frequency), "seed {seed}");
            for band in [a, b, c] {
                assert!((0.0..1.0).contains(&band.phase));
                assert!((0.5..1.0).contains(&band.amplitude));
            }
        }
    }

    #[test]
    fn deterministic() {
        let a = tile("key", 32, 0.15, Presentation::NoiseTexture);
        let b = tile("key", 32, 0.15, Presentation::NoiseTexture);
        assert_eq!(a, b);
        assert_eq!(a.pixels().len(), 32 * 32);
    }

    #[test]
    fn different_keys_differ() {
        let a = tile("key-a", 32, 0.15, Presentation::NoiseTexture);
        let b = tile("key-b", 32, 0.15, Presentation::NoiseTexture);
        assert_ne!(a.pixels(), b.pixels());
    }

    #[test]
    fn centered_on_baseline() {
        for presentation in [Presentation::NoiseTexture, Presentation::PageGrain] {
            let p = tile("center", 64, 0.02, presentation);
            let mean = p.pixels().iter().map(|&v| f64::from(v)).sum::<f64>() / 4096.0;
            assert!((mean - presentation.baseline()).abs() < 1.5, "{presentation:?} mean {mean}");
        }
    }

    #[test]
    fn amplitude_bounded_by_intensity() {
        let p = tile("bounded", 64, 0.15, Presentation::NoiseTexture);
        let max_dev = 0.15 * 255.0 + 0.5;
        for &v in p.pixels() {
            assert!((f64::from(v) - 128.0).abs() <= max_dev);
        }
    }

    #[test]
    fn zero_intensity_is_flat() {
        let p = tile("flat", 16, 0.0, Presentation::PageGrain);
        assert!(p.pixels().iter().all(|&v| v == 245));
    }

    #[test]
    fn empty_tile() {
        assert!(tile("none", 0, 0.15, Presentation::NoiseTexture).pixels().is_empty());
    }

    #[test]
    fn get_is_none_outside_the_tile() {
        let p = tile("edge", 8, 0.15, Presentation::NoiseTexture);
        assert_eq!(p.get(7, 7), p.pixels().last().copied());
        assert_eq!(p.get(8, 0), None);
        assert_eq!(p.get(0, 8), None);
        assert_eq!(p.get(u32::MAX, u32::MAX), None);
        assert_eq!(tile("none", 0, 0.15, Presentation::NoiseTexture).get(0, 0), None);
    }

    #[test]
    fn paint_preserves_alpha_and_clips() {
        let mut img = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 77]));
        let p = tile("paint", 16, 0.15, Presentation::NoiseTexture);
        paint_pattern(&mut img, 30, 30, &p);
        let corner = p.get(0, 0).unwrap();
        assert_eq!(img.get_pixel(30, 30).0, [corner, corner, corner, 77]);
        assert_eq!(Some(img.get_pixel(39, 39).0[0]), p.get(9, 9));
        assert_eq!(img.get_pixel(29, 29).0, [10, 20, 30, 77]);
    }
}
