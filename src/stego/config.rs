// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Scan and synthesis parameters.
//!
//! All structs deserialize with `#[serde(default)]`, so a caller can keep a
//! partial JSON config and get the defaults below for everything it omits.

use serde::{Deserialize, Serialize};

use crate::stego::channel::ChannelKind;
use crate::stego::frame::MAX_IDENTITY_FRAME;
use crate::stego::pattern::synth::Presentation;

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Default pattern strength (fraction of full scale).
pub const DEFAULT_INTENSITY: f64 = 0.15;

/// Default minimum Pearson score for a perceptual hit.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Bytes read per exact-scheme probe unless configured otherwise. Covers the
/// largest identity frame and typical hierarchy frames.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 512;

const _: () = assert!(DEFAULT_MAX_PAYLOAD_BYTES >= MAX_IDENTITY_FRAME);

/// How a reference pattern is synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub tile_size: u32,
    pub intensity: f64,
    pub presentation: Presentation,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            intensity: DEFAULT_INTENSITY,
            presentation: Presentation::NoiseTexture,
        }
    }
}

/// Order in which rows are probed by the exact scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Every row, top to bottom.
    Full,
    /// The last `rows` rows bottom-up, then the first `rows` rows top-down.
    /// Tolerates a marker strip that display scaling pushed to either edge.
    Strip { rows: u32 },
}

impl RowOrder {
    /// Row indices to probe for an image of `height` rows, without repeats.
    pub fn rows(self, height: u32) -> Vec<u32> {
        match self {
            Self::Full => (0..height).collect(),
            Self::Strip { rows } => {
                let n = rows.min(height);
                let bottom = (height - n..height).rev();
                let top = (0..n).filter(|&r| r < height - n);
                bottom.chain(top).collect()
            }
        }
    }
}

/// Exact-scheme (bit plane + checksum) scan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactScanConfig {
    pub order: RowOrder,
    /// Channel strategies tried on each row, in order.
    pub channels: Vec<ChannelKind>,
    /// Upper bound on bytes read from a bit-plane probe.
    pub max_payload_bytes: usize,
    /// Bytes of a byte-plane row searched for magic; the full row when unset.
    pub byte_window: Option<usize>,
    /// Stop after probing this many rows.
    pub max_rows: Option<usize>,
}

impl Default for ExactScanConfig {
    fn default() -> Self {
        Self {
            order: RowOrder::Full,
            channels: vec![ChannelKind::AlphaLsb, ChannelKind::RgbLsb, ChannelKind::BytePlane],
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            byte_window: None,
            max_rows: None,
        }
    }
}

/// Perceptual-scheme (pattern correlation) scan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptualScanConfig {
    pub threshold: f64,
    /// Sweep step is `tile_size / step_divisor`; 2 gives half-tile overlap.
    pub step_divisor: u32,
    /// Display scale factors to undo before sweeping (2.0 for Retina).
    /// Factors below 1/8 are skipped.
    pub scales: Vec<f64>,
    /// Stop after sampling this many tiles across all scales.
    pub max_tiles: Option<usize>,
}

impl Default for PerceptualScanConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            step_divisor: 2,
            scales: vec![1.0],
            max_tiles: None,
        }
    }
}
