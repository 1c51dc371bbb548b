// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # pixmark-core
//!
//! Invisible identity marks for rendered UI regions. A screenshot of a marked
//! region can be traced back to the component that rendered it without the
//! application running. Two schemes:
//!
//! - **Exact**: a checksummed binary frame (view id, route hash, build sha,
//!   timestamp, or a full component chain) hidden in pixel bit planes.
//!   Recovered bit for bit from lossless screenshots.
//! - **Perceptual**: a low-contrast frequency tile derived from the component
//!   key, recovered by correlation after display scaling or light noise.
//!
//! All processing is synchronous and pure over in-memory RGBA buffers. The
//! optional `parallel` feature spreads perceptual tile scoring over rayon.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pixmark_core::{embed_payload, scan_exact, Channel, ExactScanConfig, IdentityPayload};
//!
//! let mut strip = image::RgbaImage::from_pixel(100, 4, image::Rgba([255, 255, 255, 255]));
//! let payload = IdentityPayload::new("BILLING_02", "/settings/billing")?.with_sha("abc1234");
//! embed_payload(&mut strip, &payload.into(), Channel::alpha_lsb(0))?;
//! let hit = scan_exact(&strip, &ExactScanConfig::default())?.expect("marked");
//! ```

pub mod det_math;
pub mod stego;

pub use stego::{clear_plane, embed_payload, embed_redundant};
pub use stego::{ChannelError, FrameError, ScanError, StegoError};
pub use stego::channel::{redundant_rows, Channel, ChannelKind};
pub use stego::config::{ExactScanConfig, PatternConfig, PerceptualScanConfig, RowOrder};
pub use stego::config::{DEFAULT_INTENSITY, DEFAULT_THRESHOLD, DEFAULT_TILE_SIZE};
pub use stego::frame::{decode, decode_valid, locate_magic, DecodedFrame, HierarchyPayload, IdentityPayload, Payload, SchemeId};
pub use stego::hash::{string_hash, SeedKey};
pub use stego::pattern::{match_tile, paint_pattern, score, synthesize, tile};
pub use stego::pattern::{FrequencyPattern, MatchAggregator, PatternMatch, PatternRegistry, Presentation, RankedMatch};
pub use stego::pixels::{luma_plane, pixels_from_encoded, pixels_from_raw};
pub use stego::scanner::{scan_exact, scan_patterns, scan_patterns_many, ExactHit};
