// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Image scanning for both marking schemes.
//!
//! **Exact scheme**: a small state machine walks rows in the configured
//! order, reads each configured channel, and tries every magic candidate in
//! the recovered bytes until one passes its checksum:
//!
//! ```text
//! SearchingRows ──probe──▶ FoundMagic ──next candidate──▶ Validating
//!       ▲                     │  ▲                            │
//!       └──── no candidates ──┘  └──── checksum/parse fail ───┤
//!                                                             ▼
//!   Rejected ◀── rows exhausted                           Accepted
//! ```
//!
//! The first valid frame wins. Corrupt frames, truncated frames and magic
//! that occurs by chance in pixel data are all just "try the next one".
//!
//! **Perceptual scheme**: an exhaustive sweep of overlapping tiles over the
//! luma plane, once per configured display scale, with every tile matched
//! against the whole registry and the hits folded into a ranking.

use std::borrow::Cow;

use image::RgbaImage;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::stego::channel::{Channel, ChannelKind};
use crate::stego::config::{ExactScanConfig, PerceptualScanConfig};
use crate::stego::error::ScanError;
use crate::stego::frame::{decode_valid, magic_candidates, DecodedFrame, Payload, SchemeId};
use crate::stego::pattern::correlate::{match_tile, MatchAggregator, PatternMatch, RankedMatch};
use crate::stego::pattern::registry::PatternRegistry;
use crate::stego::pattern::resample::{resize_bilinear, scaled_dims};
use crate::stego::pixels::{extract_tile, luma_plane};

/// A checksum-valid payload recovered by the exact scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactHit {
    /// Row the channel was anchored at.
    pub row: u32,
    pub channel: ChannelKind,
    /// Byte offset of the magic within the bytes read from that row. Always
    /// zero for the LSB channels.
    pub offset: usize,
    pub frame: DecodedFrame,
}

impl ExactHit {
    pub fn payload(&self) -> &Payload {
        &self.frame.payload
    }

    pub fn scheme(&self) -> SchemeId {
        self.frame.payload.scheme()
    }

    /// Route hash as 8 lowercase hex digits, for identity payloads.
    pub fn route_hash_hex(&self) -> Option<String> {
        self.frame.payload.as_identity().map(|p| p.route_hash_hex())
    }
}

enum ExactState {
    SearchingRows,
    FoundMagic {
        channel: Channel,
        window: Vec<u8>,
        candidates: std::vec::IntoIter<(usize, SchemeId)>,
    },
    Validating {
        channel: Channel,
        window: Vec<u8>,
        candidates: std::vec::IntoIter<(usize, SchemeId)>,
        offset: usize,
        scheme: SchemeId,
    },
    Accepted(ExactHit),
    Rejected,
}

struct ExactScan<'a> {
    image: &'a RgbaImage,
    config: &'a ExactScanConfig,
    probes: std::vec::IntoIter<Channel>,
}

impl<'a> ExactScan<'a> {
    fn new(image: &'a RgbaImage, config: &'a ExactScanConfig) -> Self {
        let rows = config.order.rows(image.height());
        let row_budget = config.max_rows.unwrap_or(rows.len());
        let probes: Vec<Channel> = rows
            .into_iter()
            .take(row_budget)
            .flat_map(|row| config.channels.iter().map(move |&kind| Channel::new(kind, row)))
            .collect();
        Self { image, config, probes: probes.into_iter() }
    }

    fn run(mut self) -> Option<ExactHit> {
        let mut state = ExactState::SearchingRows;
        loop {
            state = match self.step(state) {
                ExactState::Accepted(hit) => return Some(hit),
                ExactState::Rejected => return None,
                next => next,
            };
        }
    }

    fn step(&mut self, state: ExactState) -> ExactState {
        match state {
            ExactState::SearchingRows => {
                let Some(channel) = self.probes.next() else {
                    return ExactState::Rejected;
                };
                let window = self.read_window(channel);
                let mut candidates = magic_candidates(&window);
                if channel.kind != ChannelKind::BytePlane {
                    // LSB frames start at the row's first pixel; a later
                    // offset is another row's frame read through the spill.
                    candidates.retain(|&(offset, _)| offset == 0);
                }
                if candidates.is_empty() {
                    return ExactState::SearchingRows;
                }
                tracing::trace!(row = channel.row, kind = ?channel.kind, count = candidates.len(), "magic candidates");
                ExactState::FoundMagic { channel, window, candidates: candidates.into_iter() }
            }
            ExactState::FoundMagic { channel, window, mut candidates } => match candidates.next() {
                Some((offset, scheme)) => ExactState::Validating { channel, window, candidates, offset, scheme },
                None => ExactState::SearchingRows,
            },
            ExactState::Validating { channel, window, candidates, offset, scheme } => {
                match decode_valid(&window, offset) {
                    Ok(frame) => ExactState::Accepted(ExactHit {
                        row: channel.row,
                        channel: channel.kind,
                        offset,
                        frame,
                    }),
                    Err(e) => {
                        tracing::trace!(row = channel.row, kind = ?channel.kind, offset, ?scheme, error = %e, "candidate rejected");
                        ExactState::FoundMagic { channel, window, candidates }
                    }
                }
            }
            terminal => terminal,
        }
    }

    /// Bytes recovered from one channel probe. A probe that cannot be read
    /// yields nothing to search.
    fn read_window(&self, channel: Channel) -> Vec<u8> {
        let max_bytes = match channel.kind {
            ChannelKind::AlphaLsb | ChannelKind::RgbLsb => self.config.max_payload_bytes,
            ChannelKind::BytePlane => self.config.byte_window.unwrap_or(usize::MAX),
        };
        channel.read_bytes(self.image, max_bytes).unwrap_or_else(|e| {
            tracing::trace!(row = channel.row, kind = ?channel.kind, error = %e, "probe skipped");
            Vec::new()
        })
    }
}

/// Search `image` for a checksum-valid payload.
///
/// Returns `Ok(None)` when every probed row is exhausted without a valid
/// frame.
///
/// # Errors
/// [`ScanError::EmptyImage`] if the image has no pixels.
#[tracing::instrument(skip(image, config), fields(width = image.width(), height = image.height()))]
pub fn scan_exact(image: &RgbaImage, config: &ExactScanConfig) -> Result<Option<ExactHit>, ScanError> {
    ensure_not_empty(image)?;
    let hit = ExactScan::new(image, config).run();
    match &hit {
        Some(h) => tracing::debug!(row = h.row, kind = ?h.channel, offset = h.offset, scheme = ?h.scheme(), "payload accepted"),
        None => tracing::debug!("no valid payload"),
    }
    Ok(hit)
}

/// Sweep `image` with overlapping tiles and rank every registry path that
/// correlated above the threshold somewhere.
///
/// An empty result means no pattern was found.
///
/// # Errors
/// [`ScanError::EmptyImage`] if the image has no pixels.
#[tracing::instrument(
    skip(image, registry, config),
    fields(width = image.width(), height = image.height(), entries = registry.len())
)]
pub fn scan_patterns(
    image: &RgbaImage,
    registry: &PatternRegistry,
    config: &PerceptualScanConfig,
) -> Result<Vec<RankedMatch>, ScanError> {
    ensure_not_empty(image)?;
    let tile = registry.tile_size() as usize;
    if registry.is_empty() || tile == 0 {
        return Ok(Vec::new());
    }
    let step = (tile / config.step_divisor.max(1) as usize).max(1);
    let (width, height) = (image.width() as usize, image.height() as usize);
    let luma = luma_plane(image);

    let mut aggregator = MatchAggregator::new();
    let mut tiles_left = config.max_tiles.unwrap_or(usize::MAX);

    for &scale in &config.scales {
        if tiles_left == 0 {
            break;
        }
        let Some((w, h)) = scaled_dims(width, height, scale) else {
            tracing::trace!(scale, "unsupported scale skipped");
            continue;
        };
        if w < tile || h < tile {
            tracing::trace!(scale, w, h, tile, "image smaller than tile at this scale");
            continue;
        }
        let plane: Cow<'_, [f64]> = if (w, h) == (width, height) {
            Cow::Borrowed(&luma)
        } else {
            Cow::Owned(resize_bilinear(&luma, width, height, w, h))
        };

        let positions: Vec<(usize, usize)> = (0..=h - tile)
            .step_by(step)
            .flat_map(|y| (0..=w - tile).step_by(step).map(move |x| (x, y)))
            .take(tiles_left)
            .collect();
        tiles_left -= positions.len();

        let match_at = |&(x, y): &(usize, usize)| -> Vec<PatternMatch> {
            match_tile(&extract_tile(&plane, w, x, y, tile), registry, config.threshold)
        };

        #[cfg(feature = "parallel")]
        let hits: Vec<Vec<PatternMatch>> = positions.par_iter().map(match_at).collect();
        #[cfg(not(feature = "parallel"))]
        let hits: Vec<Vec<PatternMatch>> = positions.iter().map(match_at).collect();

        for tile_hits in &hits {
            aggregator.extend(tile_hits);
        }
        tracing::trace!(scale, tiles = positions.len(), "scale swept");
    }

    let ranked = aggregator.into_ranked();
    tracing::debug!(paths = ranked.len(), "perceptual scan done");
    Ok(ranked)
}

/// [`scan_patterns`] over several independent images sharing one registry.
/// Results are in input order.
pub fn scan_patterns_many(
    images: &[RgbaImage],
    registry: &PatternRegistry,
    config: &PerceptualScanConfig,
) -> Vec<Result<Vec<RankedMatch>, ScanError>> {
    let scan = |image: &RgbaImage| scan_patterns(image, registry, config);

    #[cfg(feature = "parallel")]
    let results = images.par_iter().map(scan).collect();
    #[cfg(not(feature = "parallel"))]
    let results = images.iter().map(scan).collect();

    results
}

fn ensure_not_empty(image: &RgbaImage) -> Result<(), ScanError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyImage);
    }
    Ok(())
}
