// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Perceptual marks: frequency patterns and correlation matching.
//!
//! Exact bits do not survive display scaling or lossy recompression, but the
//! coarse frequency structure of a painted tile does. Encoder and decoder
//! both synthesize the tile from the component key; the decoder then slides
//! over a screenshot and correlates.
//!
//! The pipeline: key -> hash seed -> LCG bands -> tile -> paint | correlate.

pub mod synth;
pub mod correlate;
pub mod registry;
pub mod resample;

pub use correlate::{match_tile, score, MatchAggregator, PatternMatch, RankedMatch};
pub use registry::{PatternRegistry, RegistryEntry};
pub use synth::{paint_pattern, synthesize, tile, FrequencyPattern, Presentation};
