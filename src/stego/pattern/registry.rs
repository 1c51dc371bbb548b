// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Reference patterns for a set of expected components.
//!
//! A registry is built once from the keys a caller expects to find, then only
//! read while scans run; it has no mutating methods after [`PatternRegistry::build`].
//! Share it across threads by reference.

use crate::stego::config::PatternConfig;
use crate::stego::hash::SeedKey;
use crate::stego::pattern::synth::{synthesize, FrequencyPattern};

/// One expected component and its precomputed reference tile.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub key: SeedKey,
    /// Hash of the canonical key; the pattern seed.
    pub seed: u32,
    pub pattern: FrequencyPattern,
    reference: Vec<f64>,
}

impl RegistryEntry {
    /// Reference gray values in the form the correlator consumes.
    pub fn reference(&self) -> &[f64] {
        &self.reference
    }
}

/// Read-only collection of reference patterns, all synthesized with the
/// same [`PatternConfig`].
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    config: PatternConfig,
    entries: Vec<RegistryEntry>,
}

impl PatternRegistry {
    /// Synthesize a reference pattern for every key. Duplicate keys are kept
    /// once, first occurrence wins.
    pub fn build(keys: impl IntoIterator<Item = SeedKey>, config: &PatternConfig) -> Self {
        let mut entries: Vec<RegistryEntry> = Vec::new();
        for key in keys {
            if entries.iter().any(|e| e.key == key) {
                continue;
            }
            let seed = key.seed();
            let pattern = synthesize(seed, config.tile_size, config.intensity, config.presentation);
            let reference = pattern.to_f64();
            entries.push(RegistryEntry { key, seed, pattern, reference });
        }
        tracing::debug!(entries = entries.len(), tile_size = config.tile_size, "pattern registry built");
        Self { config: config.clone(), entries }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    pub fn tile_size(&self) -> u32 {
        self.config.tile_size
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_seed(&self, seed: u32) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.seed == seed)
    }

    pub fn by_path(&self, path: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.key.path == path)
    }
}
