// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Normalized correlation between image tiles and reference patterns.

use std::collections::BTreeMap;

use crate::stego::pattern::registry::PatternRegistry;

/// Pearson correlation of two sample vectors over their common prefix.
///
/// Returns 0.0 when either side has zero variance, and never NaN.
pub fn score(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// One registry entry that a sampled tile correlated with.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub path: String,
    pub kind: String,
    pub score: f64,
}

/// Score `tile` against every registry entry and keep all of them above
/// `threshold`, best first. More than one hit is a valid (ambiguous) result.
pub fn match_tile(tile: &[f64], registry: &PatternRegistry, threshold: f64) -> Vec<PatternMatch> {
    let mut hits: Vec<PatternMatch> = registry
        .entries()
        .iter()
        .filter_map(|entry| {
            let s = score(tile, entry.reference());
            (s > threshold).then(|| PatternMatch {
                path: entry.key.path.clone(),
                kind: entry.key.kind.clone(),
                score: s,
            })
        })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}

/// Aggregated evidence for one registry path across a whole scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub path: String,
    pub kind: String,
    /// Number of sampled tiles that hit this path.
    pub count: usize,
    pub max_score: f64,
}

/// Accumulates `(count, max score)` per path over many sampled tiles.
#[derive(Debug, Default, Clone)]
pub struct MatchAggregator {
    by_path: BTreeMap<String, RankedMatch>,
}

impl MatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hit: &PatternMatch) {
        let entry = self.by_path.entry(hit.path.clone()).or_insert_with(|| RankedMatch {
            path: hit.path.clone(),
            kind: hit.kind.clone(),
            count: 0,
            max_score: f64::NEG_INFINITY,
        });
        entry.count += 1;
        entry.max_score = entry.max_score.max(hit.score);
    }

    pub fn extend<'a>(&mut self, hits: impl IntoIterator<Item = &'a PatternMatch>) {
        for hit in hits {
            self.record(hit);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Paths ranked by tile count, then by peak score. Coverage wins over a
    /// single strong tile; ties beyond that fall back to path order.
    pub fn into_ranked(self) -> Vec<RankedMatch> {
        let mut ranked: Vec<RankedMatch> = self.by_path.into_values().collect();
        ranked.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.max_score.total_cmp(&a.max_score))
        });
        ranked
    }
}
