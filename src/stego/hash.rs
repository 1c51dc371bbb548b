// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! 32-bit polynomial string hash and canonical pattern seed keys.
//!
//! The hash is `h = h * 31 + unit` over the UTF-16 code units of the input,
//! accumulated with two's-complement `i32` wraparound and cast to `u32` at the
//! end. Payload route hashes and pattern seeds both come from it, and the
//! components that produce marks are not written in Rust, so every step must
//! stay bit-for-bit identical (see `tests/cross_platform.rs` for pinned values).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hash a string to 32 bits.
pub fn string_hash(s: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in s.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    h as u32
}

/// Identity of a marked component for the perceptual scheme.
///
/// The pattern seed is the hash of the compact JSON object
/// `{"path":…,"type":…,"depth":…}` with the fields in exactly that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedKey {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub depth: u32,
}

impl SeedKey {
    pub fn new(path: impl Into<String>, kind: impl Into<String>, depth: u32) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            depth,
        }
    }

    /// Canonical JSON text that gets hashed.
    pub fn canonical(&self) -> String {
        // Field order is part of the contract; string escaping follows JSON.
        format!(
            "{{\"path\":{},\"type\":{},\"depth\":{}}}",
            Value::from(self.path.as_str()),
            Value::from(self.kind.as_str()),
            self.depth
        )
    }

    pub fn seed(&self) -> u32 {
        string_hash(&self.canonical())
    }
}
