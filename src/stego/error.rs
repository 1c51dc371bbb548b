// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for marking and scanning.
//!
//! Only [`ScanError`] is meant to reach a caller as a hard failure. The
//! scanners swallow [`FrameError`] per candidate offset and keep searching,
//! and "nothing found" is reported as `None` / an empty list rather than as an
//! error.

use thiserror::Error;

/// A payload frame could not be read at a given offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A length prefix or fixed field runs past the end of the buffer.
    #[error("payload truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    /// The bytes at the offset are not a known payload magic.
    #[error("no payload magic at offset {offset}")]
    UnknownMagic { offset: usize },
    /// XOR checksum over the frame does not match the stored byte.
    #[error("payload checksum mismatch (stored {stored:#04x}, computed {computed:#04x})")]
    ChecksumMismatch { stored: u8, computed: u8 },
    /// A field is longer than its length prefix can describe.
    #[error("{field} is {len} bytes, max {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// A bit plane could not be written or read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The payload needs more bits than the plane offers.
    #[error("payload needs {needed} bits, channel holds {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },
    /// The designated row is outside the image.
    #[error("row {row} is outside an image of height {height}")]
    RowOutOfBounds { row: u32, height: u32 },
}

/// The source image itself is unusable.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A raw RGBA buffer whose length does not match its dimensions.
    #[error("pixel buffer is {len} bytes, expected {expected} for {width}x{height} RGBA")]
    InvalidBuffer {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },
    /// Zero width or zero height.
    #[error("image has no pixels")]
    EmptyImage,
    /// Encoded image bytes could not be decoded.
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Umbrella error for callers that drive the whole encode/decode path.
#[derive(Debug, Error)]
pub enum StegoError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}
