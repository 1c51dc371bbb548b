// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Marking and scanning pipelines.
//!
//! Two schemes share this module:
//!
//! - **Exact** ([`embed_payload`] / [`scanner::scan_exact`]): a checksummed
//!   binary frame written into a bit plane of one or more pixel rows. Bit
//!   exact, so it only survives lossless transport.
//!
//! - **Perceptual** ([`pattern::paint_pattern`] / [`scanner::scan_patterns`]):
//!   a low-contrast frequency tile keyed by the component identity and
//!   recovered by correlation. Survives resampling and mild noise, but only
//!   identifies components the caller already lists in a registry.

pub mod error;
pub mod hash;
pub mod frame;
pub mod channel;
pub mod config;
pub mod pattern;
pub mod pixels;
pub mod scanner;

use image::RgbaImage;

pub use error::{ChannelError, FrameError, ScanError, StegoError};

use channel::Channel;
use frame::Payload;

/// Encode `payload` and write it into `channel`.
///
/// # Errors
/// [`StegoError::Channel`] if the row is out of bounds or the frame does not
/// fit; the image is left untouched in that case.
#[tracing::instrument(skip(image, payload), fields(scheme = ?payload.scheme()))]
pub fn embed_payload(image: &mut RgbaImage, payload: &Payload, channel: Channel) -> Result<(), StegoError> {
    let bytes = payload.encode();
    channel.write_bytes(image, &bytes)?;
    tracing::debug!(row = channel.row, kind = ?channel.kind, bytes = bytes.len(), "payload embedded");
    Ok(())
}

/// Encode `payload` and write identical RGB-LSB copies into each of `rows`.
/// [`channel::redundant_rows`] gives the usual first/middle/last choice.
///
/// # Errors
/// [`StegoError::Channel`] if any row is out of bounds or too narrow; no row
/// is written in that case.
#[tracing::instrument(skip(image, payload), fields(scheme = ?payload.scheme()))]
pub fn embed_redundant(image: &mut RgbaImage, payload: &Payload, rows: &[u32]) -> Result<(), StegoError> {
    let bytes = payload.encode();
    channel::write_redundant(image, &bytes, rows)?;
    tracing::debug!(copies = rows.len(), bytes = bytes.len(), "payload embedded redundantly");
    Ok(())
}

/// Zero the plane behind `channel`, leaving every other bit untouched.
///
/// # Errors
/// [`StegoError::Channel`] if the row is out of bounds.
pub fn clear_plane(image: &mut RgbaImage, channel: Channel) -> Result<(), StegoError> {
    channel.clear(image)?;
    Ok(())
}
