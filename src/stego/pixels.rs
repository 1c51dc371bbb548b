// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pixel buffer intake and the luminance plane.
//!
//! Everything downstream runs on [`image::RgbaImage`]. These adapters are the
//! only place a caller-supplied buffer can be rejected.

use image::RgbaImage;

use crate::stego::error::ScanError;

/// Wrap a raw row-major RGBA buffer.
///
/// # Errors
/// - [`ScanError::EmptyImage`] if either dimension is zero.
/// - [`ScanError::InvalidBuffer`] if `bytes.len() != width * height * 4`.
pub fn pixels_from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<RgbaImage, ScanError> {
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyImage);
    }
    let expected = width as usize * height as usize * 4;
    let len = bytes.len();
    if len != expected {
        return Err(ScanError::InvalidBuffer { width, height, len, expected });
    }
    RgbaImage::from_raw(width, height, bytes).ok_or(ScanError::InvalidBuffer {
        width,
        height,
        len,
        expected,
    })
}

/// Decode an encoded image (PNG) into RGBA. Alpha is added as opaque when the
/// source has none.
///
/// # Errors
/// - [`ScanError::Decode`] if the bytes are not a readable image.
/// - [`ScanError::EmptyImage`] if the decoded image has no pixels.
pub fn pixels_from_encoded(bytes: &[u8]) -> Result<RgbaImage, ScanError> {
    let image = image::load_from_memory(bytes)?.into_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyImage);
    }
    Ok(image)
}

/// BT.601 luma of every pixel, row-major. Alpha is ignored.
pub fn luma_plane(image: &RgbaImage) -> Vec<f64> {
    image
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
        })
        .collect()
}

/// Copy a `size × size` window at `(x, y)` out of a row-major plane of width
/// `width`. The window must lie inside the plane.
pub(crate) fn extract_tile(plane: &[f64], width: usize, x: usize, y: usize, size: usize) -> Vec<f64> {
    let mut tile = Vec::with_capacity(size * size);
    for row in y..y + size {
        let start = row * width + x;
        tile.extend_from_slice(&plane[start..start + size]);
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn raw_buffer_roundtrip() {
        let bytes: Vec<u8> = (0..2 * 3 * 4).map(|i| i as u8).collect();
        let img = pixels_from_raw(2, 3, bytes.clone()).unwrap();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.into_raw(), bytes);
    }

    #[test]
    fn raw_buffer_length_checked() {
        match pixels_from_raw(4, 4, vec![0; 60]) {
            Err(ScanError::InvalidBuffer { len: 60, expected: 64, .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(pixels_from_raw(0, 4, Vec::new()), Err(ScanError::EmptyImage)));
    }

    #[test]
    fn encoded_png_decodes() {
        let src = RgbaImage::from_pixel(5, 2, Rgba([1, 2, 3, 4]));
        let mut png = Vec::new();
        src.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
        assert_eq!(pixels_from_encoded(&png).unwrap(), src);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(pixels_from_encoded(b"not an image"), Err(ScanError::Decode(_))));
    }

    #[test]
    fn luma_of_gray_is_gray() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 200, 200, 0]));
        assert!(luma_plane(&img).iter().all(|&v| (v - 200.0).abs() < 1e-9));
    }

    #[test]
    fn tile_extraction() {
        let plane: Vec<f64> = (0..16).map(f64::from).collect();
        assert_eq!(extract_tile(&plane, 4, 1, 2, 2), vec![9.0, 10.0, 13.0, 14.0]);
    }
}
