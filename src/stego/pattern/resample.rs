// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bilinear resizing for undoing display scaling.
//!
//! A screenshot taken on a 2× display holds every marked tile at twice its
//! synthesized size. The scanner shrinks the luma plane by the display scale
//! before sweeping so tiles line up with the reference size again.

/// Resize a row-major plane from `src_w × src_h` to `dst_w × dst_h`.
///
/// Pixel centers are aligned (`src = (dst + 0.5) * ratio - 0.5`) and samples
/// outside the source are clamped to the nearest edge pixel.
pub fn resize_bilinear(pixels: &[f64], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<f64> {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Vec::new();
    }
    let x_ratio = src_w as f64 / dst_w as f64;
    let y_ratio = src_h as f64 / dst_h as f64;

    let Some(len) = dst_w.checked_mul(dst_h) else {
        return Vec::new();
    };
    let mut result = Vec::with_capacity(len);
    for dy in 0..dst_h {
        let sy = ((dy as f64 + 0.5) * y_ratio - 0.5).clamp(0.0, (src_h - 1) as f64);
        for dx in 0..dst_w {
            let sx = ((dx as f64 + 0.5) * x_ratio - 0.5).clamp(0.0, (src_w - 1) as f64);
            result.push(bilinear_sample(pixels, src_w, src_h, sx, sy));
        }
    }
    result
}

/// Smallest display scale undone; anything lower would upsample the
/// screenshot by more than 8×.
pub const MIN_SCALE: f64 = 0.125;

/// Target size for undoing a display `scale`, or `None` if the result would
/// be empty, the scale is not a finite number of at least [`MIN_SCALE`], or
/// the plane would not fit in memory.
pub fn scaled_dims(width: usize, height: usize, scale: f64) -> Option<(usize, usize)> {
    if !scale.is_finite() || scale < MIN_SCALE {
        return None;
    }
    let w = (width as f64 / scale).round() as usize;
    let h = (height as f64 / scale).round() as usize;
    let len = w.checked_mul(h)?;
    (len > 0 && len <= isize::MAX as usize / std::mem::size_of::<f64>()).then_some((w, h))
}

/// Sample at fractional in-bounds coordinates `(x, y)`.
fn bilinear_sample(pixels: &[f64], w: usize, h: usize, x: f64, y: f64) -> f64 {
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let get = |px: usize, py: usize| pixels[py * w + px];

    get(x0, y0) * (1.0 - fx) * (1.0 - fy)
        + get(x1, y0) * fx * (1.0 - fy)
        + get(x0, y1) * (1.0 - fx) * fy
        + get(x1, y1) * fx * fy
}
