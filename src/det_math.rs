// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic sine for reproducible pattern synthesis.
//!
//! The marking side and the scanning side synthesize the same reference
//! patterns independently, possibly on different platforms, so the trig used
//! for synthesis must not depend on the platform libm.
//!
//! Arguments are measured in turns (1.0 = one full cycle), which is how the
//! synthesizer thinks about frequencies and phases anyway. Reduction to the
//! nearest quarter turn is exact in binary floating point; the remaining
//! `|r| <= π/4` goes through the FDLIBM kernel polynomials (< 1 ULP).

use std::f64::consts::TAU;

// Sin kernel coefficients (FDLIBM k_sin.c).
const S1: f64 = f64::from_bits(0xBFC5555555555549); // -1.66666666666666324348e-01
const S2: f64 = f64::from_bits(0x3F8111111110F8A6); //  8.33333333332248946124e-03
const S3: f64 = f64::from_bits(0xBF2A01A019C161D5); // -1.98412698298579493134e-04
const S4: f64 = f64::from_bits(0x3EC71DE357B1FE7D); //  2.75573137070700676789e-06
const S5: f64 = f64::from_bits(0xBE5AE5E68A2B9CEB); // -2.50507602534068634195e-08
const S6: f64 = f64::from_bits(0x3DE5D93A5ACFD57C); //  1.58969099521155010221e-10

// Cos kernel coefficients (FDLIBM k_cos.c).
const C1: f64 = f64::from_bits(0x3FA5555555555549); //  4.16666666666666019037e-02
const C2: f64 = f64::from_bits(0xBF56C16C16C15177); // -1.38888888888741095749e-03
const C3: f64 = f64::from_bits(0x3EFA01A019CB1590); //  2.48015872894767294178e-05
const C4: f64 = f64::from_bits(0xBE927E4F809C52AD); // -2.75573143513906633035e-07
const C5: f64 = f64::from_bits(0x3E21EE9EBDB4B1C4); //  2.08757232129817482790e-09
const C6: f64 = f64::from_bits(0xBDA8FAE9BE8838D4); // -1.13596475577881948265e-11

#[inline]
fn sin_kern(x: f64) -> f64 {
    let z = x * x;
    let v = z * x;
    let r = S2 + z * (S3 + z * (S4 + z * (S5 + z * S6)));
    x + v * (S1 + z * r)
}

#[inline]
fn cos_kern(x: f64) -> f64 {
    let z = x * x;
    let r = z * (C1 + z * (C2 + z * (C3 + z * (C4 + z * (C5 + z * C6)))));
    1.0 - (0.5 * z - z * r)
}

/// Split `turns` into a quadrant index `0..4` and a remainder in radians
/// with `|r| <= π/4`.
#[inline]
fn reduce_turns(turns: f64) -> (usize, f64) {
    let q = (turns * 4.0).round();
    let r = (turns - q * 0.25) * TAU;
    ((q.rem_euclid(4.0)) as usize, r)
}

/// Sine of an angle given in turns.
pub fn sin_turns(turns: f64) -> f64 {
    if !turns.is_finite() {
        return f64::NAN;
    }
    let (q, r) = reduce_turns(turns);
    match q {
        0 => sin_kern(r),
        1 => cos_kern(r),
        2 => -sin_kern(r),
        _ => -cos_kern(r),
    }
}
