// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Exact-scheme embed and scan through every channel.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use pixmark_core::{
    decode, embed_payload, embed_redundant, pixels_from_encoded, pixels_from_raw, redundant_rows, scan_exact,
    Channel, ChannelKind, ExactScanConfig, HierarchyPayload, IdentityPayload, Payload, RowOrder, ScanError,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn billing() -> Payload {
    IdentityPayload::new("BILLING_02", "/settings/billing")
        .unwrap()
        .with_sha("abc1234")
        .with_flags(0)
        .into()
}

fn white_strip(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
}

fn noisy_image(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |_, _| Rgba([rng.gen(), rng.gen(), rng.gen(), 255]))
}

#[test]
fn alpha_strip_roundtrip() {
    init_tracing();
    let mut strip = white_strip(100, 4);
    embed_payload(&mut strip, &billing(), Channel::alpha_lsb(0)).unwrap();

    let hit = scan_exact(&strip, &ExactScanConfig::default()).unwrap().expect("payload");
    assert_eq!((hit.row, hit.channel, hit.offset), (0, ChannelKind::AlphaLsb, 0));
    assert!(hit.frame.checksum_valid);
    let id = hit.payload().as_identity().unwrap();
    assert_eq!(id.view_id, "BILLING_02");
    assert_eq!(id.sha, "abc1234");
    assert_eq!(id.flags, 0);
    assert_eq!(hit.route_hash_hex().as_deref(), Some("155d0abe"));
}

#[test]
fn corrupted_pixel_invalidates_frame() {
    let mut strip = white_strip(100, 4);
    embed_payload(&mut strip, &billing(), Channel::alpha_lsb(0)).unwrap();
    // Bit 160 is the top bit of frame byte 20, inside the view id.
    strip.get_pixel_mut(60, 1).0[3] ^= 1;

    let bytes = Channel::alpha_lsb(0).read_bytes(&strip, 50).unwrap();
    let frame = decode(&bytes, 0).unwrap();
    assert!(!frame.checksum_valid);
    assert!(scan_exact(&strip, &ExactScanConfig::default()).unwrap().is_none());
}

#[test]
fn unmarked_images_yield_nothing() {
    init_tracing();
    for seed in 0..3 {
        let img = noisy_image(200, 100, seed);
        assert!(scan_exact(&img, &ExactScanConfig::default()).unwrap().is_none());
    }
    assert!(scan_exact(&white_strip(300, 20), &ExactScanConfig::default()).unwrap().is_none());
}

#[test]
fn redundant_copy_survives_corrupted_row() {
    let mut strip = white_strip(120, 9);
    let rows = redundant_rows(9);
    assert_eq!(rows, vec![0, 4, 8]);
    embed_redundant(&mut strip, &billing(), &rows).unwrap();
    // Pixel 60 of row 0 holds bits 180..183, inside frame byte 22.
    strip.get_pixel_mut(60, 0).0[0] ^= 1;

    let hit = scan_exact(&strip, &ExactScanConfig::default()).unwrap().expect("payload");
    assert_eq!(hit.row, 4);
    assert_eq!(hit.channel, ChannelKind::RgbLsb);
    assert_eq!(hit.payload(), &billing());

    let bottom_up = ExactScanConfig {
        order: RowOrder::Strip { rows: 1 },
        ..Default::default()
    };
    assert_eq!(scan_exact(&strip, &bottom_up).unwrap().unwrap().row, 8);
}

#[test]
fn byte_plane_payload_found_mid_row() {
    let mut img = noisy_image(64, 3, 11);
    let mut rng = ChaCha20Rng::seed_from_u64(12);
    let mut row: Vec<u8> = (0..17).map(|_| rng.gen()).collect();
    row.extend_from_slice(&billing().encode());
    Channel::byte_plane(2).write_bytes(&mut img, &row).unwrap();

    let hit = scan_exact(&img, &ExactScanConfig::default()).unwrap().expect("payload");
    assert_eq!((hit.row, hit.channel, hit.offset), (2, ChannelKind::BytePlane, 17));
    assert_eq!(hit.payload(), &billing());
}

#[test]
fn hierarchy_payload_through_every_channel() {
    let payload: Payload = HierarchyPayload::new("APP/settings/billing/form", "form", "billing-form", "settings", 3)
        .unwrap()
        .into();
    for kind in [ChannelKind::AlphaLsb, ChannelKind::RgbLsb, ChannelKind::BytePlane] {
        let mut img = white_strip(201, 4);
        embed_payload(&mut img, &payload, Channel::new(kind, 1)).unwrap();
        let hit = scan_exact(&img, &ExactScanConfig::default()).unwrap().expect("payload");
        assert_eq!(hit.channel, kind);
        assert_eq!(hit.row, 1);
        assert_eq!(hit.route_hash_hex(), None);
        let h = hit.payload().as_hierarchy().unwrap();
        assert_eq!(h.chain(), vec!["APP", "settings", "billing", "form"]);
        assert_eq!(h.parent_id, "settings");
        assert_eq!(h.depth, 3);
    }
}

#[test]
fn channel_restriction_is_honored() {
    let mut strip = white_strip(100, 4);
    embed_payload(&mut strip, &billing(), Channel::alpha_lsb(0)).unwrap();
    let config = ExactScanConfig {
        channels: vec![ChannelKind::RgbLsb, ChannelKind::BytePlane],
        ..Default::default()
    };
    assert!(scan_exact(&strip, &config).unwrap().is_none());
}

#[test]
fn raw_and_png_inputs() {
    let mut strip = white_strip(100, 4);
    embed_payload(&mut strip, &billing(), Channel::alpha_lsb(0)).unwrap();

    let raw = pixels_from_raw(100, 4, strip.clone().into_raw()).unwrap();
    assert_eq!(scan_exact(&raw, &ExactScanConfig::default()).unwrap().unwrap().payload(), &billing());

    let mut png = Vec::new();
    strip.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
    let decoded = pixels_from_encoded(&png).unwrap();
    assert_eq!(scan_exact(&decoded, &ExactScanConfig::default()).unwrap().unwrap().payload(), &billing());
}

#[test]
fn bad_input_is_a_hard_error() {
    assert!(matches!(
        pixels_from_raw(100, 4, vec![0; 100 * 4 * 3]),
        Err(ScanError::InvalidBuffer { len: 1200, expected: 1600, .. })
    ));
    assert!(matches!(pixels_from_encoded(&[0x89, b'P', b'N', b'G']), Err(ScanError::Decode(_))));
    assert!(matches!(
        scan_exact(&RgbaImage::new(5, 0), &ExactScanConfig::default()),
        Err(ScanError::EmptyImage)
    ));
}
