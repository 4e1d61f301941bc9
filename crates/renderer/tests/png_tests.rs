//! Tests for PNG frame export.
//!
//! Renders real overlays through `GeoViewport` and checks the encoded
//! output, including:
//! - Chunk layout and CRCs
//! - Decompressed scanline size
//! - Opacity applied at composition

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use current_common::GeoPoint;
use renderer::png::{create_png, encode_pixmap};
use renderer::{GeoViewport, OverlayConfig, PixelSize, Projection, VectorFieldOverlay};
use test_utils::{gyre_field, viewport};

// ============================================================================
// Helper functions
// ============================================================================

fn gyre_viewport(width: u32, height: u32) -> Rc<RefCell<GeoViewport>> {
    Rc::new(RefCell::new(GeoViewport::new(
        Projection::Equirectangular,
        GeoPoint::new(viewport::CENTER_LAT, viewport::CENTER_LON),
        viewport::DEGREES_PER_PIXEL,
        PixelSize::new(width, height),
    )))
}

/// (type, data) for every chunk after the signature.
fn chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    let mut out = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&kind);
        hasher.update(&data);
        assert_eq!(hasher.finalize(), crc, "bad CRC on chunk {:?}", kind);

        out.push((kind, data));
        pos += 12 + len;
    }
    out
}

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut raw = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut raw)
        .unwrap();
    raw
}

fn render_gyre(opacity: f32) -> tiny_skia::Pixmap {
    let vp = gyre_viewport(200, 160);
    let mut overlay = VectorFieldOverlay::new(OverlayConfig::default()).unwrap();
    overlay
        .attach(
            Rc::clone(&vp),
            gyre_field(viewport::CENTER_LAT, viewport::CENTER_LON, 2.0, 0.25, 1.0),
            opacity,
        )
        .unwrap();
    let pixmap = vp.borrow().compose().unwrap();
    pixmap
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_rendered_frame_structure() {
    let pixmap = render_gyre(1.0);
    let png = encode_pixmap(&pixmap).unwrap();

    assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

    let chunks = chunks(&png);
    let kinds: Vec<&[u8; 4]> = chunks.iter().map(|(k, _)| k).collect();
    assert_eq!(kinds, vec![b"IHDR", b"IDAT", b"IEND"]);

    let ihdr = &chunks[0].1;
    assert_eq!(u32::from_be_bytes(ihdr[0..4].try_into().unwrap()), 200);
    assert_eq!(u32::from_be_bytes(ihdr[4..8].try_into().unwrap()), 160);
    assert_eq!(ihdr[8], 8);
    assert_eq!(ihdr[9], 6);

    // One filter byte plus 4 bytes per pixel for each row.
    let raw = inflate(&chunks[1].1);
    assert_eq!(raw.len(), 160 * (1 + 200 * 4));
    assert!(raw.chunks(801).all(|row| row[0] == 0));
}

#[test]
fn test_rendered_frame_has_glyph_pixels() {
    let pixmap = render_gyre(1.0);
    let painted = pixmap.pixels().iter().filter(|p| p.alpha() > 0).count();
    assert!(painted > 0);
    assert!(painted < pixmap.pixels().len());
}

#[test]
fn test_opacity_scales_composed_alpha() {
    let opaque = render_gyre(1.0);
    let faded = render_gyre(0.5);

    let max_alpha = |p: &tiny_skia::Pixmap| p.pixels().iter().map(|px| px.alpha()).max().unwrap();
    assert!(max_alpha(&faded) < max_alpha(&opaque));

    let transparent = render_gyre(0.0);
    assert!(transparent.pixels().iter().all(|px| px.alpha() == 0));
}

#[test]
fn test_write_frame_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_000.png");

    let png = encode_pixmap(&render_gyre(0.8)).unwrap();
    std::fs::write(&path, &png).unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, png);
}

#[test]
fn test_create_png_rejects_mismatched_dimensions() {
    assert!(create_png(&[0u8; 16], 3, 1).is_err());
    assert!(create_png(&[0u8; 16], 2, 2).is_ok());
}

#[test]
fn test_empty_viewport_composes_nothing() {
    let vp = gyre_viewport(0, 100);
    assert!(vp.borrow().compose().is_none());
}
