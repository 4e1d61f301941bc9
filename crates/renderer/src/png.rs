//! PNG encoding for rendered overlay frames.
//!
//! Frames are written as 8-bit RGBA (color type 6). Surfaces hold
//! premultiplied pixels, so `encode_pixmap` converts back to straight alpha
//! first.

use std::io::Write;

use rayon::prelude::*;
use tiny_skia::Pixmap;

use crate::error::{OverlayError, OverlayResult};

/// Minimum pixels to benefit from parallel demultiplication
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Encode a premultiplied pixmap as an RGBA PNG.
pub fn encode_pixmap(pixmap: &Pixmap) -> OverlayResult<Vec<u8>> {
    let rgba = demultiply(pixmap);
    create_png(&rgba, pixmap.width() as usize, pixmap.height() as usize)
}

/// Straight-alpha RGBA bytes of a premultiplied pixmap.
pub fn demultiply(pixmap: &Pixmap) -> Vec<u8> {
    let pixels = pixmap.pixels();
    let unpack = |p: &tiny_skia::PremultipliedColorU8| {
        let c = p.demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    };

    if pixels.len() >= PARALLEL_THRESHOLD {
        pixels.par_iter().flat_map_iter(unpack).collect()
    } else {
        pixels.iter().flat_map(unpack).collect()
    }
}

/// Create an RGBA PNG from straight-alpha pixel data (4 bytes per pixel).
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> OverlayResult<Vec<u8>> {
    if pixels.len() != width * height * 4 {
        return Err(OverlayError::Encode(format!(
            "expected {} bytes for {}x{} RGBA, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type (RGBA)
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    let idat = deflate_scanlines(pixels, width, height)
        .map_err(|e| OverlayError::Encode(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(pixels: &[u8], width: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let stride = width * 4;
    let mut encoder = flate2::write::ZlibEncoder::new(
        Vec::with_capacity(height * (stride + 1) / 4),
        flate2::Compression::fast(),
    );
    for row in pixels.chunks_exact(stride.max(1)).take(height) {
        encoder.write_all(&[0])?;
        encoder.write_all(row)?;
    }
    encoder.finish()
}
