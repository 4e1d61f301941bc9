//! Drawing surface abstraction.

use std::cell::RefCell;
use std::rc::Rc;

use crate::glyph::GlyphPath;

/// Pixel dimensions of a viewport or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Identifies a surface within its host's overlay pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// A transparent layer stacked over the map that glyphs are painted on.
pub trait DrawingSurface {
    fn size(&self) -> PixelSize;

    /// Match the surface to new viewport dimensions.
    fn resize(&mut self, size: PixelSize);

    fn set_opacity(&mut self, opacity: f32);

    /// Erase every pixel.
    fn clear(&mut self);

    fn draw_glyph(&mut self, glyph: &GlyphPath);
}

/// A surface shared between its host (which composites it) and the overlay
/// (which paints it).
pub type SharedSurface = Rc<RefCell<dyn DrawingSurface>>;
