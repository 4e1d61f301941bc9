//! Raster drawing surface backed by a tiny-skia pixmap.

use tiny_skia::{
    Color, GradientStop, LineCap, LinearGradient, Paint, PathBuilder, Pixmap, Shader, SpreadMode,
    Stroke, Transform,
};

use current_common::Rgba;

use crate::glyph::GlyphPath;
use crate::surface::{DrawingSurface, PixelSize};

/// Anti-aliased glyph rendering into a premultiplied RGBA pixmap.
///
/// A zero-sized surface holds no pixmap; drawing onto it does nothing.
#[derive(Debug, Clone)]
pub struct PixmapSurface {
    pixmap: Option<Pixmap>,
    size: PixelSize,
    opacity: f32,
}

impl PixmapSurface {
    pub fn new(size: PixelSize) -> Self {
        Self {
            pixmap: Pixmap::new(size.width, size.height),
            size,
            opacity: 1.0,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.pixmap
            .as_ref()
            .map(|p| p.pixels().iter().filter(|px| px.alpha() > 0).count())
            .unwrap_or(0)
    }
}

fn skia_color(color: &Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.alpha_u8())
}

impl DrawingSurface for PixmapSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn resize(&mut self, size: PixelSize) {
        if size != self.size {
            self.pixmap = Pixmap::new(size.width, size.height);
            self.size = size;
        }
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn clear(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::TRANSPARENT);
        }
    }

    fn draw_glyph(&mut self, glyph: &GlyphPath) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        if glyph.points.len() < 2 {
            return;
        }

        let start = glyph.anchor();
        let end = glyph.tip();

        let mut pb = PathBuilder::new();
        pb.move_to(start.x, start.y);
        for point in &glyph.points[1..] {
            pb.line_to(point.x, point.y);
        }

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.anti_alias = true;
            // Degenerate gradients (zero-length stubs) fall back to a solid colour.
            match LinearGradient::new(
                tiny_skia::Point::from_xy(start.x, start.y),
                tiny_skia::Point::from_xy(end.x, end.y),
                vec![
                    GradientStop::new(0.0, skia_color(&glyph.start_color)),
                    GradientStop::new(1.0, skia_color(&glyph.end_color)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            ) {
                Some(shader) => paint.shader = shader,
                None => paint.shader = Shader::SolidColor(skia_color(&glyph.start_color)),
            }

            let stroke = Stroke {
                width: glyph.line_width,
                line_cap: LineCap::Round,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        let mut pb = PathBuilder::new();
        for barb in &glyph.arrowhead {
            pb.move_to(barb.start.x, barb.start.y);
            pb.line_to(barb.end.x, barb.end.y);
        }
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.anti_alias = true;
            paint.set_color(skia_color(&glyph.arrowhead_color));

            let stroke = Stroke {
                width: glyph.arrowhead_width,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}
