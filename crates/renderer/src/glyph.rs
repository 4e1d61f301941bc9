//! Streamline stub and arrowhead geometry.
//!
//! A stub is a short straight polyline starting at a grid anchor and pointing
//! along the current. Screen y grows downward, so a compass bearing maps to a
//! screen angle of `bearing - 90` degrees: north points up, east points right.

use current_common::{CurrentSample, Rgba};

use crate::config::OverlayConfig;

/// A point in 2D space (pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Everything needed to paint one glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPath {
    /// `segments + 1` points, anchor first.
    pub points: Vec<Point>,
    /// Gradient colour at the anchor.
    pub start_color: Rgba,
    /// Gradient colour at the tip.
    pub end_color: Rgba,
    pub line_width: f32,
    pub arrowhead: [Segment; 2],
    pub arrowhead_color: Rgba,
    pub arrowhead_width: f32,
}

impl GlyphPath {
    pub fn anchor(&self) -> Point {
        self.points[0]
    }

    pub fn tip(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Total polyline length in pixels.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Compass bearing (degrees clockwise from north) to a screen-space angle in radians.
pub fn screen_angle(direction_deg: f64) -> f64 {
    (direction_deg - 90.0).to_radians()
}

/// Length of one stub segment for a given speed.
pub fn segment_length(speed: f64, config: &OverlayConfig) -> f64 {
    config.segment_length_px * (speed * config.speed_length_gain).min(config.max_length_factor)
}

/// Build the glyph anchored at pixel `(x, y)` for a matched sample.
pub fn streamline_stub(x: f64, y: f64, sample: &CurrentSample, config: &OverlayConfig) -> GlyphPath {
    let angle = screen_angle(sample.direction);
    let step = segment_length(sample.speed, config);
    let (dx, dy) = (angle.cos() * step, angle.sin() * step);

    let mut points = Vec::with_capacity(config.segments as usize + 1);
    let (mut px, mut py) = (x, y);
    points.push(Point::new(px as f32, py as f32));
    for _ in 0..config.segments {
        px += dx;
        py += dy;
        points.push(Point::new(px as f32, py as f32));
    }

    let n = points.len();
    let arrowhead = arrowhead(points[n - 2], points[n - 1], sample.speed, config);

    let palette = &config.palette;
    GlyphPath {
        start_color: palette.band_color(sample.speed, config.start_alpha),
        end_color: palette.band_color(sample.speed, config.end_alpha),
        line_width: (sample.speed * config.line_width_gain).max(config.min_line_width) as f32,
        arrowhead_color: palette.band_color(sample.speed, config.arrowhead_alpha),
        arrowhead_width: config.arrowhead_width as f32,
        arrowhead,
        points,
    }
}

/// Two strokes forming a V at `end`, opening back toward `penultimate`.
pub fn arrowhead(
    penultimate: Point,
    end: Point,
    speed: f64,
    config: &OverlayConfig,
) -> [Segment; 2] {
    let head_length = (speed * config.arrowhead_gain).max(config.min_arrowhead_px);
    let angle = ((end.y - penultimate.y) as f64).atan2((end.x - penultimate.x) as f64);
    let spread = config.arrowhead_angle_deg.to_radians();

    let barb = |theta: f64| Segment {
        start: end,
        end: Point::new(
            (end.x as f64 - head_length * theta.cos()) as f32,
            (end.y as f64 - head_length * theta.sin()) as f32,
        ),
    };

    [barb(angle - spread), barb(angle + spread)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_angle_cardinals() {
        // North is up (negative y), east is right.
        let north = screen_angle(0.0);
        assert!((north.cos()).abs() < 1e-12);
        assert!((north.sin() + 1.0).abs() < 1e-12);

        let east = screen_angle(90.0);
        assert!((east.cos() - 1.0).abs() < 1e-12);
        assert!(east.sin().abs() < 1e-12);
    }

    #[test]
    fn test_segment_length_caps() {
        let config = OverlayConfig::default();
        assert!((segment_length(0.05, &config) - 6.0).abs() < 1e-9);
        assert!((segment_length(0.2, &config) - 24.0).abs() < 1e-9);
        assert!((segment_length(3.0, &config) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_stub_has_segments_plus_one_points() {
        let config = OverlayConfig::default();
        let glyph = streamline_stub(0.0, 0.0, &CurrentSample::new(0.0, 0.0, 0.5, 180.0), &config);
        assert_eq!(glyph.points.len(), 9);
        // Southward flow moves down the screen.
        assert!(glyph.tip().y > glyph.anchor().y);
        assert!((glyph.tip().x - glyph.anchor().x).abs() < 1e-3);
    }

    #[test]
    fn test_line_and_head_minimums() {
        let config = OverlayConfig::default();
        let slow = streamline_stub(0.0, 0.0, &CurrentSample::new(0.0, 0.0, 0.1, 90.0), &config);
        assert_eq!(slow.line_width, 1.0);
        let head = slow.arrowhead[0].start.distance(&slow.arrowhead[0].end);
        assert!((head - 6.0).abs() < 1e-4);

        let fast = streamline_stub(0.0, 0.0, &CurrentSample::new(0.0, 0.0, 2.0, 90.0), &config);
        assert_eq!(fast.line_width, 6.0);
        let head = fast.arrowhead[1].start.distance(&fast.arrowhead[1].end);
        assert!((head - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_arrowhead_opens_backwards() {
        let config = OverlayConfig::default();
        let [left, right] = arrowhead(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.5, &config);
        assert_eq!(left.start, Point::new(10.0, 0.0));
        assert!(left.end.x < 10.0 && right.end.x < 10.0);
        // Symmetric about the shaft.
        assert!((left.end.y + right.end.y).abs() < 1e-4);
        assert!(left.end.y != right.end.y);
    }
}
