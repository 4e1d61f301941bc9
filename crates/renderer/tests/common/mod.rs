//! Shared test doubles for renderer integration tests.
//!
//! `RecordingViewport` is a minimal map host with a north-west anchored
//! equirectangular projection. Its surfaces log every call so tests can
//! inspect exactly what a redraw painted.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use current_common::GeoPoint;
use renderer::{
    DrawingSurface, GlyphPath, MapViewport, OverlayError, OverlayResult, PixelSize, SharedSurface,
    SubscriptionId, SurfaceId, ViewChangeCallback, ViewportProjection,
};

// ============================================================================
// Recording surface
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Resize(PixelSize),
    Opacity(f32),
    Clear,
    Glyph(GlyphPath),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub size: PixelSize,
    pub ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    /// Glyphs painted since the most recent clear.
    pub fn visible_glyphs(&self) -> Vec<GlyphPath> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == SurfaceOp::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Glyph(g) => Some(g.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == SurfaceOp::Clear).count()
    }

    pub fn opacity(&self) -> Option<f32> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::Opacity(o) => Some(*o),
            _ => None,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn resize(&mut self, size: PixelSize) {
        self.size = size;
        self.ops.push(SurfaceOp::Resize(size));
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.ops.push(SurfaceOp::Opacity(opacity));
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn draw_glyph(&mut self, glyph: &GlyphPath) {
        self.ops.push(SurfaceOp::Glyph(glyph.clone()));
    }
}

// ============================================================================
// Recording viewport
// ============================================================================

pub struct RecordingViewport {
    pub size: PixelSize,
    /// Geographic position of pixel (0, 0).
    pub north_west: GeoPoint,
    pub degrees_per_pixel: f64,
    /// When set, `attach_surface` fails.
    pub refuse_surfaces: bool,
    surfaces: Vec<(SurfaceId, Rc<RefCell<RecordingSurface>>)>,
    listeners: Vec<(SubscriptionId, ViewChangeCallback)>,
    next_id: u64,
}

impl RecordingViewport {
    pub fn new(width: u32, height: u32, north_west: GeoPoint, degrees_per_pixel: f64) -> Self {
        Self {
            size: PixelSize::new(width, height),
            north_west,
            degrees_per_pixel,
            refuse_surfaces: false,
            surfaces: Vec::new(),
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The most recently attached surface.
    pub fn surface(&self) -> Rc<RefCell<RecordingSurface>> {
        match self.surfaces.last() {
            Some((_, s)) => Rc::clone(s),
            None => panic!("no surface attached"),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = PixelSize::new(width, height);
        self.fire();
    }

    pub fn pan_to(&mut self, north_west: GeoPoint) {
        self.north_west = north_west;
        self.fire();
    }

    /// Announce a view change without changing anything.
    pub fn fire(&mut self) {
        let mut listeners = std::mem::take(&mut self.listeners);
        {
            let view: &dyn ViewportProjection = &*self;
            for (_, callback) in listeners.iter_mut() {
                callback(view);
            }
        }
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }
}

impl ViewportProjection for RecordingViewport {
    fn pixel_size(&self) -> PixelSize {
        self.size
    }

    fn pixel_to_geo(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint::new(
            self.north_west.lat - y * self.degrees_per_pixel,
            self.north_west.lon + x * self.degrees_per_pixel,
        )
    }
}

impl MapViewport for RecordingViewport {
    fn attach_surface(&mut self) -> OverlayResult<(SurfaceId, SharedSurface)> {
        if self.refuse_surfaces {
            return Err(OverlayError::SurfaceUnavailable(
                "overlay pane is not ready".to_string(),
            ));
        }
        self.next_id += 1;
        let id = SurfaceId(self.next_id);
        let surface = Rc::new(RefCell::new(RecordingSurface {
            size: self.size,
            ops: Vec::new(),
        }));
        self.surfaces.push((id, Rc::clone(&surface)));
        let shared: SharedSurface = surface;
        Ok((id, shared))
    }

    fn remove_surface(&mut self, id: SurfaceId) {
        self.surfaces.retain(|(sid, _)| *sid != id);
    }

    fn on_view_change(&mut self, callback: ViewChangeCallback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, callback));
        id
    }

    fn off_view_change(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }
}

/// A 1x1 viewport whose only grid point sits at `(lat, lon)`.
pub fn single_point_viewport(lat: f64, lon: f64) -> Rc<RefCell<RecordingViewport>> {
    RecordingViewport::new(1, 1, GeoPoint::new(lat, lon), 0.01).shared()
}
