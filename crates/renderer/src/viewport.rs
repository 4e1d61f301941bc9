//! Map viewport capability and a self-contained geographic implementation.
//!
//! The overlay never talks to a mapping library directly. Anything that can
//! report its pixel size, convert pixels to lat/lon, host drawing surfaces and
//! announce view changes can carry a `VectorFieldOverlay`.

use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use current_common::{GeoBounds, GeoPoint};
use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::error::{OverlayError, OverlayResult};
use crate::raster::PixmapSurface;
use crate::surface::{PixelSize, SharedSurface, SurfaceId};

/// The read-only view state a redraw needs.
pub trait ViewportProjection {
    fn pixel_size(&self) -> PixelSize;

    /// Geographic coordinate under container pixel `(x, y)`.
    fn pixel_to_geo(&self, x: f64, y: f64) -> GeoPoint;
}

/// Invoked after every pan, zoom or resize with the updated view.
pub type ViewChangeCallback = Box<dyn FnMut(&dyn ViewportProjection)>;

/// Handle returned by `on_view_change`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A map that can host overlay surfaces.
pub trait MapViewport: ViewportProjection {
    /// Create a surface in the overlay pane covering the viewport.
    fn attach_surface(&mut self) -> OverlayResult<(SurfaceId, SharedSurface)>;

    /// Remove a surface from the overlay pane. Unknown ids are ignored.
    fn remove_surface(&mut self, id: SurfaceId);

    fn on_view_change(&mut self, callback: ViewChangeCallback) -> SubscriptionId;

    /// Unknown ids are ignored.
    fn off_view_change(&mut self, id: SubscriptionId);
}

/// Map projection used by `GeoViewport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Plate carrée: pixels map linearly to degrees on both axes.
    #[default]
    Equirectangular,
    /// Spherical web mercator, as used by slippy-map tile servers.
    WebMercator,
}

/// Web mercator latitude limit.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// A viewport centred on a geographic point at a fixed scale.
///
/// `degrees_per_pixel` is the longitude span of one pixel; for the
/// equirectangular projection it applies to latitude too.
pub struct GeoViewport {
    projection: Projection,
    center: GeoPoint,
    degrees_per_pixel: f64,
    size: PixelSize,
    surfaces: Vec<(SurfaceId, Rc<RefCell<PixmapSurface>>)>,
    listeners: Vec<(SubscriptionId, ViewChangeCallback)>,
    surface_limit: Option<usize>,
    next_id: u64,
}

impl GeoViewport {
    pub fn new(
        projection: Projection,
        center: GeoPoint,
        degrees_per_pixel: f64,
        size: PixelSize,
    ) -> Self {
        Self {
            projection,
            center,
            degrees_per_pixel,
            size,
            surfaces: Vec::new(),
            listeners: Vec::new(),
            surface_limit: None,
            next_id: 1,
        }
    }

    /// Viewport sized and scaled to show `bounds` horizontally.
    pub fn fit_bounds(projection: Projection, bounds: &GeoBounds, size: PixelSize) -> Self {
        let degrees_per_pixel = bounds.width() / size.width.max(1) as f64;
        Self::new(projection, bounds.center(), degrees_per_pixel, size)
    }

    /// Cap the number of surfaces the overlay pane accepts.
    pub fn with_surface_limit(mut self, limit: usize) -> Self {
        self.surface_limit = Some(limit);
        self
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn degrees_per_pixel(&self) -> f64 {
        self.degrees_per_pixel
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Geographic extent of the current view.
    pub fn bounds(&self) -> GeoBounds {
        let nw = self.pixel_to_geo(0.0, 0.0);
        let se = self.pixel_to_geo(self.size.width as f64, self.size.height as f64);
        GeoBounds::new(nw.lon, se.lat, se.lon, nw.lat)
    }

    /// Container pixel of a geographic coordinate.
    pub fn geo_to_pixel(&self, point: GeoPoint) -> (f64, f64) {
        let (half_w, half_h) = self.half_size();
        match self.projection {
            Projection::Equirectangular => (
                half_w + (point.lon - self.center.lon) / self.degrees_per_pixel,
                half_h - (point.lat - self.center.lat) / self.degrees_per_pixel,
            ),
            Projection::WebMercator => {
                let (cx, cy) = self.mercator_world(self.center);
                let (px, py) = self.mercator_world(point);
                (half_w + px - cx, half_h + py - cy)
            }
        }
    }

    /// Move the view by a pixel offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (half_w, half_h) = self.half_size();
        self.center = self.pixel_to_geo(half_w + dx, half_h + dy);
        self.notify("pan");
    }

    pub fn set_center(&mut self, center: GeoPoint) {
        self.center = center;
        self.notify("pan");
    }

    /// Zoom around the centre; `factor > 1` zooms in.
    pub fn zoom_by(&mut self, factor: f64) {
        if factor > 0.0 && factor.is_finite() {
            self.degrees_per_pixel /= factor;
        }
        self.notify("zoom");
    }

    pub fn resize(&mut self, size: PixelSize) {
        self.size = size;
        self.notify("resize");
    }

    /// Composite the overlay pane into one premultiplied pixmap, applying
    /// each surface's opacity. `None` when the viewport has no area.
    pub fn compose(&self) -> Option<Pixmap> {
        let mut target = Pixmap::new(self.size.width, self.size.height)?;

        for (_, surface) in &self.surfaces {
            let surface = surface.borrow();
            if let Some(pixmap) = surface.pixmap() {
                let paint = PixmapPaint {
                    opacity: surface.opacity(),
                    blend_mode: BlendMode::SourceOver,
                    quality: FilterQuality::Nearest,
                };
                target.draw_pixmap(0, 0, pixmap.as_ref(), &paint, Transform::identity(), None);
            }
        }

        Some(target)
    }

    fn half_size(&self) -> (f64, f64) {
        (self.size.width as f64 / 2.0, self.size.height as f64 / 2.0)
    }

    fn world_size(&self) -> f64 {
        360.0 / self.degrees_per_pixel
    }

    fn mercator_world(&self, point: GeoPoint) -> (f64, f64) {
        let world = self.world_size();
        let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let x = (point.lon + 180.0) / 360.0 * world;
        let y = (1.0 - lat.tan().asinh() / PI) / 2.0 * world;
        (x, y)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn notify(&mut self, reason: &'static str) {
        tracing::trace!(
            reason,
            width = self.size.width,
            height = self.size.height,
            center_lat = self.center.lat,
            center_lon = self.center.lon,
            listeners = self.listeners.len(),
            "View changed"
        );

        // Listeners get `&self`, so they are moved out for the duration of
        // the dispatch. Any registered during it are kept.
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, callback) in listeners.iter_mut() {
            callback(&*self);
        }
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }
}

impl ViewportProjection for GeoViewport {
    fn pixel_size(&self) -> PixelSize {
        self.size
    }

    fn pixel_to_geo(&self, x: f64, y: f64) -> GeoPoint {
        let (half_w, half_h) = self.half_size();
        match self.projection {
            Projection::Equirectangular => GeoPoint::new(
                self.center.lat - (y - half_h) * self.degrees_per_pixel,
                self.center.lon + (x - half_w) * self.degrees_per_pixel,
            ),
            Projection::WebMercator => {
                let world = self.world_size();
                let (cx, cy) = self.mercator_world(self.center);
                let wx = cx + (x - half_w);
                let wy = cy + (y - half_h);
                let lon = wx / world * 360.0 - 180.0;
                let lat = (PI * (1.0 - 2.0 * wy / world)).sinh().atan().to_degrees();
                GeoPoint::new(lat, lon)
            }
        }
    }
}

impl MapViewport for GeoViewport {
    fn attach_surface(&mut self) -> OverlayResult<(SurfaceId, SharedSurface)> {
        if let Some(limit) = self.surface_limit {
            if self.surfaces.len() >= limit {
                return Err(OverlayError::SurfaceUnavailable(format!(
                    "overlay pane is full ({} surfaces)",
                    limit
                )));
            }
        }

        let id = SurfaceId(self.next_id());
        let surface = Rc::new(RefCell::new(PixmapSurface::new(self.size)));
        self.surfaces.push((id, Rc::clone(&surface)));

        let shared: SharedSurface = surface;
        Ok((id, shared))
    }

    fn remove_surface(&mut self, id: SurfaceId) {
        self.surfaces.retain(|(sid, _)| *sid != id);
    }

    fn on_view_change(&mut self, callback: ViewChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id());
        self.listeners.push((id, callback));
        id
    }

    fn off_view_change(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_equirectangular_pixel_to_geo() {
        let vp = GeoViewport::new(
            Projection::Equirectangular,
            GeoPoint::new(10.0, 75.0),
            0.01,
            PixelSize::new(800, 600),
        );
        let centre = vp.pixel_to_geo(400.0, 300.0);
        assert_close(centre.lat, 10.0);
        assert_close(centre.lon, 75.0);

        let nw = vp.pixel_to_geo(0.0, 0.0);
        assert_close(nw.lat, 13.0);
        assert_close(nw.lon, 71.0);
    }

    #[test]
    fn test_mercator_round_trip() {
        let vp = GeoViewport::new(
            Projection::WebMercator,
            GeoPoint::new(40.0, -30.0),
            0.05,
            PixelSize::new(512, 512),
        );
        let geo = vp.pixel_to_geo(100.0, 400.0);
        let (x, y) = vp.geo_to_pixel(geo);
        assert!((x - 100.0).abs() < 1e-6);
        assert!((y - 400.0).abs() < 1e-6);

        // Mercator stretches latitude: the upper half of the view spans fewer degrees.
        let top = vp.pixel_to_geo(256.0, 0.0).lat - 40.0;
        let bottom = 40.0 - vp.pixel_to_geo(256.0, 512.0).lat;
        assert!(top < bottom);
    }

    #[test]
    fn test_pan_moves_center() {
        let mut vp = GeoViewport::new(
            Projection::Equirectangular,
            GeoPoint::new(0.0, 0.0),
            0.1,
            PixelSize::new(100, 100),
        );
        vp.pan_by(10.0, -20.0);
        assert_close(vp.center().lon, 1.0);
        assert_close(vp.center().lat, 2.0);
    }

    #[test]
    fn test_listeners_fire_once_per_change() {
        let mut vp = GeoViewport::new(
            Projection::Equirectangular,
            GeoPoint::new(0.0, 0.0),
            0.1,
            PixelSize::new(100, 100),
        );
        let hits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&hits);
        let id = vp.on_view_change(Box::new(move |view: &dyn ViewportProjection| {
            sink.borrow_mut().push(view.pixel_size());
        }));

        vp.resize(PixelSize::new(50, 40));
        vp.zoom_by(2.0);
        vp.off_view_change(id);
        vp.pan_by(1.0, 1.0);

        assert_eq!(
            *hits.borrow(),
            vec![PixelSize::new(50, 40), PixelSize::new(50, 40)]
        );
        assert_eq!(vp.listener_count(), 0);
    }

    #[test]
    fn test_surface_limit() {
        let mut vp = GeoViewport::new(
            Projection::Equirectangular,
            GeoPoint::new(0.0, 0.0),
            0.1,
            PixelSize::new(10, 10),
        )
        .with_surface_limit(1);

        let (id, _) = vp.attach_surface().unwrap();
        assert!(matches!(
            vp.attach_surface(),
            Err(OverlayError::SurfaceUnavailable(_))
        ));
        vp.remove_surface(id);
        assert!(vp.attach_surface().is_ok());
    }
}
