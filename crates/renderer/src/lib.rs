//! Streamline overlay rendering for ocean current data.
//!
//! - Nearest-sample field lookup (linear scan or bucketed)
//! - Streamline stub and arrowhead geometry
//! - Drawing surface and map viewport abstractions
//! - A tiny-skia raster surface and geographic viewport
//! - The `VectorFieldOverlay` that keeps glyphs in sync with the viewport

pub mod config;
pub mod error;
pub mod field;
pub mod glyph;
pub mod overlay;
pub mod png;
pub mod raster;
pub mod surface;
pub mod viewport;

pub use config::{LookupStrategy, OverlayConfig};
pub use error::{OverlayError, OverlayResult};
pub use field::{CurrentField, FieldMatch};
pub use glyph::{GlyphPath, Point, Segment};
pub use overlay::{FrameStats, VectorFieldOverlay};
pub use raster::PixmapSurface;
pub use surface::{DrawingSurface, PixelSize, SharedSurface, SurfaceId};
pub use viewport::{
    GeoViewport, MapViewport, Projection, SubscriptionId, ViewChangeCallback, ViewportProjection,
};
