//! Session configuration loading.
//!
//! A session file describes the overlay tunables, the starting viewport and
//! a list of view changes to replay:
//!
//! ```yaml
//! opacity: 0.8
//! overlay:
//!   grid_spacing_px: 24
//! viewport:
//!   projection: equirectangular
//!   width: 800
//!   height: 600
//!   bounds: "68,4,80,16"
//! steps:
//!   - pan: { dx: 120, dy: 0 }
//!   - zoom: 2.0
//!   - resize: { width: 400, height: 300 }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use current_common::{GeoBounds, GeoPoint};
use renderer::{GeoViewport, OverlayConfig, PixelSize, Projection};
use serde::Deserialize;
use tracing::{debug, info};

/// Root configuration loaded from a session YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub overlay: OverlayConfig,
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_opacity() -> f32 {
    1.0
}

/// Starting view. Either `bounds` or `center` + `degrees_per_pixel`.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default)]
    pub projection: Projection,
    pub width: u32,
    pub height: u32,
    /// "west,south,east,north"
    #[serde(default)]
    pub bounds: Option<String>,
    #[serde(default)]
    pub center: Option<GeoPoint>,
    #[serde(default)]
    pub degrees_per_pixel: Option<f64>,
}

impl ViewportConfig {
    pub fn build(&self) -> Result<GeoViewport> {
        let size = PixelSize::new(self.width, self.height);

        if let Some(bounds) = &self.bounds {
            let bounds = GeoBounds::from_csv(bounds)
                .with_context(|| format!("Invalid viewport bounds '{}'", bounds))?;
            if !(bounds.width() > 0.0) || !(bounds.height() > 0.0) {
                bail!("Viewport bounds must have positive width and height");
            }
            return Ok(GeoViewport::fit_bounds(self.projection, &bounds, size));
        }

        match (self.center, self.degrees_per_pixel) {
            (Some(center), Some(dpp)) if dpp > 0.0 && dpp.is_finite() => {
                Ok(GeoViewport::new(self.projection, center, dpp, size))
            }
            (Some(_), Some(dpp)) => bail!("degrees_per_pixel must be positive, got {}", dpp),
            _ => bail!("Viewport needs either 'bounds' or both 'center' and 'degrees_per_pixel'"),
        }
    }
}

/// One view change applied between frames.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Pixel offset of the new view centre.
    Pan { dx: f64, dy: f64 },
    /// Scale factor; above 1 zooms in.
    Zoom(f64),
    Resize { width: u32, height: u32 },
    Center { lat: f64, lon: f64 },
}

impl Step {
    pub fn apply(&self, viewport: &mut GeoViewport) {
        match *self {
            Step::Pan { dx, dy } => viewport.pan_by(dx, dy),
            Step::Zoom(factor) => viewport.zoom_by(factor),
            Step::Resize { width, height } => viewport.resize(PixelSize::new(width, height)),
            Step::Center { lat, lon } => viewport.set_center(GeoPoint::new(lat, lon)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Pan { .. } => "pan",
            Step::Zoom(_) => "zoom",
            Step::Resize { .. } => "resize",
            Step::Center { .. } => "center",
        }
    }
}

impl SessionConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse session YAML")?;
        config.overlay.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session config {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid session config {:?}", path))?;

        info!(
            path = %path.display(),
            steps = config.steps.len(),
            width = config.viewport.width,
            height = config.viewport.height,
            "Loaded session config"
        );
        debug!(overlay = ?config.overlay, "Overlay settings");

        Ok(config)
    }
}
