//! Overlay configuration.

use std::path::Path;

use current_common::SpeedPalette;
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// How the nearest sample is located for each grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStrategy {
    /// Scan every sample.
    Linear,
    /// Uniform lat/lon buckets sized to the proximity threshold.
    Buckets,
    /// Buckets once the sample count reaches `bucket_min_samples`.
    #[default]
    Auto,
}

/// Tunables for the streamline overlay. Every field has a default, so a
/// config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Pixel distance between glyph anchors.
    pub grid_spacing_px: u32,
    /// Grid points farther than this (planar degrees) from every sample stay blank.
    pub proximity_threshold_deg: f64,
    /// Samples at or below this speed are not drawn.
    pub min_visible_speed: f64,

    /// Number of segments per streamline stub.
    pub segments: u32,
    /// Base segment length in pixels, before speed scaling.
    pub segment_length_px: f64,
    pub speed_length_gain: f64,
    pub max_length_factor: f64,

    pub line_width_gain: f64,
    pub min_line_width: f64,
    pub start_alpha: f32,
    pub end_alpha: f32,

    pub arrowhead_gain: f64,
    pub min_arrowhead_px: f64,
    /// Half-angle of the arrowhead V, in degrees.
    pub arrowhead_angle_deg: f64,
    pub arrowhead_alpha: f32,
    pub arrowhead_width: f64,

    pub lookup: LookupStrategy,
    pub bucket_min_samples: usize,

    pub palette: SpeedPalette,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            grid_spacing_px: 20,
            proximity_threshold_deg: 1.0,
            min_visible_speed: 0.01,
            segments: 8,
            segment_length_px: 12.0,
            speed_length_gain: 10.0,
            max_length_factor: 2.0,
            line_width_gain: 3.0,
            min_line_width: 1.0,
            start_alpha: 0.8,
            end_alpha: 0.3,
            arrowhead_gain: 8.0,
            min_arrowhead_px: 6.0,
            arrowhead_angle_deg: 30.0,
            arrowhead_alpha: 0.9,
            arrowhead_width: 2.0,
            lookup: LookupStrategy::Auto,
            bucket_min_samples: 256,
            palette: SpeedPalette::default(),
        }
    }
}

impl OverlayConfig {
    pub fn from_yaml(yaml: &str) -> OverlayResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| OverlayError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> OverlayResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OverlayError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_file(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if self.grid_spacing_px == 0 {
            return Err(OverlayError::InvalidConfig(
                "grid_spacing_px must be at least 1".to_string(),
            ));
        }
        if self.segments == 0 {
            return Err(OverlayError::InvalidConfig(
                "segments must be at least 1".to_string(),
            ));
        }
        if !(self.proximity_threshold_deg > 0.0) || !self.proximity_threshold_deg.is_finite() {
            return Err(OverlayError::InvalidConfig(format!(
                "proximity_threshold_deg must be positive and finite, got {}",
                self.proximity_threshold_deg
            )));
        }
        if !(self.min_visible_speed >= 0.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "min_visible_speed must be non-negative, got {}",
                self.min_visible_speed
            )));
        }
        self.palette.validate()?;
        Ok(())
    }

    /// Whether a field of `sample_count` samples should use bucketed lookup.
    pub fn use_buckets(&self, sample_count: usize) -> bool {
        match self.lookup {
            LookupStrategy::Linear => false,
            LookupStrategy::Buckets => true,
            LookupStrategy::Auto => sample_count >= self.bucket_min_samples,
        }
    }
}
