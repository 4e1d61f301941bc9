//! Speed-banded colour palettes for current glyphs.
//!
//! Palettes are normally embedded in the overlay configuration file but can
//! also be loaded on their own from YAML or JSON:
//!
//! ```yaml
//! reference_max_speed: 1.0
//! bands:
//!   - { below: 0.3, color: "#90EE90" }
//!   - { below: 0.6, color: "#32CD32" }
//!   - { below: 0.8, color: "#9ACD32" }
//!   - { color: "#FFFF00" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// An RGB colour with a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Alpha scaled to a byte, for raster backends.
    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// A `#RRGGBB` colour, stored parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub [u8; 3]);

impl TryFrom<String> for HexColor {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        hex_to_rgb(&value)
            .map(|(r, g, b)| HexColor([r, g, b]))
            .ok_or(StyleError::InvalidColor(value))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        let [r, g, b] = color.0;
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// One colour band; applies while the normalized speed is below `below`.
/// A band without an upper bound catches everything above the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
    pub color: HexColor,
}

impl SpeedBand {
    pub fn new(below: Option<f64>, rgb: [u8; 3]) -> Self {
        Self {
            below,
            color: HexColor(rgb),
        }
    }
}

/// Maps a current speed to a band colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedPalette {
    /// Speed that normalizes to 1.0. Faster currents use the top band.
    #[serde(default = "default_reference_max_speed")]
    pub reference_max_speed: f64,
    pub bands: Vec<SpeedBand>,
}

fn default_reference_max_speed() -> f64 {
    1.0
}

impl Default for SpeedPalette {
    /// Green-to-yellow ramp: slow currents are light green, fast ones yellow.
    fn default() -> Self {
        Self {
            reference_max_speed: 1.0,
            bands: vec![
                SpeedBand::new(Some(0.3), [144, 238, 144]),
                SpeedBand::new(Some(0.6), [50, 205, 50]),
                SpeedBand::new(Some(0.8), [154, 205, 50]),
                SpeedBand::new(None, [255, 255, 0]),
            ],
        }
    }
}

impl SpeedPalette {
    pub fn from_yaml(yaml: &str) -> Result<Self, StyleError> {
        let palette: Self =
            serde_yaml::from_str(yaml).map_err(|e| StyleError::ParseError(e.to_string()))?;
        palette.validate()?;
        Ok(palette)
    }

    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let palette: Self =
            serde_json::from_str(json).map_err(|e| StyleError::ParseError(e.to_string()))?;
        palette.validate()?;
        Ok(palette)
    }

    /// Load a palette from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StyleError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| StyleError::IoError(e.to_string()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        if !(self.reference_max_speed > 0.0) {
            return Err(StyleError::ValidationError(format!(
                "reference_max_speed must be positive, got {}",
                self.reference_max_speed
            )));
        }
        if self.bands.is_empty() {
            return Err(StyleError::ValidationError(
                "palette needs at least one band".to_string(),
            ));
        }

        let mut previous = f64::NEG_INFINITY;
        for (i, band) in self.bands.iter().enumerate() {
            match band.below {
                Some(below) if below <= previous => {
                    return Err(StyleError::ValidationError(format!(
                        "band {} upper bound {} is not above the previous band",
                        i, below
                    )));
                }
                Some(below) => previous = below,
                None if i + 1 != self.bands.len() => {
                    return Err(StyleError::ValidationError(format!(
                        "unbounded band {} must be last",
                        i
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Speed divided by the reference maximum, capped at 1.
    pub fn normalize(&self, speed: f64) -> f64 {
        (speed / self.reference_max_speed).min(1.0)
    }

    /// Colour of the band this speed falls into, with the given alpha.
    pub fn band_color(&self, speed: f64, alpha: f32) -> Rgba {
        let normalized = self.normalize(speed);

        let band = self
            .bands
            .iter()
            .find(|band| band.below.map_or(true, |below| normalized < below))
            .or_else(|| self.bands.last());

        match band {
            Some(band) => {
                let [r, g, b] = band.color.0;
                Rgba::new(r, g, b, alpha)
            }
            None => Rgba::new(0, 0, 0, alpha),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
