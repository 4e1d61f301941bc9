//! Common test fixtures and constants.

use std::io::Write;

use current_common::CurrentSample;
use tempfile::NamedTempFile;

/// Viewport constants for an equirectangular view over the Arabian Sea.
pub mod viewport {
    /// Map centre latitude.
    pub const CENTER_LAT: f64 = 10.0;
    /// Map centre longitude.
    pub const CENTER_LON: f64 = 75.0;
    /// Degrees per pixel; 800x600 pixels covers 8 x 6 degrees.
    pub const DEGREES_PER_PIXEL: f64 = 0.01;
    /// Default surface width in pixels.
    pub const WIDTH: u32 = 800;
    /// Default surface height in pixels.
    pub const HEIGHT: u32 = 600;
}

/// A single medium-speed eastward current at the origin.
///
/// With the default configuration it draws a 192px stub pointing east in
/// the second colour band.
pub fn eastward_sample() -> CurrentSample {
    CurrentSample::new(0.0, 0.0, 0.5, 90.0)
}

/// Two samples exactly equidistant from the origin.
///
/// The nearest-sample rule must pick the first one.
pub fn equidistant_pair() -> Vec<CurrentSample> {
    vec![
        CurrentSample::new(0.5, 0.0, 0.5, 0.0),
        CurrentSample::new(-0.5, 0.0, 0.9, 180.0),
    ]
}

/// Processed current records in the on-disk JSON layout.
///
/// The first two carry derived speed/direction, the third only u/v.
pub const SAMPLE_JSON: &str = r#"[
  {"lat": 10.0, "lon": 75.0, "speed": 0.42, "direction": 135.0, "u": 0.297, "v": -0.297},
  {"lat": 10.5, "lon": 75.5, "speed": 0.05, "direction": 270.0},
  {"lat": 11.0, "lon": 76.0, "u": 0.0, "v": 0.8}
]"#;

/// Write `contents` to a temporary `.json` file that lives as long as the
/// returned handle.
pub fn temp_json_file(contents: &str) -> NamedTempFile {
    let mut file = match tempfile::Builder::new().suffix(".json").tempfile() {
        Ok(file) => file,
        Err(e) => panic!("failed to create temp file: {}", e),
    };
    if let Err(e) = file.write_all(contents.as_bytes()) {
        panic!("failed to write temp file: {}", e);
    }
    file
}

/// Serialize `samples` into a temporary JSON file.
pub fn temp_samples_file(samples: &[CurrentSample]) -> NamedTempFile {
    match serde_json::to_string(samples) {
        Ok(json) => temp_json_file(&json),
        Err(e) => panic!("failed to serialize samples: {}", e),
    }
}
