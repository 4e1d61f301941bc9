//! Ocean current samples and sample-file loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SampleError, SampleResult};
use crate::geo::GeoPoint;

/// One current vector at a point.
///
/// `direction` is the compass bearing the water flows toward, in degrees
/// clockwise from north. `speed` is unitless and expected to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentSample {
    pub lat: f64,
    pub lon: f64,
    pub speed: f64,
    pub direction: f64,
}

impl CurrentSample {
    pub fn new(lat: f64, lon: f64, speed: f64, direction: f64) -> Self {
        Self {
            lat,
            lon,
            speed,
            direction,
        }
    }

    /// Build a sample from eastward (`u`) and northward (`v`) velocity components.
    pub fn from_uv(lat: f64, lon: f64, u: f64, v: f64) -> Self {
        let (speed, direction) = uv_to_speed_bearing(u, v);
        Self::new(lat, lon, speed, direction)
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// True when every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.speed.is_finite()
            && self.direction.is_finite()
    }
}

/// Convert u/v components to (speed, bearing in degrees toward which the flow points).
///
/// The bearing is normalized to [0, 360): pure northward flow is 0, pure
/// eastward flow is 90.
pub fn uv_to_speed_bearing(u: f64, v: f64) -> (f64, f64) {
    let speed = u.hypot(v);

    let mut bearing = u.atan2(v).to_degrees();
    if bearing < 0.0 {
        bearing += 360.0;
    }
    if bearing >= 360.0 {
        bearing -= 360.0;
    }

    (speed, bearing)
}

/// On-disk record shape. Processed current files carry both the derived
/// speed/direction and the raw components, plus extra keys we ignore.
#[derive(Debug, Deserialize)]
struct SampleRecord {
    lat: f64,
    lon: f64,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    direction: Option<f64>,
    #[serde(default)]
    u: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
}

impl SampleRecord {
    fn into_sample(self, index: usize) -> SampleResult<CurrentSample> {
        match (self.speed, self.direction, self.u, self.v) {
            (Some(speed), Some(direction), _, _) => {
                Ok(CurrentSample::new(self.lat, self.lon, speed, direction))
            }
            (_, _, Some(u), Some(v)) => Ok(CurrentSample::from_uv(self.lat, self.lon, u, v)),
            _ => Err(SampleError::MissingVelocity { index }),
        }
    }
}

/// Parse a JSON array of current samples.
pub fn parse_samples_json(json: &str) -> SampleResult<Vec<CurrentSample>> {
    let records: Vec<SampleRecord> = serde_json::from_str(json)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_sample(index))
        .collect()
}

/// Load a JSON array of current samples from a file.
pub fn load_samples_json(path: impl AsRef<Path>) -> SampleResult<Vec<CurrentSample>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let samples = parse_samples_json(&content)?;

    tracing::debug!(
        path = %path.display(),
        count = samples.len(),
        "Loaded current samples"
    );

    Ok(samples)
}
