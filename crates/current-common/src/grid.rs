//! Regular lat/lon velocity grids and their decimation into samples.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SampleError, SampleResult};
use crate::sample::CurrentSample;

/// Eastward/northward velocity rasters on a regular lat/lon grid.
///
/// Values are stored row-major with one row per latitude, matching the
/// `(lat, lon)` dimension order of gridded current products. Masked cells
/// (land) are NaN.
#[derive(Debug, Clone)]
pub struct CurrentGrid {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub u: Vec<f32>,
    pub v: Vec<f32>,
}

impl CurrentGrid {
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, u: Vec<f32>, v: Vec<f32>) -> SampleResult<Self> {
        let expected = lats.len() * lons.len();
        for actual in [u.len(), v.len()] {
            if actual != expected {
                return Err(SampleError::GridShape { expected, actual });
            }
        }
        Ok(Self { lats, lons, u, v })
    }

    /// Parse a grid from JSON of the form
    /// `{"lats": [...], "lons": [...], "u": [...], "v": [...]}`.
    ///
    /// JSON has no NaN, so masked cells are written as `null`.
    pub fn from_json(json: &str) -> SampleResult<Self> {
        #[derive(Deserialize)]
        struct GridRecord {
            lats: Vec<f64>,
            lons: Vec<f64>,
            u: Vec<Option<f32>>,
            v: Vec<Option<f32>>,
        }

        let record: GridRecord = serde_json::from_str(json)?;
        let unmask = |values: Vec<Option<f32>>| -> Vec<f32> {
            values.into_iter().map(|x| x.unwrap_or(f32::NAN)).collect()
        };
        Self::new(record.lats, record.lons, unmask(record.u), unmask(record.v))
    }

    pub fn load_json(path: impl AsRef<Path>) -> SampleResult<Self> {
        let path = path.as_ref();
        let grid = Self::from_json(&std::fs::read_to_string(path)?)?;

        tracing::debug!(
            path = %path.display(),
            width = grid.width(),
            height = grid.height(),
            "Loaded current grid"
        );

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.lons.len()
    }

    pub fn height(&self) -> usize {
        self.lats.len()
    }

    /// Take every `sample_factor`-th row and column and convert the
    /// surviving cells into samples.
    ///
    /// Masked cells and coordinates outside [-90, 90] x [-180, 180] are
    /// dropped.
    pub fn decimate(&self, sample_factor: usize) -> SampleResult<Vec<CurrentSample>> {
        if sample_factor == 0 {
            return Err(SampleError::ZeroSampleFactor);
        }

        let width = self.width();
        let mut samples = Vec::new();
        let mut masked = 0usize;
        let mut out_of_range = 0usize;

        for (i, &lat) in self.lats.iter().enumerate().step_by(sample_factor) {
            for (j, &lon) in self.lons.iter().enumerate().step_by(sample_factor) {
                let idx = i * width + j;
                let u = self.u[idx];
                let v = self.v[idx];

                if u.is_nan() || v.is_nan() {
                    masked += 1;
                    continue;
                }

                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    out_of_range += 1;
                    continue;
                }

                samples.push(CurrentSample::from_uv(lat, lon, u as f64, v as f64));
            }
        }

        tracing::debug!(
            grid_width = width,
            grid_height = self.height(),
            sample_factor,
            produced = samples.len(),
            masked,
            out_of_range,
            "Decimated current grid"
        );

        Ok(samples)
    }
}
