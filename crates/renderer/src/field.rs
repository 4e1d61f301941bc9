//! Nearest-sample lookup over an unordered set of current samples.
//!
//! Distances are planar in (lat, lon) degrees. A grid point only matches a
//! sample that is strictly closer than the proximity threshold; among equally
//! close samples the one earliest in input order wins.

use std::collections::HashMap;

use current_common::{CurrentSample, GeoPoint};

use crate::config::OverlayConfig;

/// The sample matched to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMatch {
    /// Index into the field's sample slice.
    pub index: usize,
    /// Planar distance in degrees.
    pub distance: f64,
}

/// Current samples plus the structure used to search them.
#[derive(Debug, Clone)]
pub struct CurrentField {
    samples: Vec<CurrentSample>,
    threshold: f64,
    buckets: Option<BucketIndex>,
}

impl CurrentField {
    /// Build a field using the lookup strategy selected by `config`.
    pub fn new(samples: Vec<CurrentSample>, config: &OverlayConfig) -> Self {
        if config.use_buckets(samples.len()) {
            Self::bucketed(samples, config.proximity_threshold_deg)
        } else {
            Self::linear(samples, config.proximity_threshold_deg)
        }
    }

    /// Brute-force scan of every sample per query.
    pub fn linear(samples: Vec<CurrentSample>, threshold: f64) -> Self {
        Self {
            samples,
            threshold,
            buckets: None,
        }
    }

    /// Uniform lat/lon buckets with cell size equal to `threshold`.
    pub fn bucketed(samples: Vec<CurrentSample>, threshold: f64) -> Self {
        let buckets = BucketIndex::build(&samples, threshold);
        Self {
            samples,
            threshold,
            buckets: Some(buckets),
        }
    }

    pub fn samples(&self) -> &[CurrentSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_bucketed(&self) -> bool {
        self.buckets.is_some()
    }

    pub fn sample(&self, m: &FieldMatch) -> &CurrentSample {
        &self.samples[m.index]
    }

    /// Nearest sample strictly within the proximity threshold.
    pub fn nearest(&self, point: GeoPoint) -> Option<FieldMatch> {
        if !point.is_finite() {
            return None;
        }

        let (index, distance_sq) = match &self.buckets {
            Some(buckets) => buckets.nearest(&self.samples, &point)?,
            None => nearest_linear(&self.samples, &point)?,
        };

        let distance = distance_sq.sqrt();
        if distance < self.threshold {
            Some(FieldMatch { index, distance })
        } else {
            None
        }
    }
}

/// Returns (index, squared distance) of the first strictly-closest usable sample.
fn nearest_linear(samples: &[CurrentSample], point: &GeoPoint) -> Option<(usize, f64)> {
    let mut best = None;
    let mut min_distance_sq = f64::INFINITY;

    for (i, sample) in samples.iter().enumerate() {
        if !sample.is_finite() {
            continue;
        }
        let d = sample.position().planar_distance_sq(point);
        if d < min_distance_sq {
            min_distance_sq = d;
            best = Some(i);
        }
    }

    best.map(|i| (i, min_distance_sq))
}

/// Samples bucketed into square cells of side `cell` degrees.
///
/// Any sample outside the 3x3 block of cells around a query point is at
/// least one cell away, so it can never be within the threshold.
#[derive(Debug, Clone)]
struct BucketIndex {
    cell: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl BucketIndex {
    fn build(samples: &[CurrentSample], cell: f64) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, sample) in samples.iter().enumerate() {
            if !sample.is_finite() {
                continue;
            }
            cells
                .entry(cell_key(&sample.position(), cell))
                .or_default()
                .push(i);
        }

        tracing::debug!(
            samples = samples.len(),
            buckets = cells.len(),
            cell_deg = cell,
            "Built current sample buckets"
        );

        Self { cell, cells }
    }

    fn nearest(&self, samples: &[CurrentSample], point: &GeoPoint) -> Option<(usize, f64)> {
        let (row, col) = cell_key(point, self.cell);
        let mut best: Option<(usize, f64)> = None;

        for dr in -1..=1 {
            for dc in -1..=1 {
                let key = (row.saturating_add(dr), col.saturating_add(dc));
                let Some(indices) = self.cells.get(&key) else {
                    continue;
                };
                for &i in indices {
                    let d = samples[i].position().planar_distance_sq(point);
                    let better = match best {
                        None => true,
                        Some((bi, bd)) => d < bd || (d == bd && i < bi),
                    };
                    if better {
                        best = Some((i, d));
                    }
                }
            }
        }

        best
    }
}

fn cell_key(point: &GeoPoint, cell: f64) -> (i64, i64) {
    (
        (point.lat / cell).floor() as i64,
        (point.lon / cell).floor() as i64,
    )
}
