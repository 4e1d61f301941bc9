//! Synthetic current fields for tests and benchmarks.
//!
//! All generators are deterministic so that rendered output can be compared
//! between runs.

use current_common::{CurrentGrid, CurrentSample};

/// Samples on a regular lat/lon lattice, all flowing the same way.
///
/// # Arguments
///
/// * `south`, `west` - Coordinates of the first sample
/// * `rows`, `cols` - Lattice dimensions
/// * `step` - Lattice spacing in degrees
/// * `speed`, `direction` - Shared current vector
///
/// # Example
///
/// ```
/// use test_utils::uniform_field;
///
/// let samples = uniform_field(0.0, 0.0, 2, 3, 0.5, 0.4, 90.0);
/// assert_eq!(samples.len(), 6);
/// assert_eq!(samples[1].lon, 0.5); // row-major, longitude varies fastest
/// ```
pub fn uniform_field(
    south: f64,
    west: f64,
    rows: usize,
    cols: usize,
    step: f64,
    speed: f64,
    direction: f64,
) -> Vec<CurrentSample> {
    let mut samples = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            samples.push(CurrentSample::new(
                south + row as f64 * step,
                west + col as f64 * step,
                speed,
                direction,
            ));
        }
    }
    samples
}

/// A clockwise gyre centred on `(center_lat, center_lon)`.
///
/// Speed grows linearly from 0 at the centre to `max_speed` at `radius`
/// degrees and the flow is tangential, so every quadrant exercises a
/// different glyph direction and colour band.
pub fn gyre_field(
    center_lat: f64,
    center_lon: f64,
    radius: f64,
    step: f64,
    max_speed: f64,
) -> Vec<CurrentSample> {
    let n = (2.0 * radius / step).round() as i64;
    let mut samples = Vec::new();

    for i in 0..=n {
        for j in 0..=n {
            let dlat = -radius + i as f64 * step;
            let dlon = -radius + j as f64 * step;
            let r = dlat.hypot(dlon);
            if r > radius {
                continue;
            }
            // Clockwise tangent of the radius vector (dlon east, dlat north).
            let (u, v) = if r == 0.0 { (0.0, 0.0) } else { (dlat / r, -dlon / r) };
            let speed = max_speed * r / radius;
            samples.push(CurrentSample::from_uv(
                center_lat + dlat,
                center_lon + dlon,
                u * speed,
                v * speed,
            ));
        }
    }
    samples
}

/// Pseudo-random samples scattered inside a box, from a fixed seed.
///
/// Uses a small linear congruential generator so the crate does not need an
/// RNG dependency; quality only has to be good enough to avoid lattice
/// artefacts.
pub fn scattered_field(
    south: f64,
    west: f64,
    north: f64,
    east: f64,
    count: usize,
    seed: u64,
) -> Vec<CurrentSample> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|_| {
            let lat = south + next() * (north - south);
            let lon = west + next() * (east - west);
            let speed = next() * 1.2;
            let direction = next() * 360.0;
            CurrentSample::new(lat, lon, speed, direction)
        })
        .collect()
}

/// A u/v grid with a masked (NaN) land block in the lower-left quarter.
///
/// Latitudes ascend from `south` and longitudes from `west` with spacing
/// `step`. Ocean cells flow north-east at unit speed per component.
pub fn masked_uv_grid(south: f64, west: f64, rows: usize, cols: usize, step: f64) -> CurrentGrid {
    let lats = (0..rows).map(|i| south + i as f64 * step).collect();
    let lons = (0..cols).map(|j| west + j as f64 * step).collect();

    let mut u = vec![1.0f32; rows * cols];
    let mut v = vec![1.0f32; rows * cols];
    for row in 0..rows / 2 {
        for col in 0..cols / 2 {
            u[row * cols + col] = f32::NAN;
            v[row * cols + col] = f32::NAN;
        }
    }

    match CurrentGrid::new(lats, lons, u, v) {
        Ok(grid) => grid,
        Err(e) => panic!("generated grid has inconsistent shape: {}", e),
    }
}
