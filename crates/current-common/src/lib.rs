//! Common types shared by the ocean current overlay crates.

pub mod error;
pub mod geo;
pub mod grid;
pub mod sample;
pub mod style;

pub use error::{SampleError, SampleResult};
pub use geo::{GeoBounds, GeoPoint};
pub use grid::CurrentGrid;
pub use sample::{load_samples_json, parse_samples_json, CurrentSample};
pub use style::{Rgba, SpeedBand, SpeedPalette, StyleError};
