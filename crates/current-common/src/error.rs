//! Error types for loading current samples.

use thiserror::Error;

/// Result type alias using SampleError.
pub type SampleResult<T> = Result<T, SampleError>;

/// Errors raised while reading or converting current samples.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Failed to read sample file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid sample JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sample {index} has neither speed/direction nor u/v components")]
    MissingVelocity { index: usize },

    #[error("Grid shape mismatch: expected {expected} values, got {actual}")]
    GridShape { expected: usize, actual: usize },

    #[error("Sample factor must be at least 1")]
    ZeroSampleFactor,
}
