//! Error types for overlay rendering.

use current_common::StyleError;
use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

#[derive(Debug, Error)]
pub enum OverlayError {
    /// The map host could not provide a drawing surface.
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Invalid overlay configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid palette: {0}")]
    Style(#[from] StyleError),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
