//! Occlusion error types.

use thiserror::Error;

/// Errors from debug raster output.
#[derive(Error, Debug)]
pub enum OcclusionError {
    /// Image encoding or write failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background writer could not be started or has stopped.
    #[error("Raster writer unavailable: {0}")]
    WorkerUnavailable(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, OcclusionError>;
