//! Error types for the engine.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Resource has been released and can no longer be used
    #[error("Resource closed: {0}")]
    Closed(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
