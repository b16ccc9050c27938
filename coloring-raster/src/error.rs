//! Error types for raster operations.

use thiserror::Error;

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors that can occur on the raster side of the canvas.
#[derive(Debug, Error)]
pub enum RasterError {
    /// An image could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// An image could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// A saved progress record is malformed.
    #[error("Invalid progress record: {0}")]
    Record(String),
}
