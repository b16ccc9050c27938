//! Error types for coloring canvas core operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core coloring logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A color string could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// A progress record could not be stored or retrieved.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O error occurred in a filesystem-backed store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
