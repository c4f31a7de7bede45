//! Error types for showershape-algorithms.

use thiserror::Error;

/// Result type for clustering and aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Clustering and aggregation error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error (missing layer position, invalid hit, ...).
    #[error("core error: {0}")]
    Core(#[from] showershape_core::Error),

    /// Invalid analysis configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for the expected schema.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
