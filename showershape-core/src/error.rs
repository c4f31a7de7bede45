//! Error types for showershape-core.

use thiserror::Error;

/// Result type alias for showershape operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for showershape operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A hit references a layer that has no entry in the layer-position table.
    ///
    /// This is a calibration/configuration mismatch and aborts the event.
    #[error("no z position known for layer {layer}")]
    MissingLayerPosition { layer: u32 },

    /// A sensor cluster was requested for a layer without signal hits.
    #[error("layer {layer} has no signal hits to cluster")]
    EmptyLayer { layer: u32 },

    /// A hit carries a negative or non-finite energy, or a non-finite position.
    #[error("invalid hit in layer {layer}: energy={energy}, position=({x}, {y})")]
    InvalidHit {
        layer: u32,
        energy: f64,
        x: f64,
        y: f64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
