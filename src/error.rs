//! Error types for the voc-eval library.

use thiserror::Error;

/// Result type for voc-eval operations.
pub type Result<T> = std::result::Result<T, VocEvalError>;

/// Error types that can occur while accumulating or scoring detections.
#[derive(Error, Debug)]
pub enum VocEvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed input rows or batches (wrong column count, mismatched image counts).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid bounding box coordinates.
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// IoU threshold outside of [0.0, 1.0].
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Inconsistent metric configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
