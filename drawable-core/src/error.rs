//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The requested drawing mode has no registered tool.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A snapshot could not be loaded into the drawable surface.
    #[error("Failed to load snapshot: {0}")]
    SnapshotLoad(String),

    /// Snapshot serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
