//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested output size cannot be rasterized.
    #[error("Invalid output size {width}x{height}")]
    InvalidSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// SVG generation, rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),
}
