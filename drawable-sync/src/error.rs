//! Error types for host synchronization.

use drawable_core::CanvasError;
use drawable_renderer::RenderError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while running a session or delivering to the host.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Session configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The canvas core rejected an operation.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// Rasterizing a snapshot failed.
    #[error("rasterization failed: {0}")]
    Render(#[from] RenderError),

    /// HTTP delivery failed (connection, timeout, non-success status).
    #[error("host request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload encoding failed.
    #[error("failed to encode payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to a local sink failed.
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The debouncer task or sink receiver is gone.
    #[error("sync channel closed")]
    Closed,
}

/// Errors raised while fetching a background image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The image URL cannot be resolved.
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, etc.).
    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("image request returned HTTP {0}")]
    Status(u16),

    /// The response body is not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(#[from] RenderError),
}

impl FetchError {
    /// Returns true if another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_is_retryable() {
        assert!(!FetchError::InvalidUrl("nope".into()).is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Decode(RenderError::Resource("bad".into())).is_retryable());
    }

    #[test]
    fn test_canvas_error_is_transparent() {
        let err = SyncError::from(CanvasError::UnknownTool("spray".into()));
        assert_eq!(err.to_string(), CanvasError::UnknownTool("spray".into()).to_string());
    }
}
