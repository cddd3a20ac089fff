//! # Drawable Canvas Renderer
//!
//! Turns a [`DrawingSnapshot`] into the raster image the host receives.
//!
//! ```text
//! DrawingSnapshot ──▶ SVG string ──▶ usvg tree ──▶ tiny-skia pixmap ──▶ PNG
//!                    (export.rs)     (resvg)                         (data URL)
//! ```
//!
//! The [`texture`] module decodes fetched background images.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod texture;

pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, SnapshotExporter};
pub use texture::{
    load_image_from_bytes, load_image_from_data_uri, png_data_url, ImageFormat, TextureData,
};

use drawable_core::DrawingSnapshot;

/// Renders drawing snapshots to PNG bytes.
///
/// Implementations must be shareable with the sync task.
pub trait Rasterizer: Send + Sync {
    /// Render `snapshot` onto a `width` x `height` surface and encode it as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be rendered or encoded.
    fn rasterize(&self, snapshot: &DrawingSnapshot, width: u32, height: u32)
        -> RenderResult<Vec<u8>>;
}

impl Rasterizer for SnapshotExporter {
    fn rasterize(
        &self,
        snapshot: &DrawingSnapshot,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        self.render_to_png(snapshot, width, height)
    }
}
