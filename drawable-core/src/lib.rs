//! # Drawable Canvas Core
//!
//! State engine behind a drawable canvas: the drawing snapshot model, the
//! in-memory drawable surface, the undo/redo history and tool dispatch.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               drawable-core                 │
//! ├─────────────────────────────────────────────┤
//! │  ToolRegistry    │  HistoryStore            │
//! │  - Tool variants │  - Snapshot entries      │
//! │  - Cleanup scope │  - Cursor / reset        │
//! │                  │  - One-shot action flags │
//! ├─────────────────────────────────────────────┤
//! │  DrawableSurface                            │
//! │  - Shapes, brush, interaction mode          │
//! │  - Event binding table                      │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event;
pub mod history;
pub mod registry;
pub mod snapshot;
pub mod surface;
pub mod tool;

pub use error::{CanvasError, CanvasResult};
pub use event::{EventKind, Point, PointerButton, SurfaceEvent};
pub use history::{ActionFlags, HistoryStore};
pub use registry::{ToolConstructor, ToolRegistry};
pub use snapshot::{Bounds, DrawingSnapshot, ShapeKind, ShapeRecord};
pub use surface::{
    BindingId, BindingStats, Brush, DrawableSurface, Handler, Interaction, InteractionMode,
    SurfaceState,
};
pub use tool::{Cleanup, Tool, ToolConfig};

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
