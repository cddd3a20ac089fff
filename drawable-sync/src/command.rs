//! Host-to-canvas commands.

use drawable_core::SurfaceEvent;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

/// One instruction from the host, typically a JSON line on stdin.
///
/// ```json
/// {"command": "pointer", "event": {"type": "pointer_down", "x": 10, "y": 20}}
/// {"command": "undo"}
/// {"command": "configure", "config": {"drawingMode": "rect"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    /// Pointer input on the surface.
    Pointer {
        /// The event to dispatch.
        event: SurfaceEvent,
    },
    /// Step back in history.
    Undo,
    /// Step forward in history.
    Redo,
    /// Return to the initial drawing.
    Reset,
    /// Send the current drawing now, live updates or not.
    Download,
    /// Replace the session configuration.
    Configure {
        /// New configuration.
        config: Box<SessionConfig>,
    },
}
