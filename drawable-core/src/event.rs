//! Pointer events delivered to the drawable surface.

use serde::{Deserialize, Serialize};

/// A position in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X position (pixels from left).
    pub x: f64,
    /// Y position (pixels from top).
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Mouse button that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left button, pen or single-finger touch.
    #[default]
    Primary,
    /// Middle button.
    Middle,
    /// Right button.
    Secondary,
}

/// Kind of a surface event, used as the key of event bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer pressed.
    PointerDown,
    /// Pointer moved.
    PointerMove,
    /// Pointer released.
    PointerUp,
    /// Double click.
    DoubleClick,
}

/// An input event on the drawable surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(missing_docs)] // Variant fields documented at variant level
pub enum SurfaceEvent {
    /// Pointer pressed at (x, y).
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },
    /// Pointer moved to (x, y), pressed or not.
    PointerMove { x: f64, y: f64 },
    /// Pointer released at (x, y).
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },
    /// Double click at (x, y).
    DoubleClick { x: f64, y: f64 },
}

impl SurfaceEvent {
    /// The binding key for this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerUp { .. } => EventKind::PointerUp,
            Self::DoubleClick { .. } => EventKind::DoubleClick,
        }
    }

    /// Where the event happened.
    #[must_use]
    pub const fn point(&self) -> Point {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y, .. }
            | Self::DoubleClick { x, y } => Point { x, y },
        }
    }

    /// The button for press/release events.
    #[must_use]
    pub const fn button(&self) -> Option<PointerButton> {
        match *self {
            Self::PointerDown { button, .. } | Self::PointerUp { button, .. } => Some(button),
            Self::PointerMove { .. } | Self::DoubleClick { .. } => None,
        }
    }

    /// Check if this is a primary-button press.
    #[must_use]
    pub fn is_primary_down(&self) -> bool {
        matches!(
            self,
            Self::PointerDown {
                button: PointerButton::Primary,
                ..
            }
        )
    }
}
