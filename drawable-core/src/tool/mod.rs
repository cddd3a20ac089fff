//! Drawing tools.
//!
//! A [`Tool`] turns pointer input into surface mutations for one drawing mode.
//! Configuring a tool binds its handlers on the surface and yields a
//! [`Cleanup`] that must be run before another tool is configured.

mod circle;
mod freedraw;
mod line;
mod polygon;
mod rect;
mod transform;

pub use circle::{CircleTool, PointTool};
pub use freedraw::FreedrawTool;
pub use line::LineTool;
pub use polygon::PolygonTool;
pub use rect::RectTool;
pub use transform::TransformTool;

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{
    BindingId, DrawableSurface, EventKind, Interaction, InteractionMode, Point, ShapeRecord,
};

/// Style parameters handed to a tool when it is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Fill color for closed shapes.
    pub fill_color: String,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Stroke color.
    pub stroke_color: String,
    /// Radius of shapes placed by the point tool.
    pub display_radius: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            fill_color: "#eee".to_string(),
            stroke_width: 20.0,
            stroke_color: "black".to_string(),
            display_radius: 3.0,
        }
    }
}

/// Teardown for a configured tool.
///
/// Detaches exactly the bindings the tool created and restores the
/// interaction flags it changed. Dropping a `Cleanup` without running it
/// leaves the bindings live, hence `#[must_use]`.
#[must_use = "a tool's bindings stay live until its cleanup runs"]
pub struct Cleanup {
    bindings: Vec<BindingId>,
    restore: Interaction,
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup")
            .field("bindings", &self.bindings.len())
            .field("restore", &self.restore)
            .finish()
    }
}

impl Cleanup {
    /// Unbind `bindings` and put the interaction flags back to `previous`.
    pub fn detach(bindings: Vec<BindingId>, previous: Interaction) -> Self {
        Self {
            bindings,
            restore: previous,
        }
    }

    /// Number of bindings this cleanup will release.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Run the teardown.
    pub fn run(self, surface: &mut DrawableSurface) {
        for id in self.bindings {
            if !surface.off(id) {
                tracing::warn!("Tool binding {id:?} was already detached");
            }
        }
        surface.state_mut().set_interaction(self.restore);
    }
}

/// A drawing mode strategy.
pub trait Tool {
    /// Registry key of this tool.
    fn name(&self) -> &'static str;

    /// Set the surface's interaction mode and bind the tool's handlers.
    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup;
}

/// Switch the surface to shape placement, returning the flags to restore.
fn enter_placement(surface: &mut DrawableSurface) -> Interaction {
    let previous = surface.state().interaction();
    surface.state_mut().set_interaction(Interaction {
        mode: InteractionMode::Placement,
        selection: false,
    });
    previous
}

/// Bind press/drag/release handlers that place one shape per gesture.
///
/// `create` builds the shape at the press point, `update` reshapes it from
/// `(origin, current)` while dragging, and shapes for which `degenerate`
/// holds are removed again on release.
fn bind_drag_placement<C, U>(
    surface: &mut DrawableSurface,
    create: C,
    update: U,
    degenerate: fn(&ShapeRecord) -> bool,
) -> Vec<BindingId>
where
    C: Fn(Point) -> ShapeRecord + 'static,
    U: Fn(&mut ShapeRecord, Point, Point) + 'static,
{
    // (shape index, press point) of the gesture in progress
    let gesture: Rc<Cell<Option<(usize, Point)>>> = Rc::new(Cell::new(None));

    let on_down = {
        let gesture = Rc::clone(&gesture);
        surface.on(
            EventKind::PointerDown,
            Box::new(move |state, event| {
                if !event.is_primary_down() {
                    return;
                }
                let origin = event.point();
                let index = state.push_object(create(origin));
                gesture.set(Some((index, origin)));
            }),
        )
    };

    let on_move = {
        let gesture = Rc::clone(&gesture);
        surface.on(
            EventKind::PointerMove,
            Box::new(move |state, event| {
                let Some((index, origin)) = gesture.get() else {
                    return;
                };
                if let Some(shape) = state.object_mut(index) {
                    update(shape, origin, event.point());
                }
            }),
        )
    };

    let on_up = surface.on(
        EventKind::PointerUp,
        Box::new(move |state, _event| {
            let Some((index, _)) = gesture.take() else {
                return;
            };
            if state.objects().get(index).is_some_and(degenerate) {
                state.remove_object(index);
            }
        }),
    );

    vec![on_down, on_move, on_up]
}
