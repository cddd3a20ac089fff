//! The drawable surface: shapes, interaction mode and event bindings.
//!
//! [`DrawableSurface`] stands in for the vector-graphics engine. It can load a
//! [`DrawingSnapshot`], serialize itself back into one, and dispatch pointer
//! events to handlers registered with [`DrawableSurface::on`]. Two behaviours
//! are built into the surface itself, mirroring what a canvas engine does on
//! its own: the free-drawing brush (in [`InteractionMode::FreeDrawing`]) and
//! dragging selectable shapes (in [`InteractionMode::Selection`]).

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::snapshot::SNAPSHOT_VERSION;
use crate::{CanvasResult, DrawingSnapshot, EventKind, Point, ShapeKind, ShapeRecord, SurfaceEvent};

/// Extra hit-test margin around thin shapes, in pixels.
const HIT_TOLERANCE: f64 = 4.0;

/// How the surface interprets pointer input on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// The brush paints freehand paths.
    FreeDrawing,
    /// Tools place shapes; the surface itself does nothing.
    Placement,
    /// Shapes can be picked and dragged.
    #[default]
    Selection,
}

/// Interaction flags a tool may change and must restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    /// Interaction mode.
    pub mode: InteractionMode,
    /// Whether shapes can be selected.
    pub selection: bool,
}

/// Free-drawing brush settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Stroke width in pixels.
    pub width: f64,
    /// Stroke color.
    pub color: String,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: "black".to_string(),
        }
    }
}

/// Handle to a registered event binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

/// Event handler signature.
///
/// Handlers receive the surface state rather than the surface, so they cannot
/// add or remove bindings while an event is being dispatched.
pub type Handler = Box<dyn FnMut(&mut SurfaceState, &SurfaceEvent)>;

struct Binding {
    id: BindingId,
    kind: EventKind,
    handler: Handler,
}

/// Running totals of bind/unbind calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingStats {
    /// Number of successful [`DrawableSurface::on`] calls.
    pub bound: usize,
    /// Number of successful [`DrawableSurface::off`] calls.
    pub unbound: usize,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    index: usize,
    last: Point,
}

/// Everything on the surface that event handlers may read or change.
#[derive(Debug)]
pub struct SurfaceState {
    width: f64,
    height: f64,
    version: String,
    objects: Vec<ShapeRecord>,
    background: Option<String>,
    extra: Map<String, Value>,
    interaction: Interaction,
    brush: Brush,
    stroke: Option<usize>,
    drag: Option<Drag>,
}

impl SurfaceState {
    /// Snapshot of the current drawing.
    #[must_use]
    pub fn snapshot(&self) -> DrawingSnapshot {
        DrawingSnapshot {
            version: self.version.clone(),
            objects: self.objects.clone(),
            background: self.background.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Surface width in pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Surface height in pixels.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Current interaction flags.
    #[must_use]
    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    /// Replace the interaction flags.
    pub fn set_interaction(&mut self, interaction: Interaction) {
        self.interaction = interaction;
        if interaction.mode != InteractionMode::FreeDrawing {
            self.stroke = None;
        }
        if interaction.mode != InteractionMode::Selection || !interaction.selection {
            self.drag = None;
        }
    }

    /// Current interaction mode.
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.interaction.mode
    }

    /// Free-drawing brush.
    #[must_use]
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Replace the free-drawing brush.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    /// Shapes in paint order.
    #[must_use]
    pub fn objects(&self) -> &[ShapeRecord] {
        &self.objects
    }

    /// Append a shape, returning its index.
    pub fn push_object(&mut self, shape: ShapeRecord) -> usize {
        self.objects.push(shape);
        self.objects.len() - 1
    }

    /// Mutable access to a shape.
    pub fn object_mut(&mut self, index: usize) -> Option<&mut ShapeRecord> {
        self.objects.get_mut(index)
    }

    /// Remove a shape.
    pub fn remove_object(&mut self, index: usize) -> Option<ShapeRecord> {
        (index < self.objects.len()).then(|| self.objects.remove(index))
    }

    /// Background color.
    #[must_use]
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    /// Index of the topmost shape under `point`.
    #[must_use]
    pub fn object_at(&self, point: Point) -> Option<usize> {
        self.objects.iter().rposition(|shape| {
            let tolerance = shape.stroke_width() / 2.0 + HIT_TOLERANCE;
            shape
                .bounds()
                .is_some_and(|b| b.inflate(tolerance).contains(point))
        })
    }

    /// Built-in engine behaviour, run before bound handlers.
    fn handle_engine(&mut self, event: &SurfaceEvent) {
        match self.interaction.mode {
            InteractionMode::FreeDrawing => self.paint(event),
            InteractionMode::Selection if self.interaction.selection => self.drag(event),
            InteractionMode::Selection | InteractionMode::Placement => {}
        }
    }

    fn paint(&mut self, event: &SurfaceEvent) {
        let p = event.point();
        match event {
            SurfaceEvent::PointerDown { .. } if event.is_primary_down() => {
                let shape = ShapeRecord::new(ShapeKind::Path)
                    .with("path", json!([["M", p.x, p.y]]))
                    .with("fill", Value::Null)
                    .with("stroke", self.brush.color.as_str())
                    .with("strokeWidth", self.brush.width)
                    .with("strokeLineCap", "round");
                self.stroke = Some(self.push_object(shape));
            }
            SurfaceEvent::PointerMove { .. } => {
                let Some(index) = self.stroke else { return };
                if let Some(Value::Array(path)) = self
                    .objects
                    .get_mut(index)
                    .and_then(|shape| shape.attributes.get_mut("path"))
                {
                    path.push(json!(["L", p.x, p.y]));
                }
            }
            SurfaceEvent::PointerUp { .. } => {
                if let Some(index) = self.stroke.take() {
                    tracing::trace!("Finished freehand path {index}");
                }
            }
            SurfaceEvent::PointerDown { .. } | SurfaceEvent::DoubleClick { .. } => {}
        }
    }

    fn drag(&mut self, event: &SurfaceEvent) {
        let p = event.point();
        match event {
            SurfaceEvent::PointerDown { .. } if event.is_primary_down() => {
                self.drag = self.object_at(p).map(|index| Drag { index, last: p });
            }
            SurfaceEvent::PointerMove { .. } => {
                let Some(drag) = self.drag.as_mut() else { return };
                let (dx, dy) = (p.x - drag.last.x, p.y - drag.last.y);
                drag.last = p;
                let index = drag.index;
                if let Some(shape) = self.objects.get_mut(index) {
                    shape.translate(dx, dy);
                }
            }
            SurfaceEvent::PointerUp { .. } => self.drag = None,
            SurfaceEvent::PointerDown { .. } | SurfaceEvent::DoubleClick { .. } => {}
        }
    }
}

/// In-memory drawable surface with an event binding table.
pub struct DrawableSurface {
    state: SurfaceState,
    bindings: Vec<Binding>,
    next_binding: u64,
    stats: BindingStats,
}

impl std::fmt::Debug for DrawableSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawableSurface")
            .field("state", &self.state)
            .field("bindings", &self.bindings.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl DrawableSurface {
    /// Create an empty surface of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            state: SurfaceState {
                width,
                height,
                version: SNAPSHOT_VERSION.to_string(),
                objects: Vec::new(),
                background: None,
                extra: Map::new(),
                interaction: Interaction {
                    mode: InteractionMode::Selection,
                    selection: true,
                },
                brush: Brush::default(),
                stroke: None,
                drag: None,
            },
            bindings: Vec::new(),
            next_binding: 0,
            stats: BindingStats::default(),
        }
    }

    /// Read access to the surface state.
    #[must_use]
    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    /// Write access to the surface state.
    pub fn state_mut(&mut self) -> &mut SurfaceState {
        &mut self.state
    }

    /// Replace the drawing with `snapshot`.
    ///
    /// Interaction mode, brush and bindings are kept; any gesture in progress
    /// is abandoned. On error the surface is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CanvasError::SnapshotLoad`] if a shape lacks the
    /// geometry its kind requires.
    pub fn load(&mut self, snapshot: &DrawingSnapshot) -> CanvasResult<()> {
        snapshot.validate()?;
        let state = &mut self.state;
        state.version.clone_from(&snapshot.version);
        state.objects.clone_from(&snapshot.objects);
        state.background.clone_from(&snapshot.background);
        state.extra.clone_from(&snapshot.extra);
        state.stroke = None;
        state.drag = None;
        Ok(())
    }

    /// Serialize the current drawing.
    #[must_use]
    pub fn serialize(&self) -> DrawingSnapshot {
        self.state.snapshot()
    }

    /// Bind a handler to an event kind.
    pub fn on(&mut self, kind: EventKind, handler: Handler) -> BindingId {
        let id = BindingId(self.next_binding);
        self.next_binding += 1;
        self.bindings.push(Binding { id, kind, handler });
        self.stats.bound += 1;
        id
    }

    /// Remove a binding. Returns `false` if it was not bound.
    pub fn off(&mut self, id: BindingId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.id != id);
        let removed = self.bindings.len() != before;
        if removed {
            self.stats.unbound += 1;
        }
        removed
    }

    /// Number of live bindings, optionally for one event kind.
    #[must_use]
    pub fn binding_count(&self, kind: Option<EventKind>) -> usize {
        self.bindings
            .iter()
            .filter(|b| kind.is_none_or(|k| b.kind == k))
            .count()
    }

    /// Bind/unbind totals since creation.
    #[must_use]
    pub fn binding_stats(&self) -> BindingStats {
        self.stats
    }

    /// Deliver an event: engine behaviour first, then handlers in bind order.
    pub fn dispatch(&mut self, event: &SurfaceEvent) {
        self.state.handle_engine(event);

        let kind = event.kind();
        for binding in self.bindings.iter_mut().filter(|b| b.kind == kind) {
            (binding.handler)(&mut self.state, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointerButton;

    fn down(x: f64, y: f64) -> SurfaceEvent {
        SurfaceEvent::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    fn up(x: f64, y: f64) -> SurfaceEvent {
        SurfaceEvent::PointerUp {
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    #[test]
    fn test_load_serialize_round_trip() {
        let snapshot = DrawingSnapshot::empty(Some("#fff".to_string())).with_object(
            ShapeRecord::new(ShapeKind::Rect)
                .with("left", 1.0)
                .with("top", 2.0)
                .with("width", 3.0)
                .with("height", 4.0),
        );
        let mut surface = DrawableSurface::new(100.0, 100.0);
        surface.load(&snapshot).expect("load");
        assert_eq!(surface.serialize(), snapshot);
    }

    #[test]
    fn test_invalid_load_leaves_surface_untouched() {
        let mut surface = DrawableSurface::new(100.0, 100.0);
        let bad = DrawingSnapshot::default().with_object(ShapeRecord::new(ShapeKind::Circle));
        assert!(surface.load(&bad).is_err());
        assert!(surface.serialize().is_empty());
    }

    #[test]
    fn test_free_drawing_brush_paths() {
        let mut surface = DrawableSurface::new(100.0, 100.0);
        surface.state_mut().set_interaction(Interaction {
            mode: InteractionMode::FreeDrawing,
            selection: false,
        });
        surface.dispatch(&down(1.0, 1.0));
        surface.dispatch(&SurfaceEvent::PointerMove { x: 2.0, y: 3.0 });
        surface.dispatch(&up(2.0, 3.0));
        // Moves after release do not extend the finished path.
        surface.dispatch(&SurfaceEvent::PointerMove { x: 9.0, y: 9.0 });

        let objects = surface.state().objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].kind, ShapeKind::Path);
        assert_eq!(objects[0].get("path"), Some(&json!([["M", 1.0, 1.0], ["L", 2.0, 3.0]])));
    }

    #[test]
    fn test_selection_drag_moves_topmost_shape() {
        let mut surface = DrawableSurface::new(100.0, 100.0);
        let rect = |left: f64| {
            ShapeRecord::new(ShapeKind::Rect)
                .with("left", left)
                .with("top", 0.0)
                .with("width", 20.0)
                .with("height", 20.0)
        };
        surface.state_mut().push_object(rect(0.0));
        surface.state_mut().push_object(rect(10.0));

        surface.dispatch(&down(15.0, 5.0));
        surface.dispatch(&SurfaceEvent::PointerMove { x: 25.0, y: 15.0 });
        surface.dispatch(&up(25.0, 15.0));

        let objects = surface.state().objects();
        assert_eq!(objects[0].number("left"), Some(0.0));
        assert_eq!(objects[1].number("left"), Some(20.0));
        assert_eq!(objects[1].number("top"), Some(10.0));
    }

    #[test]
    fn test_object_at_includes_stroke_and_tolerance() {
        let mut surface = DrawableSurface::new(100.0, 100.0);
        surface.state_mut().push_object(
            ShapeRecord::new(ShapeKind::Rect)
                .with("left", 10.0)
                .with("top", 10.0)
                .with("width", 20.0)
                .with("height", 20.0)
                .with("strokeWidth", 4.0),
        );
        let state = surface.state();

        // Half the stroke plus the hit tolerance: 2 + 4.
        assert_eq!(state.object_at(Point::new(4.0, 20.0)), Some(0));
        assert_eq!(state.object_at(Point::new(36.0, 36.0)), Some(0));
        assert_eq!(state.object_at(Point::new(3.5, 20.0)), None);
    }

    #[test]
    fn test_bindings_dispatch_in_order_and_unbind() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut surface = DrawableSurface::new(10.0, 10.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = {
            let log = Rc::clone(&log);
            surface.on(EventKind::PointerUp, Box::new(move |_, _| log.borrow_mut().push(1)))
        };
        {
            let log = Rc::clone(&log);
            surface.on(EventKind::PointerUp, Box::new(move |_, _| log.borrow_mut().push(2)));
        }

        surface.dispatch(&up(0.0, 0.0));
        assert!(surface.off(first));
        assert!(!surface.off(first));
        surface.dispatch(&up(0.0, 0.0));

        assert_eq!(*log.borrow(), vec![1, 2, 2]);
        assert_eq!(surface.binding_stats(), BindingStats { bound: 2, unbound: 1 });
        assert_eq!(surface.binding_count(Some(EventKind::PointerUp)), 1);
    }
}
