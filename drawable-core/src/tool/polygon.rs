use std::cell::Cell;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::{DrawableSurface, EventKind, Point, ShapeKind, ShapeRecord, SurfaceState};

use super::{enter_placement, Cleanup, Tool, ToolConfig};

/// Click-by-click polygons, closed with a double click.
///
/// While a polygon is open its last vertex trails the pointer as a preview.
/// Closing drops the preview vertex and any repeated vertices left by the
/// double click; fewer than three distinct vertices removes the shape.
#[derive(Debug, Default)]
pub struct PolygonTool;

impl Tool for PolygonTool {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup {
        let previous = enter_placement(surface);
        let open: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(None));

        let on_down = {
            let open = Rc::clone(&open);
            let style = config.clone();
            surface.on(
                EventKind::PointerDown,
                Box::new(move |state, event| {
                    if !event.is_primary_down() {
                        return;
                    }
                    let p = event.point();
                    match open.get().filter(|&index| points_mut(state, index).is_some()) {
                        Some(index) => {
                            if let Some(points) = points_mut(state, index) {
                                set_last(points, p);
                                points.push(vertex(p));
                            }
                        }
                        None => {
                            let shape = ShapeRecord::new(ShapeKind::Polygon)
                                .with("points", json!([vertex(p), vertex(p)]))
                                .with_style(
                                    &style.fill_color,
                                    &style.stroke_color,
                                    style.stroke_width,
                                );
                            open.set(Some(state.push_object(shape)));
                        }
                    }
                }),
            )
        };

        let on_move = {
            let open = Rc::clone(&open);
            surface.on(
                EventKind::PointerMove,
                Box::new(move |state, event| {
                    if let Some(points) = open.get().and_then(|index| points_mut(state, index)) {
                        set_last(points, event.point());
                    }
                }),
            )
        };

        let on_close = surface.on(
            EventKind::DoubleClick,
            Box::new(move |state, _event| {
                let Some(index) = open.take() else { return };
                let Some(points) = points_mut(state, index) else {
                    return;
                };
                points.pop();
                points.dedup();
                if points.len() < 3 {
                    state.remove_object(index);
                }
            }),
        );

        Cleanup::detach(vec![on_down, on_move, on_close], previous)
    }
}

fn vertex(p: Point) -> Value {
    json!({ "x": p.x, "y": p.y })
}

fn points_mut(state: &mut SurfaceState, index: usize) -> Option<&mut Vec<Value>> {
    let shape = state.object_mut(index)?;
    if shape.kind != ShapeKind::Polygon {
        return None;
    }
    shape.attributes.get_mut("points")?.as_array_mut()
}

fn set_last(points: &mut [Value], p: Point) {
    if let Some(last) = points.last_mut() {
        *last = vertex(p);
    }
}
