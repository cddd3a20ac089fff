use crate::{DrawableSurface, EventKind, ShapeKind, ShapeRecord};

use super::{bind_drag_placement, enter_placement, Cleanup, Tool, ToolConfig};

fn circle_at(x: f64, y: f64, radius: f64, config: &ToolConfig) -> ShapeRecord {
    ShapeRecord::new(ShapeKind::Circle)
        .with("left", x)
        .with("top", y)
        .with("originX", "center")
        .with("originY", "center")
        .with("radius", radius)
        .with_style(&config.fill_color, &config.stroke_color, config.stroke_width)
}

/// Circles centred on the press point; dragging sets the radius.
#[derive(Debug, Default)]
pub struct CircleTool;

impl Tool for CircleTool {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup {
        let previous = enter_placement(surface);
        let style = config.clone();
        let bindings = bind_drag_placement(
            surface,
            move |origin| circle_at(origin.x, origin.y, 0.0, &style),
            |shape, origin, current| shape.set("radius", origin.distance(current)),
            |shape| shape.number("radius").unwrap_or(0.0).abs() < f64::EPSILON,
        );
        Cleanup::detach(bindings, previous)
    }
}

/// Fixed-size dots of `display_radius`, one per click.
#[derive(Debug, Default)]
pub struct PointTool;

impl Tool for PointTool {
    fn name(&self) -> &'static str {
        "point"
    }

    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup {
        let previous = enter_placement(surface);
        let style = config.clone();
        let on_down = surface.on(
            EventKind::PointerDown,
            Box::new(move |state, event| {
                if event.is_primary_down() {
                    let p = event.point();
                    state.push_object(circle_at(p.x, p.y, style.display_radius, &style));
                }
            }),
        );
        Cleanup::detach(vec![on_down], previous)
    }
}
