use crate::{DrawableSurface, ShapeKind, ShapeRecord};

use super::{bind_drag_placement, enter_placement, Cleanup, Tool, ToolConfig};

/// Straight line segments from press to release.
#[derive(Debug, Default)]
pub struct LineTool;

impl Tool for LineTool {
    fn name(&self) -> &'static str {
        "line"
    }

    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup {
        let previous = enter_placement(surface);
        let stroke_color = config.stroke_color.clone();
        let stroke_width = config.stroke_width;
        let bindings = bind_drag_placement(
            surface,
            move |origin| {
                ShapeRecord::new(ShapeKind::Line)
                    .with("x1", origin.x)
                    .with("y1", origin.y)
                    .with("x2", origin.x)
                    .with("y2", origin.y)
                    .with("stroke", stroke_color.as_str())
                    .with("strokeWidth", stroke_width)
            },
            |shape, _origin, current| {
                shape.set("x2", current.x);
                shape.set("y2", current.y);
            },
            |shape| {
                shape
                    .bounds()
                    .is_none_or(|b| b.width() < f64::EPSILON && b.height() < f64::EPSILON)
            },
        );
        Cleanup::detach(bindings, previous)
    }
}
