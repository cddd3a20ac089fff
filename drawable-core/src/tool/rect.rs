use crate::{DrawableSurface, Point, ShapeKind, ShapeRecord};

use super::{bind_drag_placement, enter_placement, Cleanup, Tool, ToolConfig};

/// Axis-aligned rectangles dragged from corner to corner.
#[derive(Debug, Default)]
pub struct RectTool;

impl Tool for RectTool {
    fn name(&self) -> &'static str {
        "rect"
    }

    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup {
        let previous = enter_placement(surface);
        let style = config.clone();
        let bindings = bind_drag_placement(
            surface,
            move |origin| {
                ShapeRecord::new(ShapeKind::Rect)
                    .with("left", origin.x)
                    .with("top", origin.y)
                    .with("width", 0.0)
                    .with("height", 0.0)
                    .with_style(&style.fill_color, &style.stroke_color, style.stroke_width)
            },
            resize,
            |shape| {
                shape.number("width").unwrap_or(0.0).abs() < f64::EPSILON
                    || shape.number("height").unwrap_or(0.0).abs() < f64::EPSILON
            },
        );
        Cleanup::detach(bindings, previous)
    }
}

/// Span the rectangle between the press point and the pointer, whichever way
/// the pointer was dragged.
fn resize(shape: &mut ShapeRecord, origin: Point, current: Point) {
    shape.set("left", origin.x.min(current.x));
    shape.set("top", origin.y.min(current.y));
    shape.set("width", (current.x - origin.x).abs());
    shape.set("height", (current.y - origin.y).abs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::test_support::{down, stroke, up};
    use crate::InteractionMode;

    #[test]
    fn test_drag_up_left_normalizes() {
        let mut surface = DrawableSurface::new(200.0, 200.0);
        let cleanup = RectTool.configure(&mut surface, &ToolConfig::default());
        assert_eq!(surface.state().mode(), InteractionMode::Placement);

        stroke(&mut surface, (50.0, 60.0), (20.0, 10.0));

        let rect = &surface.state().objects()[0];
        assert_eq!(rect.kind, ShapeKind::Rect);
        assert_eq!(rect.number("left"), Some(20.0));
        assert_eq!(rect.number("top"), Some(10.0));
        assert_eq!(rect.number("width"), Some(30.0));
        assert_eq!(rect.number("height"), Some(50.0));
        assert_eq!(rect.text("fill"), Some("#eee"));

        cleanup.run(&mut surface);
        assert_eq!(surface.binding_count(None), 0);
    }

    #[test]
    fn test_click_without_drag_leaves_nothing() {
        let mut surface = DrawableSurface::new(200.0, 200.0);
        let _cleanup = RectTool.configure(&mut surface, &ToolConfig::default());

        surface.dispatch(&down(5.0, 5.0));
        surface.dispatch(&up(5.0, 5.0));
        assert!(surface.state().objects().is_empty());
    }
}
