use crate::{DrawableSurface, Interaction, InteractionMode};

use super::{Cleanup, Tool, ToolConfig};

/// Select and move existing shapes.
#[derive(Debug, Default)]
pub struct TransformTool;

impl Tool for TransformTool {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn configure(&self, surface: &mut DrawableSurface, _config: &ToolConfig) -> Cleanup {
        let previous = surface.state().interaction();
        surface.state_mut().set_interaction(Interaction {
            mode: InteractionMode::Selection,
            selection: true,
        });
        Cleanup::detach(Vec::new(), previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::test_support::stroke;
    use crate::{ShapeKind, ShapeRecord};

    #[test]
    fn test_drag_moves_shape_and_cleanup_restores_mode() {
        let mut surface = DrawableSurface::new(100.0, 100.0);
        let placement = Interaction {
            mode: InteractionMode::Placement,
            selection: false,
        };
        surface.state_mut().set_interaction(placement);

        surface.state_mut().push_object(
            ShapeRecord::new(ShapeKind::Circle)
                .with("left", 50.0)
                .with("top", 50.0)
                .with("radius", 10.0),
        );

        let cleanup = TransformTool.configure(&mut surface, &ToolConfig::default());
        stroke(&mut surface, (50.0, 50.0), (60.0, 45.0));
        let circle = &surface.state().objects()[0];
        assert_eq!(circle.number("left"), Some(60.0));
        assert_eq!(circle.number("top"), Some(45.0));

        cleanup.run(&mut surface);
        assert_eq!(surface.state().interaction(), placement);
    }
}
