use crate::{Brush, DrawableSurface, Interaction, InteractionMode};

use super::{Cleanup, Tool, ToolConfig};

/// Freehand strokes painted by the surface brush.
#[derive(Debug, Default)]
pub struct FreedrawTool;

impl Tool for FreedrawTool {
    fn name(&self) -> &'static str {
        "freedraw"
    }

    fn configure(&self, surface: &mut DrawableSurface, config: &ToolConfig) -> Cleanup {
        let previous = surface.state().interaction();
        let state = surface.state_mut();
        state.set_interaction(Interaction {
            mode: InteractionMode::FreeDrawing,
            selection: false,
        });
        state.set_brush(Brush {
            width: config.stroke_width,
            color: config.stroke_color.clone(),
        });
        Cleanup::detach(Vec::new(), previous)
    }
}
