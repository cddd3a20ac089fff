//! Drawing-mode registry: one active tool at a time.

use std::collections::BTreeMap;

use crate::tool::{
    CircleTool, FreedrawTool, LineTool, PointTool, PolygonTool, RectTool, TransformTool,
};
use crate::{CanvasError, CanvasResult, Cleanup, DrawableSurface, Tool, ToolConfig};

/// Builds a fresh tool instance.
pub type ToolConstructor = fn() -> Box<dyn Tool>;

struct ActiveTool {
    key: String,
    config: ToolConfig,
    cleanup: Cleanup,
}

/// Maps drawing-mode keys to tools and owns the active tool's cleanup.
///
/// # Example
///
/// ```
/// use drawable_core::{DrawableSurface, ToolConfig, ToolRegistry};
///
/// let mut surface = DrawableSurface::new(600.0, 400.0);
/// let mut registry = ToolRegistry::with_defaults();
///
/// registry.activate(&mut surface, "rect", &ToolConfig::default()).unwrap();
/// assert_eq!(registry.active_key(), Some("rect"));
///
/// assert!(registry.activate(&mut surface, "spray", &ToolConfig::default()).is_err());
/// assert_eq!(registry.active_key(), Some("rect"));
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    constructors: BTreeMap<String, ToolConstructor>,
    active: Option<ActiveTool>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("keys", &self.constructors.keys().collect::<Vec<_>>())
            .field("active", &self.active_key())
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in tool.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("freedraw", || Box::new(FreedrawTool));
        registry.register("transform", || Box::new(TransformTool));
        registry.register("line", || Box::new(LineTool));
        registry.register("rect", || Box::new(RectTool));
        registry.register("circle", || Box::new(CircleTool));
        registry.register("point", || Box::new(PointTool));
        registry.register("polygon", || Box::new(PolygonTool));
        registry
    }

    /// Register a tool under `key`, returning the constructor it replaced.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        constructor: ToolConstructor,
    ) -> Option<ToolConstructor> {
        self.constructors.insert(key.into(), constructor)
    }

    /// Check if a key is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Key of the active tool.
    #[must_use]
    pub fn active_key(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.key.as_str())
    }

    /// Configuration the active tool was set up with.
    #[must_use]
    pub fn active_config(&self) -> Option<&ToolConfig> {
        self.active.as_ref().map(|active| &active.config)
    }

    /// Make `key` the active tool, configured with `config`.
    ///
    /// The outgoing tool's cleanup always runs before the new tool binds its
    /// handlers, including when `key` is already active. An unknown key leaves
    /// the current tool in place.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnknownTool`] if `key` is not registered.
    pub fn activate(
        &mut self,
        surface: &mut DrawableSurface,
        key: &str,
        config: &ToolConfig,
    ) -> CanvasResult<()> {
        let constructor = self
            .constructors
            .get(key)
            .copied()
            .ok_or_else(|| CanvasError::UnknownTool(key.to_string()))?;

        self.deactivate(surface);

        let tool = constructor();
        let cleanup = tool.configure(surface, config);
        tracing::debug!(
            "Activated tool {} ({} bindings)",
            tool.name(),
            cleanup.binding_count()
        );
        self.active = Some(ActiveTool {
            key: key.to_string(),
            config: config.clone(),
            cleanup,
        });
        Ok(())
    }

    /// Tear down the active tool. Returns `false` if none was active.
    pub fn deactivate(&mut self, surface: &mut DrawableSurface) -> bool {
        match self.active.take() {
            Some(active) => {
                tracing::debug!("Deactivating tool {}", active.key);
                active.cleanup.run(surface);
                true
            }
            None => false,
        }
    }
}
