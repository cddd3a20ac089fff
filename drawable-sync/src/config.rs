//! Session configuration.
//!
//! [`SessionConfig`] mirrors the arguments a host passes to the canvas
//! component (camelCase JSON, every field optional). [`SyncSettings`] holds
//! the timing knobs of the sync layer.

use std::path::Path;
use std::time::Duration;

use drawable_core::{CanvasError, DrawingSnapshot, ToolConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::background::BackoffConfig;
use crate::error::{SyncError, SyncResult};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Arguments of one mounted canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Fill color for closed shapes.
    pub fill_color: String,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Stroke color.
    pub stroke_color: String,
    /// Background color used when no initial drawing is given. Empty for none.
    pub background_color: String,
    /// Background image path (resolved against the host origin) or URL.
    #[serde(rename = "backgroundImageURL", skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    /// Send every settled change to the host, not only forced ones.
    #[serde(alias = "realtimeUpdate")]
    pub realtime_update_streamlit: bool,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Registry key of the active tool.
    pub drawing_mode: String,
    /// Drawing to start from. Kept as raw JSON so that a malformed drawing is
    /// reported when the session mounts, not when the config is parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_drawing: Option<Value>,
    /// Whether the host shows undo/redo/reset controls.
    pub display_toolbar: bool,
    /// Radius of shapes placed by the point tool.
    pub display_radius: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fill_color: "#eee".to_string(),
            stroke_width: 20.0,
            stroke_color: "black".to_string(),
            background_color: String::new(),
            background_image_url: None,
            realtime_update_streamlit: true,
            canvas_width: 600,
            canvas_height: 400,
            drawing_mode: "freedraw".to_string(),
            initial_drawing: None,
            display_toolbar: true,
            display_radius: 3.0,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the JSON is malformed or a value is
    /// out of range.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> SyncResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] naming the first offending field.
    pub fn validate(&self) -> SyncResult<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(SyncError::Config(format!(
                "canvas size must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(SyncError::Config(format!(
                "strokeWidth must be a non-negative number, got {}",
                self.stroke_width
            )));
        }
        if !self.display_radius.is_finite() || self.display_radius < 0.0 {
            return Err(SyncError::Config(format!(
                "displayRadius must be a non-negative number, got {}",
                self.display_radius
            )));
        }
        Ok(())
    }

    /// Style handed to the active tool.
    #[must_use]
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            fill_color: self.fill_color.clone(),
            stroke_width: self.stroke_width,
            stroke_color: self.stroke_color.clone(),
            display_radius: self.display_radius,
        }
    }

    /// The snapshot the session history starts from.
    ///
    /// Without an initial drawing this is an empty drawing on
    /// `backgroundColor`; a drawing without a background of its own also
    /// gets `backgroundColor`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SnapshotLoad`] if the initial drawing is not a
    /// valid snapshot.
    pub fn initial_snapshot(&self) -> Result<DrawingSnapshot, CanvasError> {
        let background =
            (!self.background_color.is_empty()).then(|| self.background_color.clone());
        let Some(raw) = &self.initial_drawing else {
            return Ok(DrawingSnapshot::empty(background));
        };

        let mut snapshot: DrawingSnapshot = serde_json::from_value(raw.clone())
            .map_err(|e| CanvasError::SnapshotLoad(format!("initialDrawing: {e}")))?;
        snapshot.validate()?;
        if snapshot.background.is_none() {
            snapshot.background = background;
        }
        Ok(snapshot)
    }

    /// Canvas size as floating point surface dimensions.
    #[must_use]
    pub fn surface_size(&self) -> (f64, f64) {
        (f64::from(self.canvas_width), f64::from(self.canvas_height))
    }
}

/// Timing of the sync layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Quiet window before a settled snapshot is delivered.
    pub debounce: Duration,
    /// Background image retry policy.
    pub backoff: BackoffConfig,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            backoff: BackoffConfig::default(),
        }
    }
}
