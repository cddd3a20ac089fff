//! Drawing snapshots - the serialized description of everything on the surface.
//!
//! The wire shape follows the canvas JSON format used by the host:
//!
//! ```text
//! {
//!   "version": "4.4.0",
//!   "objects": [ { "type": "rect", "left": 10, "top": 10, ... }, ... ],
//!   "background": "#ffffff"
//! }
//! ```
//!
//! Unknown shape types and attributes are carried through untouched, so a
//! snapshot survives push/reload/serialize cycles losslessly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CanvasError, CanvasResult, Point};

/// Format version written into freshly created snapshots.
pub const SNAPSHOT_VERSION: &str = "4.4.0";

/// Type tag of a shape record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Freehand stroke made of path commands.
    Path,
    /// Axis-aligned rectangle.
    Rect,
    /// Circle positioned by its center.
    Circle,
    /// Straight line segment.
    Line,
    /// Closed polygon.
    Polygon,
    /// Any other shape type, preserved verbatim.
    #[serde(untagged)]
    Other(String),
}

impl ShapeKind {
    /// The wire tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Path => "path",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned bounding box in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl Bounds {
    fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Self {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }

    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn inflate(self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Check if a point lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A single shape on the surface: a type tag plus geometry and style attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// Shape type tag.
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Geometry and style attributes, in wire form.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ShapeRecord {
    /// Create a shape with no attributes.
    #[must_use]
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            attributes: Map::new(),
        }
    }

    /// Set an attribute, builder style.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Apply fill, stroke color and stroke width, builder style.
    #[must_use]
    pub fn with_style(self, fill: &str, stroke: &str, stroke_width: f64) -> Self {
        self.with("fill", fill)
            .with("stroke", stroke)
            .with("strokeWidth", stroke_width)
    }

    /// Set an attribute.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Get an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Get a numeric attribute.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }

    /// Get a string attribute.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Stroke width, defaulting to 1.
    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        self.number("strokeWidth").unwrap_or(1.0)
    }

    /// Check that the attributes required by the shape kind are present.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing or malformed attribute.
    pub fn validate(&self) -> Result<(), String> {
        let required: &[&str] = match self.kind {
            ShapeKind::Rect => &["left", "top", "width", "height"],
            ShapeKind::Circle => &["left", "top", "radius"],
            ShapeKind::Line => &["x1", "y1", "x2", "y2"],
            ShapeKind::Path => {
                return self
                    .get("path")
                    .and_then(Value::as_array)
                    .map(|_| ())
                    .ok_or_else(|| "path shape without a `path` array".to_string());
            }
            ShapeKind::Polygon => {
                return self
                    .get("points")
                    .and_then(Value::as_array)
                    .map(|_| ())
                    .ok_or_else(|| "polygon shape without a `points` array".to_string());
            }
            ShapeKind::Other(_) => &[],
        };

        for key in required {
            if self.number(key).is_none() {
                return Err(format!("{} shape missing numeric `{key}`", self.kind));
            }
        }
        Ok(())
    }

    /// Bounding box of the shape geometry, ignoring stroke width.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        match self.kind {
            ShapeKind::Circle => {
                let (cx, cy, r) = (
                    self.number("left")?,
                    self.number("top")?,
                    self.number("radius")?,
                );
                Bounds::from_points([(cx - r, cy - r), (cx + r, cy + r)])
            }
            ShapeKind::Line => Bounds::from_points([
                (self.number("x1")?, self.number("y1")?),
                (self.number("x2")?, self.number("y2")?),
            ]),
            ShapeKind::Path => Bounds::from_points(path_points(self.get("path")?)),
            ShapeKind::Polygon => Bounds::from_points(polygon_points(self.get("points")?)),
            ShapeKind::Rect | ShapeKind::Other(_) => {
                let (left, top) = (self.number("left")?, self.number("top")?);
                let width = self.number("width").unwrap_or(0.0);
                let height = self.number("height").unwrap_or(0.0);
                Bounds::from_points([(left, top), (left + width, top + height)])
            }
        }
    }

    /// Move the shape by the given offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self.kind {
            ShapeKind::Line => {
                for (key, delta) in [("x1", dx), ("y1", dy), ("x2", dx), ("y2", dy)] {
                    offset_number(&mut self.attributes, key, delta);
                }
            }
            ShapeKind::Path => {
                if let Some(Value::Array(commands)) = self.attributes.get_mut("path") {
                    for command in commands {
                        translate_path_command(command, dx, dy);
                    }
                }
            }
            ShapeKind::Polygon => {
                if let Some(Value::Array(points)) = self.attributes.get_mut("points") {
                    for point in points.iter_mut().filter_map(Value::as_object_mut) {
                        offset_number(point, "x", dx);
                        offset_number(point, "y", dy);
                    }
                }
            }
            ShapeKind::Rect | ShapeKind::Circle | ShapeKind::Other(_) => {
                offset_number(&mut self.attributes, "left", dx);
                offset_number(&mut self.attributes, "top", dy);
            }
        }
    }
}

fn offset_number(map: &mut Map<String, Value>, key: &str, delta: f64) {
    if let Some(current) = map.get(key).and_then(Value::as_f64) {
        map.insert(key.to_string(), Value::from(current + delta));
    }
}

/// Coordinate pairs of a path command list such as `[["M", 1, 2], ["Q", 3, 4, 5, 6]]`.
fn path_points(path: &Value) -> Vec<(f64, f64)> {
    let Some(commands) = path.as_array() else {
        return Vec::new();
    };
    commands
        .iter()
        .filter_map(Value::as_array)
        .flat_map(|command| {
            let coords: Vec<f64> = command.iter().skip(1).filter_map(Value::as_f64).collect();
            coords
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn polygon_points(points: &Value) -> Vec<(f64, f64)> {
    points
        .as_array()
        .map(|points| {
            points
                .iter()
                .filter_map(|p| Some((p.get("x")?.as_f64()?, p.get("y")?.as_f64()?)))
                .collect()
        })
        .unwrap_or_default()
}

fn translate_path_command(command: &mut Value, dx: f64, dy: f64) {
    let Some(parts) = command.as_array_mut() else {
        return;
    };
    for (i, part) in parts.iter_mut().skip(1).enumerate() {
        if let Some(n) = part.as_f64() {
            let delta = if i % 2 == 0 { dx } else { dy };
            *part = Value::from(n + delta);
        }
    }
}

/// A complete, serializable description of the drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSnapshot {
    /// Format version.
    #[serde(default = "DrawingSnapshot::default_version")]
    pub version: String,
    /// Shapes in paint order (first is bottom-most).
    #[serde(default)]
    pub objects: Vec<ShapeRecord>,
    /// Surface background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Other surface-level metadata, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DrawingSnapshot {
    fn default() -> Self {
        Self::empty(None)
    }
}

impl DrawingSnapshot {
    fn default_version() -> String {
        SNAPSHOT_VERSION.to_string()
    }

    /// An empty drawing with an optional background color.
    #[must_use]
    pub fn empty(background: Option<String>) -> Self {
        Self {
            version: Self::default_version(),
            objects: Vec::new(),
            background,
            extra: Map::new(),
        }
    }

    /// Add a shape, builder style.
    #[must_use]
    pub fn with_object(mut self, shape: ShapeRecord) -> Self {
        self.objects.push(shape);
        self
    }

    /// Number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the drawing has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Check that every shape carries the attributes its kind requires.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SnapshotLoad`] naming the first invalid shape.
    pub fn validate(&self) -> CanvasResult<()> {
        for (index, shape) in self.objects.iter().enumerate() {
            shape
                .validate()
                .map_err(|reason| CanvasError::SnapshotLoad(format!("object {index}: {reason}")))?;
        }
        Ok(())
    }

    /// Serialize the snapshot to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(CanvasError::Serialization)
    }
}
