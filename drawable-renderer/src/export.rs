//! Snapshot export to SVG and PNG.
//!
//! Renders a [`DrawingSnapshot`] through an SVG intermediate representation
//! and the resvg/tiny-skia rasterization pipeline.

use std::fmt::Write;

use drawable_core::{DrawingSnapshot, ShapeKind, ShapeRecord};
use serde_json::Value;

use crate::error::{RenderError, RenderResult};

/// Upper bound on either output dimension.
const MAX_DIMENSION: u32 = 16_384;

/// Configuration for snapshot export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Fill used when the snapshot carries no background color. `None`
    /// leaves the canvas transparent.
    pub default_background: Option<String>,
    /// Scale factor (e.g. 2.0 for retina).
    pub scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_background: None,
            scale: 1.0,
        }
    }
}

/// Renders drawing snapshots to SVG and PNG.
#[derive(Debug, Clone, Default)]
pub struct SnapshotExporter {
    config: ExportConfig,
}

impl SnapshotExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Render the snapshot to PNG bytes on a `width` x `height` canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is out of range or rendering or encoding
    /// fails.
    pub fn render_to_png(
        &self,
        snapshot: &DrawingSnapshot,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(snapshot, width, height)?;
        let pixmap = Self::rasterize_svg(&svg_string)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Render the snapshot to an SVG document.
    ///
    /// Shapes of unknown type are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] if either scaled dimension is zero
    /// or too large.
    pub fn render_to_svg(
        &self,
        snapshot: &DrawingSnapshot,
        width: u32,
        height: u32,
    ) -> RenderResult<String> {
        let (out_w, out_h) = self.output_dimensions(width, height)?;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {width} {height}\">",
        );

        let background = snapshot
            .background
            .as_deref()
            .or(self.config.default_background.as_deref())
            .filter(|color| !color.is_empty());
        if let Some(color) = background {
            let _ = write!(
                svg,
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(color),
            );
        }

        let mut skipped = 0usize;
        for shape in &snapshot.objects {
            if !render_shape_svg(&mut svg, shape) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::debug!("Skipped {skipped} shapes that cannot be rendered");
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn output_dimensions(&self, width: u32, height: u32) -> RenderResult<(u32, u32)> {
        let scale = |v: u32| (v as f32 * self.config.scale).round() as u32;
        let (out_w, out_h) = (scale(width), scale(height));
        if out_w == 0 || out_h == 0 || out_w > MAX_DIMENSION || out_h > MAX_DIMENSION {
            return Err(RenderError::InvalidSize { width, height });
        }
        Ok((out_w, out_h))
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().ceil() as u32;
        let px_h = tree.size().height().ceil() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

/// Append one shape. Returns `false` if the shape was skipped.
fn render_shape_svg(svg: &mut String, shape: &ShapeRecord) -> bool {
    let paint = Paint::of(shape);
    let num = |key: &str| shape.number(key);

    match &shape.kind {
        ShapeKind::Rect => {
            let (Some(x), Some(y), Some(w), Some(h)) =
                (num("left"), num("top"), num("width"), num("height"))
            else {
                return false;
            };
            let _ = write!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\"{paint}/>",
            );
        }
        ShapeKind::Circle => {
            let (Some(cx), Some(cy), Some(r)) = (num("left"), num("top"), num("radius")) else {
                return false;
            };
            let _ = write!(svg, "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\"{paint}/>");
        }
        ShapeKind::Line => {
            let (Some(x1), Some(y1), Some(x2), Some(y2)) =
                (num("x1"), num("y1"), num("x2"), num("y2"))
            else {
                return false;
            };
            let _ = write!(
                svg,
                "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"{paint}/>",
            );
        }
        ShapeKind::Path => {
            let Some(d) = shape.get("path").and_then(path_data) else {
                return false;
            };
            let _ = write!(
                svg,
                "<path d=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"{paint}/>",
                escape_xml(&d),
            );
        }
        ShapeKind::Polygon => {
            let Some(points) = shape.get("points").and_then(polygon_points) else {
                return false;
            };
            let _ = write!(svg, "<polygon points=\"{points}\"{paint}/>");
        }
        ShapeKind::Other(_) => return false,
    }
    true
}

/// Fill and stroke attributes of a shape.
struct Paint<'a> {
    fill: Option<&'a str>,
    stroke: Option<&'a str>,
    stroke_width: f64,
}

impl<'a> Paint<'a> {
    fn of(shape: &'a ShapeRecord) -> Self {
        let color = move |key| shape.text(key).filter(|c| !c.is_empty());
        Self {
            fill: color("fill"),
            stroke: color("stroke"),
            stroke_width: shape.stroke_width(),
        }
    }
}

impl std::fmt::Display for Paint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fill = self.fill.map_or_else(|| "none".to_string(), escape_xml);
        write!(f, " fill=\"{fill}\"")?;
        if let Some(stroke) = self.stroke {
            write!(
                f,
                " stroke=\"{}\" stroke-width=\"{}\"",
                escape_xml(stroke),
                self.stroke_width
            )?;
        }
        Ok(())
    }
}

/// SVG path data from a command list such as `[["M", 1, 2], ["L", 3, 4]]`.
fn path_data(path: &Value) -> Option<String> {
    let mut d = String::new();
    for command in path.as_array()? {
        let parts = command.as_array()?;
        let (op, args) = parts.split_first()?;
        d.push_str(op.as_str()?);
        for arg in args {
            let _ = write!(d, " {}", arg.as_f64()?);
        }
        d.push(' ');
    }
    let d = d.trim_end().to_string();
    (!d.is_empty()).then_some(d)
}

/// SVG `points` list from `[{"x": .., "y": ..}, ..]`.
fn polygon_points(points: &Value) -> Option<String> {
    let pairs = points
        .as_array()?
        .iter()
        .map(|p| Some(format!("{},{}", p.get("x")?.as_f64()?, p.get("y")?.as_f64()?)))
        .collect::<Option<Vec<_>>>()?;
    (pairs.len() >= 2).then(|| pairs.join(" "))
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
