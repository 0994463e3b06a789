//! Shape inventory: the ordered list of drawable primitives in a document.

use crate::config::AnimationConfig;
use crate::dom::Document;
use crate::geometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Path,
    Circle,
    Rect,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl ShapeKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "path" => Some(Self::Path),
            "circle" => Some(Self::Circle),
            "rect" => Some(Self::Rect),
            "ellipse" => Some(Self::Ellipse),
            "line" => Some(Self::Line),
            "polyline" => Some(Self::Polyline),
            "polygon" => Some(Self::Polygon),
            _ => None,
        }
    }
}

/// One drawable primitive. `index` is the document-order ordinal, assigned
/// once at build time and never renumbered while the document is alive.
/// `total_length` is 0 when the primitive has no computable path length;
/// such shapes stay in the count and animate via the fallback fade.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Shape {
    pub index: usize,
    pub kind: ShapeKind,
    pub total_length: f64,
    pub original_fill: String,
}

impl Shape {
    pub fn has_length(&self) -> bool {
        self.total_length > 0.0
    }
}

/// Walk the document depth-first and record every drawable primitive.
/// `original_fill` captures the declared fill, falling back to the declared
/// stroke, falling back to the configured stroke color.
pub fn build(doc: &Document, cfg: &AnimationConfig) -> Vec<Shape> {
    let mut shapes = Vec::new();
    doc.root.visit_drawables(&mut |index, el| {
        let Some(kind) = ShapeKind::from_tag(el.local_name()) else {
            return;
        };
        let total_length = match geometry::element_length(el) {
            Some(len) => len,
            None => {
                tracing::debug!(index, tag = el.local_name(), "shape length not computable");
                0.0
            }
        };
        let original_fill = el
            .attr("fill")
            .or_else(|| el.attr("stroke"))
            .unwrap_or(&cfg.stroke_color)
            .to_string();
        shapes.push(Shape {
            index,
            kind,
            total_length,
            original_fill,
        });
    });
    shapes
}
