//! Canvas element definitions.

mod line;
mod text;

pub use line::Line;
pub use text::TextBox;

use crate::geometry::BoundingBox;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for canvas elements. Assigned at creation, preserved
/// across moves/edits/serialization, and never reused after deletion; it is
/// the join key for peer reconciliation.
pub type ElementId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

/// Stroke style for lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
}

/// Enum wrapper for all element types (for serialization and dispatch).
///
/// The plain-data form is a `type` tag plus the variant's field map. An
/// unknown tag fails deserialization of the whole document rather than
/// silently dropping one element, so a corrupt load can never half-apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasElement {
    Line(Line),
    TextBox(TextBox),
}

impl CanvasElement {
    pub fn id(&self) -> ElementId {
        match self {
            CanvasElement::Line(e) => e.id,
            CanvasElement::TextBox(e) => e.id,
        }
    }

    /// Axis-aligned box fully covering the shape, min/max folded regardless
    /// of point order.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            CanvasElement::Line(e) => e.bounding_box(),
            CanvasElement::TextBox(e) => e.bounding_box(),
        }
    }

    /// Translate in place.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            CanvasElement::Line(e) => e.translate(dx, dy),
            CanvasElement::TextBox(e) => e.translate(dx, dy),
        }
    }

    /// Proportionally remap every point from `before`'s coordinate space
    /// into `after`'s. `before` must not be degenerate.
    pub fn scale(&mut self, before: &BoundingBox, after: &BoundingBox) {
        match self {
            CanvasElement::Line(e) => e.scale(before, after),
            CanvasElement::TextBox(e) => e.scale(before, after),
        }
    }

    /// Hit-test against the eraser segment `a`→`b`. Text boxes never report
    /// an intersection; they are only removed via selection delete.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        match self {
            CanvasElement::Line(e) => e.intersects_segment(a, b),
            CanvasElement::TextBox(_) => false,
        }
    }
}
