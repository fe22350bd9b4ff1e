//! Text box element.

use super::{Color, ElementId};
use crate::geometry::{BoundingBox, scale_point};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A multi-line text box anchored by a two-corner rectangle.
///
/// The corners stay in drag order (not normalized); `bounding_box` folds
/// them when a canonical box is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBox {
    pub id: ElementId,
    pub text: String,
    pub bounds: BoundingBox,
    pub color: Color,
    #[serde(default)]
    pub fill: Option<Color>,
    pub font_size: f64,
    pub font_face: String,
}

impl TextBox {
    /// Minimum width, as a multiple of the font size.
    pub const MIN_WIDTH_FACTOR: f64 = 12.0;
    /// Minimum height, as a multiple of the font size.
    pub const MIN_HEIGHT_FACTOR: f64 = 8.0;

    /// Create a new text box with a fresh id.
    pub fn new(
        text: String,
        bounds: BoundingBox,
        color: Color,
        fill: Option<Color>,
        font_size: f64,
        font_face: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            bounds,
            color,
            fill,
            font_size,
            font_face,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let min = self.bounds.origin();
        let (w, h) = self.bounds.dimensions();
        BoundingBox::new(min.x, min.y, min.x + w, min.y + h)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.bounds.translate(dx, dy);
    }

    pub fn scale(&mut self, before: &BoundingBox, after: &BoundingBox) {
        let a = scale_point(Point::new(self.bounds.x0, self.bounds.y0), before, after);
        let b = scale_point(Point::new(self.bounds.x1, self.bounds.y1), before, after);
        self.bounds = BoundingBox::from_points(a, b);
    }

    /// Grow the box to the minimum legible size for its font.
    ///
    /// Applied when an edit commits: corners are put in min/max order, then
    /// width and height are extended from the origin to at least 12x and 8x
    /// the font size.
    pub fn normalize_to_min_size(&mut self) {
        let min = self.bounds.origin();
        let (w, h) = self.bounds.dimensions();
        let min_w = Self::MIN_WIDTH_FACTOR * self.font_size;
        let min_h = Self::MIN_HEIGHT_FACTOR * self.font_size;
        self.bounds = BoundingBox::new(
            min.x,
            min.y,
            min.x + w.max(min_w),
            min.y + h.max(min_h),
        );
    }
}
