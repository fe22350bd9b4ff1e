//! Line element.

use super::{Color, ElementId, StrokeStyle};
use crate::geometry::{BoundingBox, scale_point, segments_intersect};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stroke on the canvas: an ordered point sequence with stroke styling.
///
/// Both the pencil (many points) and the straight-line tool (exactly two)
/// produce lines. A committed line always carries at least two points; a
/// draft may briefly hold one while the pointer is down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: ElementId,
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f64,
    #[serde(default)]
    pub style: StrokeStyle,
}

impl Line {
    /// Create a new line with a fresh id.
    pub fn new(points: Vec<Point>, color: Color, width: f64, style: StrokeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            color,
            width,
            style,
        }
    }

    pub fn push_point(&mut self, p: Point) {
        self.points.push(p);
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let Some(first) = self.points.first() else {
            return BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        };
        let init = BoundingBox::from_points(*first, *first);
        self.points.iter().fold(init, |acc, p| {
            BoundingBox::new(
                acc.x0.min(p.x),
                acc.y0.min(p.y),
                acc.x1.max(p.x),
                acc.y1.max(p.y),
            )
        })
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    pub fn scale(&mut self, before: &BoundingBox, after: &BoundingBox) {
        for p in &mut self.points {
            *p = scale_point(*p, before, after);
        }
    }

    /// True if any segment of this line crosses the segment `a`→`b`.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        self.points
            .windows(2)
            .any(|w| segments_intersect(w[0], w[1], a, b))
    }
}
