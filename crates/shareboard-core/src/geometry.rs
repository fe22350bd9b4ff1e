//! Geometry primitives shared by every element.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned box stored as two corner points.
///
/// The corners are kept exactly as they were supplied (drag order), so they
/// may be in either order on either axis. Operations that need a canonical
/// form normalize on the fly instead of mutating the stored corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Normalized minimum corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x0.min(self.x1), self.y0.min(self.y1))
    }

    /// Normalized `(width, height)`.
    pub fn dimensions(&self) -> (f64, f64) {
        ((self.x1 - self.x0).abs(), (self.y1 - self.y0).abs())
    }

    /// True when the box has zero extent on either axis. Degenerate boxes
    /// cannot be used as the source of a scale.
    pub fn is_degenerate(&self) -> bool {
        let (w, h) = self.dimensions();
        w == 0.0 || h == 0.0
    }

    /// Translate both corners in place.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x0 += dx;
        self.y0 += dy;
        self.x1 += dx;
        self.y1 += dy;
    }

    /// Containment test: every point of `other` lies within `self`, after
    /// normalizing the corners of both boxes.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        let outer_min = self.origin();
        let (ow, oh) = self.dimensions();
        let inner_min = other.origin();
        let (iw, ih) = other.dimensions();
        inner_min.x >= outer_min.x
            && inner_min.y >= outer_min.y
            && inner_min.x + iw <= outer_min.x + ow
            && inner_min.y + ih <= outer_min.y + oh
    }

    /// Smallest box covering all of `boxes`, or `None` for an empty set.
    pub fn union<I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = BoundingBox>,
    {
        let mut result: Option<BoundingBox> = None;
        for b in boxes {
            let min = b.origin();
            let (w, h) = b.dimensions();
            result = Some(match result {
                None => BoundingBox::new(min.x, min.y, min.x + w, min.y + h),
                Some(acc) => BoundingBox::new(
                    acc.x0.min(min.x),
                    acc.y0.min(min.y),
                    acc.x1.max(min.x + w),
                    acc.y1.max(min.y + h),
                ),
            });
        }
        result
    }
}

/// True if `a`, `b`, `c` wind clockwise.
fn clockwise(a: Point, b: Point, c: Point) -> bool {
    (b.x - a.x) * (c.y - a.y) > (b.y - a.y) * (c.x - a.x)
}

/// Exact orientation test: segments AB and CD intersect iff the orientation
/// of (A,C,D) differs from (B,C,D) and the orientation of (A,B,C) differs
/// from (A,B,D).
///
/// Collinear and merely-touching segments are not special-cased; the result
/// for those boundary configurations is unspecified.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    clockwise(a, c, d) != clockwise(b, c, d) && clockwise(a, b, c) != clockwise(a, b, d)
}

/// Remap `p` from `before`'s coordinate space into `after`'s.
///
/// The offset from `before`'s normalized origin is scaled per axis by the
/// ratio of the boxes' dimensions, then re-added to `after`'s origin. A
/// zero-width or zero-height `before` makes the ratio undefined (division by
/// zero); callers must reject degenerate source boxes.
pub fn scale_point(p: Point, before: &BoundingBox, after: &BoundingBox) -> Point {
    let b_origin = before.origin();
    let (bw, bh) = before.dimensions();
    let a_origin = after.origin();
    let (aw, ah) = after.dimensions();
    Point::new(
        a_origin.x + (p.x - b_origin.x) * aw / bw,
        a_origin.y + (p.y - b_origin.y) * ah / bh,
    )
}
