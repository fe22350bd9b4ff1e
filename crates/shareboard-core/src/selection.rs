//! Selection capture and manipulation.

use crate::elements::CanvasElement;
use crate::geometry::BoundingBox;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Margin (canvas units) within which a pointer counts as hovering a resize
/// edge rather than the selection interior.
pub const EDGE_MARGIN: f64 = 8.0;

/// Horizontal position of the pointer within a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalZone {
    Left,
    Center,
    Right,
}

/// Vertical position of the pointer within a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalZone {
    Top,
    Center,
    Bottom,
}

/// Where the pointer sits inside a selection box. Center-center means a drag
/// moves the selection; any edge zone names the resize anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionHover {
    pub horizontal: HorizontalZone,
    pub vertical: VerticalZone,
}

impl SelectionHover {
    pub fn is_move(&self) -> bool {
        self.horizontal == HorizontalZone::Center && self.vertical == VerticalZone::Center
    }
}

/// Classify `pos` against `bounds`, or `None` when outside (beyond the edge
/// margin).
pub fn hover_zone(bounds: &BoundingBox, pos: Point) -> Option<SelectionHover> {
    let min = bounds.origin();
    let (w, h) = bounds.dimensions();
    let (x0, y0, x1, y1) = (min.x, min.y, min.x + w, min.y + h);

    if pos.x < x0 - EDGE_MARGIN
        || pos.x > x1 + EDGE_MARGIN
        || pos.y < y0 - EDGE_MARGIN
        || pos.y > y1 + EDGE_MARGIN
    {
        return None;
    }

    let horizontal = if pos.x <= x0 + EDGE_MARGIN {
        HorizontalZone::Left
    } else if pos.x >= x1 - EDGE_MARGIN {
        HorizontalZone::Right
    } else {
        HorizontalZone::Center
    };
    let vertical = if pos.y <= y0 + EDGE_MARGIN {
        VerticalZone::Top
    } else if pos.y >= y1 - EDGE_MARGIN {
        VerticalZone::Bottom
    } else {
        VerticalZone::Center
    };
    Some(SelectionHover {
        horizontal,
        vertical,
    })
}

/// One-shot capture: split off the elements of `pool` whose bounding boxes
/// sit inside `bounds`. Captured elements leave the pool; nothing is
/// duplicated.
pub fn capture(pool: &mut Vec<CanvasElement>, bounds: &BoundingBox) -> Vec<CanvasElement> {
    let (selected, rest): (Vec<_>, Vec<_>) = std::mem::take(pool)
        .into_iter()
        .partition(|e| bounds.contains(&e.bounding_box()));
    *pool = rest;
    selected
}

/// Return previously captured elements to the pool, emptying the selection.
pub fn release(pool: &mut Vec<CanvasElement>, selected: &mut Vec<CanvasElement>) {
    pool.append(selected);
}

/// Compute the box a resize drag commits to: anchored edges keep their
/// coordinates and the dragged edges follow the pointer.
pub fn bounds_after_resize(
    before: &BoundingBox,
    pointer: Point,
    hover: &SelectionHover,
) -> BoundingBox {
    let min = before.origin();
    let (w, h) = before.dimensions();
    let (mut x0, mut y0, mut x1, mut y1) = (min.x, min.y, min.x + w, min.y + h);
    match hover.horizontal {
        HorizontalZone::Left => x0 = pointer.x,
        HorizontalZone::Right => x1 = pointer.x,
        HorizontalZone::Center => {}
    }
    match hover.vertical {
        VerticalZone::Top => y0 = pointer.y,
        VerticalZone::Bottom => y1 = pointer.y,
        VerticalZone::Center => {}
    }
    BoundingBox::new(x0, y0, x1, y1)
}
