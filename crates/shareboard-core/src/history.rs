//! Bounded undo history over reversible canvas actions.

use crate::elements::{CanvasElement, ElementId};
use crate::geometry::BoundingBox;
use std::collections::VecDeque;

/// Number of entries kept; pushing past this silently drops the oldest.
pub const HISTORY_CAPACITY: usize = 30;

/// One committed local mutation, carrying exactly what its inverse needs.
#[derive(Debug, Clone)]
pub enum HistoryAction {
    /// An element was committed; the inverse removes it by id.
    Draw { id: ElementId },
    /// Elements were removed; the inverse re-adds these clones.
    Erase { elements: Vec<CanvasElement> },
    /// Elements were translated; the inverse negates the delta.
    Move {
        ids: Vec<ElementId>,
        dx: f64,
        dy: f64,
    },
    /// Elements were rescaled; the inverse maps `after` back onto `before`.
    Resize {
        ids: Vec<ElementId>,
        before: BoundingBox,
        after: BoundingBox,
    },
    /// An element's fields changed; the inverse restores this pre-edit
    /// snapshot.
    Update { before: CanvasElement },
}

/// Bounded LIFO undo log. There is no redo: once popped, an action is gone.
#[derive(Debug, Default)]
pub struct History {
    actions: VecDeque<HistoryAction>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest when past capacity.
    pub fn record(&mut self, action: HistoryAction) {
        self.actions.push_back(action);
        if self.actions.len() > HISTORY_CAPACITY {
            self.actions.pop_front();
        }
    }

    /// Pop the most recent entry.
    pub fn pop(&mut self) -> Option<HistoryAction> {
        self.actions.pop_back()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
