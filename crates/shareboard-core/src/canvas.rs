//! Canvas state machine.
//!
//! Owns the element pool, the selected working set, the in-progress tool
//! drafts and the undo history, and turns pointer/keyboard input into
//! committed edits. Every committed local mutation is also queued as a
//! [`CommittedEdit`] for the synchronization layer to broadcast; remote
//! edits re-enter through the crate-internal mutation entry points at the
//! bottom of this file and never touch the history log.

use crate::elements::{CanvasElement, ElementId, Line, TextBox};
use crate::geometry::BoundingBox;
use crate::history::{History, HistoryAction};
use crate::selection::{self, SelectionHover};
use crate::tools::{ToolKind, ToolSettings};
use kurbo::Point;
use thiserror::Error;

/// Slope threshold for the straight-line tool: below `1 / SLOPE_SNAP` the
/// draft locks horizontal, above `SLOPE_SNAP` it locks vertical.
const SLOPE_SNAP: f64 = 40.0;

/// Errors from the interaction state machine. These indicate tool-state
/// invariant violations, not recoverable user mistakes.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("selection gesture committed without a drag origin")]
    NoDragOrigin,
}

/// Keyboard input, already mapped by the host (e.g. Ctrl+Z arrives as
/// `Undo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Backspace,
    Escape,
    Delete,
    Undo,
}

/// How the active selection drag will commit on pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionMode {
    Move,
    Resize(SelectionHover),
}

/// A locally committed mutation, queued for the synchronization layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CommittedEdit {
    Draw { elements: Vec<CanvasElement> },
    Erase { ids: Vec<ElementId> },
    Move { ids: Vec<ElementId>, dx: f64, dy: f64 },
    Resize { ids: Vec<ElementId>, before: BoundingBox, after: BoundingBox },
    Update { element: CanvasElement },
}

/// The per-peer canvas: one instance exclusively owns the element pool and
/// history log. Single-threaded by design; handlers run to completion.
#[derive(Debug, Default)]
pub struct CanvasState {
    /// Elements on the canvas that are not currently selected.
    elements: Vec<CanvasElement>,
    /// Elements captured by the active selection.
    selected: Vec<CanvasElement>,
    /// Pointer position as of the last event.
    mouse_position: Point,
    mouse_is_down: bool,
    /// Drag origin for eraser strokes and selection gestures.
    last_mouse_pos: Option<Point>,
    /// A line that is currently being drawn.
    current_line: Option<Line>,
    /// A text box that is currently being edited.
    current_text_box: Option<TextBox>,
    /// Pre-edit snapshot when the text draft re-edits an existing element.
    text_edit_origin: Option<TextBox>,
    /// A selection that is actively being dragged out.
    current_selection: Option<BoundingBox>,
    /// Where the pointer sits relative to the active selection, if anywhere.
    mouse_over_selection: Option<SelectionHover>,
    selection_mode: Option<SelectionMode>,
    history: History,
    /// Local commits not yet drained by the synchronization layer.
    committed: Vec<CommittedEdit>,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read access ---

    /// Every element, selected or not, in no particular order.
    pub fn all_elements(&self) -> impl Iterator<Item = &CanvasElement> {
        self.elements.iter().chain(self.selected.iter())
    }

    pub fn element_count(&self) -> usize {
        self.elements.len() + self.selected.len()
    }

    pub fn unselected_elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    pub fn selected_elements(&self) -> &[CanvasElement] {
        &self.selected
    }

    /// Pointer position as of the last handled event.
    pub fn pointer_position(&self) -> Point {
        self.mouse_position
    }

    pub fn is_pointer_down(&self) -> bool {
        self.mouse_is_down
    }

    pub fn current_line(&self) -> Option<&Line> {
        self.current_line.as_ref()
    }

    pub fn current_text_box(&self) -> Option<&TextBox> {
        self.current_text_box.as_ref()
    }

    pub fn current_selection(&self) -> Option<&BoundingBox> {
        self.current_selection.as_ref()
    }

    pub fn is_editing_text(&self) -> bool {
        self.current_text_box.is_some()
    }

    pub fn hover(&self) -> Option<SelectionHover> {
        self.mouse_over_selection
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Union box of the selected elements, if any are selected.
    pub fn selection_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::union(self.selected.iter().map(|e| e.bounding_box()))
    }

    /// Drain the edits committed since the last call.
    pub fn take_committed(&mut self) -> Vec<CommittedEdit> {
        std::mem::take(&mut self.committed)
    }

    // --- Pointer handlers ---

    pub fn handle_pointer_down(&mut self, pos: Point, tools: &ToolSettings) {
        self.mouse_position = pos;
        self.mouse_is_down = true;

        // An active text draft commits on any pointer-down, whatever the
        // newly chosen tool.
        self.commit_text_draft();

        self.mouse_over_selection = self
            .selection_bounds()
            .and_then(|b| selection::hover_zone(&b, pos));
        if !self.selected.is_empty() && self.mouse_over_selection.is_none() {
            self.clear_selection();
        }

        match tools.active_tool {
            ToolKind::Pencil => {
                self.current_line = Some(Line::new(
                    vec![pos],
                    tools.color,
                    tools.stroke_size,
                    tools.stroke_style,
                ));
            }
            ToolKind::Line => {
                self.current_line = Some(Line::new(
                    vec![pos, pos],
                    tools.color,
                    tools.stroke_size,
                    tools.stroke_style,
                ));
            }
            ToolKind::Eraser => {
                self.last_mouse_pos = Some(pos);
            }
            ToolKind::Text => {
                self.current_text_box = Some(TextBox::new(
                    String::new(),
                    BoundingBox::from_points(pos, pos),
                    tools.color,
                    tools.fill_color,
                    tools.font_size,
                    tools.font_face.clone(),
                ));
            }
            ToolKind::Selection => {
                if let Some(hover) = self.mouse_over_selection {
                    self.last_mouse_pos = Some(pos);
                    self.selection_mode = Some(if hover.is_move() {
                        SelectionMode::Move
                    } else {
                        SelectionMode::Resize(hover)
                    });
                } else {
                    self.current_selection = Some(BoundingBox::from_points(pos, pos));
                }
            }
        }
    }

    pub fn handle_pointer_move(&mut self, pos: Point, tools: &ToolSettings) {
        self.mouse_position = pos;
        if !self.mouse_is_down {
            self.mouse_over_selection = self
                .selection_bounds()
                .and_then(|b| selection::hover_zone(&b, pos));
            return;
        }

        match tools.active_tool {
            ToolKind::Pencil => {
                if let Some(line) = &mut self.current_line {
                    line.push_point(pos);
                }
            }
            ToolKind::Line => {
                if let Some(line) = &mut self.current_line {
                    let start = line.points[0];
                    let slope = (start.y - pos.y) / (start.x - pos.x);
                    let end = if slope.abs() < 1.0 / SLOPE_SNAP {
                        Point::new(pos.x, start.y)
                    } else if slope.abs() > SLOPE_SNAP {
                        Point::new(start.x, pos.y)
                    } else {
                        pos
                    };
                    line.points = vec![start, end];
                }
            }
            ToolKind::Eraser => {
                let Some(origin) = self.last_mouse_pos else {
                    return;
                };
                self.erase_intersecting(origin, pos);
            }
            ToolKind::Text => {
                if let Some(tb) = &mut self.current_text_box {
                    tb.bounds.x1 = pos.x;
                    tb.bounds.y1 = pos.y;
                }
            }
            ToolKind::Selection => {
                if let Some(sel) = &mut self.current_selection {
                    sel.x1 = pos.x;
                    sel.y1 = pos.y;
                }
            }
        }
    }

    pub fn handle_pointer_up(&mut self, pos: Point, tools: &ToolSettings) -> Result<(), CanvasError> {
        self.mouse_position = pos;
        self.mouse_is_down = false;

        match tools.active_tool {
            ToolKind::Pencil | ToolKind::Line => self.commit_line_draft(),
            ToolKind::Eraser => {
                // Erasure was applied incrementally during pointer-move.
                self.last_mouse_pos = None;
            }
            ToolKind::Selection => {
                if let Some(mode) = self.selection_mode.take() {
                    match mode {
                        SelectionMode::Move => self.move_selection(pos)?,
                        SelectionMode::Resize(hover) => self.resize_selection(pos, hover)?,
                    }
                    self.last_mouse_pos = None;
                }
                self.commit_selection_capture();
            }
            ToolKind::Text => {}
        }
        Ok(())
    }

    // --- Keyboard ---

    pub fn handle_key(&mut self, key: KeyInput) {
        if self.current_text_box.is_some() {
            // Global shortcuts are suppressed while editing text.
            self.handle_text_key(key);
            return;
        }
        match key {
            KeyInput::Undo => {
                self.undo();
            }
            KeyInput::Delete if !self.selected.is_empty() => {
                self.delete_selection();
            }
            _ => {}
        }
    }

    fn handle_text_key(&mut self, key: KeyInput) {
        let Some(tb) = self.current_text_box.as_mut() else {
            return;
        };
        match key {
            KeyInput::Enter => tb.text.push('\n'),
            KeyInput::Backspace => {
                tb.text.pop();
            }
            KeyInput::Escape => self.cancel_text_draft(),
            KeyInput::Char(c) => tb.text.push(c),
            KeyInput::Delete | KeyInput::Undo => {}
        }
    }

    // --- Draft commits ---

    fn commit_line_draft(&mut self) {
        let Some(mut line) = self.current_line.take() else {
            return;
        };
        // A click without movement still leaves a mark: a two-point dot.
        if line.points.len() < 2 {
            let Some(&p) = line.points.last() else {
                return;
            };
            line.push_point(p);
        }
        self.history.record(HistoryAction::Draw { id: line.id });
        self.committed.push(CommittedEdit::Draw {
            elements: vec![CanvasElement::Line(line.clone())],
        });
        self.elements.push(CanvasElement::Line(line));
    }

    /// Commit the active text draft, if any. New drafts record a draw; a
    /// draft opened over an existing element records an update carrying the
    /// pre-edit snapshot.
    pub fn commit_text_draft(&mut self) {
        let Some(mut tb) = self.current_text_box.take() else {
            return;
        };
        tb.normalize_to_min_size();
        match self.text_edit_origin.take() {
            Some(before) => {
                self.history.record(HistoryAction::Update {
                    before: CanvasElement::TextBox(before),
                });
                self.committed.push(CommittedEdit::Update {
                    element: CanvasElement::TextBox(tb.clone()),
                });
            }
            None => {
                self.history.record(HistoryAction::Draw { id: tb.id });
                self.committed.push(CommittedEdit::Draw {
                    elements: vec![CanvasElement::TextBox(tb.clone())],
                });
            }
        }
        self.elements.push(CanvasElement::TextBox(tb));
    }

    /// Discard the text draft without committing. When the draft was editing
    /// an existing element, the pre-edit snapshot returns to the pool
    /// untouched.
    pub fn cancel_text_draft(&mut self) {
        self.current_text_box = None;
        if let Some(original) = self.text_edit_origin.take() {
            self.elements.push(CanvasElement::TextBox(original));
        }
    }

    /// Re-open an existing text box for editing. The element leaves the pool
    /// and becomes the active draft; committing records an `update` with the
    /// pre-edit snapshot. Returns false when `id` does not name a text box.
    pub fn begin_text_edit(&mut self, id: ElementId) -> bool {
        self.commit_text_draft();
        let Some(idx) = self
            .elements
            .iter()
            .position(|e| matches!(e, CanvasElement::TextBox(t) if t.id == id))
        else {
            return false;
        };
        if let CanvasElement::TextBox(tb) = self.elements.remove(idx) {
            self.text_edit_origin = Some(tb.clone());
            self.current_text_box = Some(tb);
            true
        } else {
            false
        }
    }

    // --- Eraser ---

    fn erase_intersecting(&mut self, from: Point, to: Point) {
        let (erased, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|e| e.intersects_segment(from, to));
        self.elements = kept;
        if erased.is_empty() {
            return;
        }
        let ids: Vec<ElementId> = erased.iter().map(|e| e.id()).collect();
        self.history.record(HistoryAction::Erase { elements: erased });
        self.committed.push(CommittedEdit::Erase { ids });
    }

    // --- Selection ---

    /// Return all selected elements to the pool and drop the selection.
    pub fn clear_selection(&mut self) {
        selection::release(&mut self.elements, &mut self.selected);
        self.mouse_over_selection = None;
        self.selection_mode = None;
    }

    /// Remove every selected element, recording an erase so the deletion is
    /// undoable.
    pub fn delete_selection(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.selected);
        let ids: Vec<ElementId> = removed.iter().map(|e| e.id()).collect();
        self.history.record(HistoryAction::Erase { elements: removed });
        self.committed.push(CommittedEdit::Erase { ids });
        self.mouse_over_selection = None;
    }

    /// Translate every selected element by the net pointer delta and record
    /// one move entry.
    pub fn move_selection(&mut self, to: Point) -> Result<(), CanvasError> {
        let origin = self.last_mouse_pos.ok_or(CanvasError::NoDragOrigin)?;
        let dx = to.x - origin.x;
        let dy = to.y - origin.y;
        if self.selected.is_empty() {
            return Ok(());
        }
        for e in &mut self.selected {
            e.translate(dx, dy);
        }
        let ids: Vec<ElementId> = self.selected.iter().map(|e| e.id()).collect();
        self.history.record(HistoryAction::Move {
            ids: ids.clone(),
            dx,
            dy,
        });
        self.committed.push(CommittedEdit::Move { ids, dx, dy });
        Ok(())
    }

    /// Rescale every selected element from the selection's union box to the
    /// box the drag produced, and record one resize entry.
    pub fn resize_selection(&mut self, to: Point, anchor: SelectionHover) -> Result<(), CanvasError> {
        if self.last_mouse_pos.is_none() {
            return Err(CanvasError::NoDragOrigin);
        }
        let Some(before) = self.selection_bounds() else {
            return Ok(());
        };
        if before.is_degenerate() {
            log::warn!("ignoring resize of a zero-size selection");
            return Ok(());
        }
        let after = selection::bounds_after_resize(&before, to, &anchor);
        for e in &mut self.selected {
            e.scale(&before, &after);
        }
        let ids: Vec<ElementId> = self.selected.iter().map(|e| e.id()).collect();
        self.history.record(HistoryAction::Resize {
            ids: ids.clone(),
            before,
            after,
        });
        self.committed.push(CommittedEdit::Resize { ids, before, after });
        Ok(())
    }

    /// Run (or re-run) selection capture: a fresh drag-out uses the drafted
    /// box, otherwise the union box of the already-selected elements, so a
    /// moved selection picks up whatever now sits inside it.
    fn commit_selection_capture(&mut self) {
        let bounds = self.current_selection.take().or_else(|| self.selection_bounds());
        let Some(bounds) = bounds else {
            return;
        };
        let mut captured = selection::capture(&mut self.elements, &bounds);
        self.selected.append(&mut captured);
    }

    // --- Undo ---

    /// Pop the most recent history entry and apply its inverse. The inverse
    /// is queued as an ordinary committed edit so the peer converges; remote
    /// edits never enter the history and so are never un-applied here.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.pop() else {
            return false;
        };
        match action {
            HistoryAction::Draw { id } => {
                self.remove_by_ids(&[id]);
                self.committed.push(CommittedEdit::Erase { ids: vec![id] });
            }
            HistoryAction::Erase { elements } => {
                self.committed.push(CommittedEdit::Draw {
                    elements: elements.clone(),
                });
                self.elements.extend(elements);
            }
            HistoryAction::Move { ids, dx, dy } => {
                self.translate_by_ids(&ids, -dx, -dy);
                self.committed.push(CommittedEdit::Move {
                    ids,
                    dx: -dx,
                    dy: -dy,
                });
            }
            HistoryAction::Resize { ids, before, after } => {
                self.scale_by_ids(&ids, &after, &before);
                self.committed.push(CommittedEdit::Resize {
                    ids,
                    before: after,
                    after: before,
                });
            }
            HistoryAction::Update { before } => {
                self.committed.push(CommittedEdit::Update {
                    element: before.clone(),
                });
                self.replace_element(before);
            }
        }
        true
    }

    // --- Shared mutation entry points ---
    //
    // Local tools and the synchronization layer both write through these, so
    // remote edits cannot diverge from local invariants. They walk both
    // working sets: an element the peer touches may be locally selected.

    pub(crate) fn contains_id(&self, id: ElementId) -> bool {
        self.all_elements().any(|e| e.id() == id)
    }

    pub(crate) fn insert_element(&mut self, element: CanvasElement) {
        self.elements.push(element);
    }

    /// Remove matching elements from both working sets; returns how many
    /// were found.
    pub(crate) fn remove_by_ids(&mut self, ids: &[ElementId]) -> usize {
        let before = self.element_count();
        self.elements.retain(|e| !ids.contains(&e.id()));
        self.selected.retain(|e| !ids.contains(&e.id()));
        before - self.element_count()
    }

    /// Translate matching elements; returns how many matched.
    pub(crate) fn translate_by_ids(&mut self, ids: &[ElementId], dx: f64, dy: f64) -> usize {
        let mut matched = 0;
        for e in self.elements.iter_mut().chain(self.selected.iter_mut()) {
            if ids.contains(&e.id()) {
                e.translate(dx, dy);
                matched += 1;
            }
        }
        matched
    }

    /// Rescale matching elements; returns how many matched. A degenerate
    /// source box is rejected wholesale.
    pub(crate) fn scale_by_ids(
        &mut self,
        ids: &[ElementId],
        before: &BoundingBox,
        after: &BoundingBox,
    ) -> usize {
        if before.is_degenerate() {
            log::warn!("ignoring scale from a degenerate source box");
            return 0;
        }
        let mut matched = 0;
        for e in self.elements.iter_mut().chain(self.selected.iter_mut()) {
            if ids.contains(&e.id()) {
                e.scale(before, after);
                matched += 1;
            }
        }
        matched
    }

    /// Replace the full field set of the element with the same id, or append
    /// it when absent (a late-arriving draw).
    pub(crate) fn replace_element(&mut self, element: CanvasElement) {
        let id = element.id();
        if let Some(slot) = self
            .elements
            .iter_mut()
            .chain(self.selected.iter_mut())
            .find(|e| e.id() == id)
        {
            *slot = element;
        } else {
            self.elements.push(element);
        }
    }

    /// Replace the entire pool with a snapshot (peer-join time only). Any
    /// selection is dropped with it.
    pub(crate) fn replace_all(&mut self, elements: Vec<CanvasElement>) {
        self.elements = elements;
        self.selected.clear();
        self.current_selection = None;
        self.mouse_over_selection = None;
        self.selection_mode = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Color, StrokeStyle};
    use crate::history::HISTORY_CAPACITY;

    fn tools(tool: ToolKind) -> ToolSettings {
        ToolSettings::default().with_tool(tool)
    }

    fn draw_line(canvas: &mut CanvasState, from: Point, to: Point) {
        let t = tools(ToolKind::Pencil);
        canvas.handle_pointer_down(from, &t);
        canvas.handle_pointer_move(to, &t);
        canvas.handle_pointer_up(to, &t).unwrap();
    }

    fn select_region(canvas: &mut CanvasState, from: Point, to: Point) {
        let t = tools(ToolKind::Selection);
        canvas.handle_pointer_down(from, &t);
        canvas.handle_pointer_move(to, &t);
        canvas.handle_pointer_up(to, &t).unwrap();
    }

    #[test]
    fn test_pencil_commits_on_pointer_up() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));

        assert_eq!(canvas.element_count(), 1);
        assert!(canvas.current_line().is_none());
        assert!(canvas.can_undo());

        let commits = canvas.take_committed();
        assert!(matches!(&commits[..], [CommittedEdit::Draw { elements }] if elements.len() == 1));
    }

    #[test]
    fn test_pencil_click_without_movement_leaves_a_dot() {
        let mut canvas = CanvasState::new();
        let t = tools(ToolKind::Pencil);
        canvas.handle_pointer_down(Point::new(5.0, 5.0), &t);
        canvas.handle_pointer_up(Point::new(5.0, 5.0), &t).unwrap();

        assert_eq!(canvas.element_count(), 1);
        let CanvasElement::Line(line) = canvas.all_elements().next().unwrap() else {
            panic!("expected a line");
        };
        assert_eq!(line.points.len(), 2);
    }

    #[test]
    fn test_line_tool_snaps_near_horizontal() {
        let mut canvas = CanvasState::new();
        let t = tools(ToolKind::Line);
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(100.0, 1.0), &t);

        let line = canvas.current_line().unwrap();
        assert_eq!(line.points, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
    }

    #[test]
    fn test_line_tool_snaps_near_vertical() {
        let mut canvas = CanvasState::new();
        let t = tools(ToolKind::Line);
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(1.0, 100.0), &t);

        let line = canvas.current_line().unwrap();
        assert_eq!(line.points, vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)]);
    }

    #[test]
    fn test_line_tool_keeps_true_diagonal() {
        let mut canvas = CanvasState::new();
        let t = tools(ToolKind::Line);
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(50.0, 50.0), &t);

        let line = canvas.current_line().unwrap();
        assert_eq!(line.points, vec![Point::new(0.0, 0.0), Point::new(50.0, 50.0)]);
    }

    #[test]
    fn test_eraser_removes_crossing_line_and_records_history() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        canvas.take_committed();
        let history_before = canvas.history_len();

        let t = tools(ToolKind::Eraser);
        canvas.handle_pointer_down(Point::new(10.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(0.0, 10.0), &t);
        canvas.handle_pointer_up(Point::new(0.0, 10.0), &t).unwrap();

        assert_eq!(canvas.element_count(), 0);
        assert_eq!(canvas.history_len(), history_before + 1);
        let commits = canvas.take_committed();
        assert!(matches!(&commits[..], [CommittedEdit::Erase { ids }] if ids.len() == 1));
    }

    #[test]
    fn test_eraser_misses_disjoint_line() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));

        let t = tools(ToolKind::Eraser);
        canvas.handle_pointer_down(Point::new(100.0, 100.0), &t);
        canvas.handle_pointer_move(Point::new(110.0, 100.0), &t);
        canvas.handle_pointer_up(Point::new(110.0, 100.0), &t).unwrap();

        assert_eq!(canvas.element_count(), 1);
    }

    #[test]
    fn test_selection_captures_contained_elements_only() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(10.0, 10.0), Point::new(20.0, 20.0));
        draw_line(&mut canvas, Point::new(200.0, 200.0), Point::new(210.0, 210.0));

        select_region(&mut canvas, Point::new(0.0, 0.0), Point::new(100.0, 100.0));

        assert_eq!(canvas.selected_elements().len(), 1);
        assert_eq!(canvas.unselected_elements().len(), 1);
    }

    #[test]
    fn test_pointer_down_off_selection_clears_it() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(10.0, 10.0), Point::new(20.0, 20.0));
        select_region(&mut canvas, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert_eq!(canvas.selected_elements().len(), 1);

        let t = tools(ToolKind::Selection);
        canvas.handle_pointer_down(Point::new(500.0, 500.0), &t);
        assert!(canvas.selected_elements().is_empty());
        assert_eq!(canvas.unselected_elements().len(), 1);
    }

    #[test]
    fn test_group_move_and_undo() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(10.0, 10.0), Point::new(60.0, 60.0));
        select_region(&mut canvas, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        canvas.take_committed();

        // Drag from the middle of the selection.
        let t = tools(ToolKind::Selection);
        canvas.handle_pointer_down(Point::new(35.0, 35.0), &t);
        canvas.handle_pointer_move(Point::new(65.0, 85.0), &t);
        canvas.handle_pointer_up(Point::new(65.0, 85.0), &t).unwrap();

        let bounds = canvas.selection_bounds().unwrap();
        assert_eq!(bounds, BoundingBox::new(40.0, 60.0, 90.0, 110.0));
        let commits = canvas.take_committed();
        assert!(matches!(
            &commits[..],
            [CommittedEdit::Move { dx, dy, .. }] if *dx == 30.0 && *dy == 50.0
        ));

        assert!(canvas.undo());
        let bounds = canvas.selection_bounds().unwrap();
        assert_eq!(bounds, BoundingBox::new(10.0, 10.0, 60.0, 60.0));
    }

    #[test]
    fn test_group_resize_and_undo() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        select_region(&mut canvas, Point::new(-5.0, -5.0), Point::new(15.0, 15.0));
        canvas.take_committed();

        // Grab the bottom-right corner of the union box (10,10) and drag out.
        let t = tools(ToolKind::Selection);
        canvas.handle_pointer_down(Point::new(9.0, 9.0), &t);
        canvas.handle_pointer_move(Point::new(20.0, 20.0), &t);
        canvas.handle_pointer_up(Point::new(20.0, 20.0), &t).unwrap();

        let bounds = canvas.selection_bounds().unwrap();
        assert!((bounds.x1 - 20.0).abs() < 1e-9);
        assert!((bounds.y1 - 20.0).abs() < 1e-9);

        assert!(canvas.undo());
        let bounds = canvas.selection_bounds().unwrap();
        assert!((bounds.x0 - 0.0).abs() < 1e-9);
        assert!((bounds.x1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_moved_selection_recaptures_covered_elements() {
        let mut canvas = CanvasState::new();
        // A big line and a small one far away.
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        draw_line(&mut canvas, Point::new(100.0, 100.0), Point::new(110.0, 110.0));
        select_region(&mut canvas, Point::new(-1.0, -1.0), Point::new(51.0, 51.0));
        assert_eq!(canvas.selected_elements().len(), 1);

        // Move the selection on top of the small line; it should be captured
        // by the refreshed selection box.
        let t = tools(ToolKind::Selection);
        canvas.handle_pointer_down(Point::new(25.0, 25.0), &t);
        canvas.handle_pointer_move(Point::new(85.0, 85.0), &t);
        canvas.handle_pointer_up(Point::new(85.0, 85.0), &t).unwrap();

        assert_eq!(canvas.selected_elements().len(), 2);
    }

    #[test]
    fn test_move_without_drag_origin_is_an_error() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        select_region(&mut canvas, Point::new(-1.0, -1.0), Point::new(11.0, 11.0));

        assert!(matches!(
            canvas.move_selection(Point::new(50.0, 50.0)),
            Err(CanvasError::NoDragOrigin)
        ));
    }

    #[test]
    fn test_delete_records_an_undoable_erase() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        select_region(&mut canvas, Point::new(-1.0, -1.0), Point::new(11.0, 11.0));

        canvas.handle_key(KeyInput::Delete);
        assert_eq!(canvas.element_count(), 0);

        canvas.handle_key(KeyInput::Undo);
        assert_eq!(canvas.element_count(), 1);
    }

    #[test]
    fn test_undo_draw_removes_exactly_the_drawn_element() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        draw_line(&mut canvas, Point::new(20.0, 20.0), Point::new(30.0, 30.0));

        assert!(canvas.undo());
        assert_eq!(canvas.element_count(), 1);
        let remaining = canvas.all_elements().next().unwrap().bounding_box();
        assert_eq!(remaining, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_undo_erase_restores_the_erased_elements() {
        let mut canvas = CanvasState::new();
        draw_line(&mut canvas, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let id = canvas.all_elements().next().unwrap().id();

        let t = tools(ToolKind::Eraser);
        canvas.handle_pointer_down(Point::new(10.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(0.0, 10.0), &t);
        canvas.handle_pointer_up(Point::new(0.0, 10.0), &t).unwrap();
        assert_eq!(canvas.element_count(), 0);

        assert!(canvas.undo());
        assert_eq!(canvas.element_count(), 1);
        assert_eq!(canvas.all_elements().next().unwrap().id(), id);
    }

    #[test]
    fn test_undo_empty_history_returns_false() {
        let mut canvas = CanvasState::new();
        assert!(!canvas.undo());
    }

    #[test]
    fn test_undo_still_works_after_eviction() {
        let mut canvas = CanvasState::new();
        for i in 0..(HISTORY_CAPACITY + 5) {
            let y = i as f64;
            draw_line(&mut canvas, Point::new(0.0, y), Point::new(10.0, y + 1.0));
        }
        assert_eq!(canvas.history_len(), HISTORY_CAPACITY);
        let count = canvas.element_count();

        // The most recent draw is still invertible.
        assert!(canvas.undo());
        assert_eq!(canvas.element_count(), count - 1);
    }

    #[test]
    fn test_text_draft_keys() {
        let mut canvas = CanvasState::new();
        let t = tools(ToolKind::Text);
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(5.0, 5.0), &t);
        canvas.handle_pointer_up(Point::new(5.0, 5.0), &t).unwrap();

        canvas.handle_key(KeyInput::Char('h'));
        canvas.handle_key(KeyInput::Char('i'));
        canvas.handle_key(KeyInput::Enter);
        canvas.handle_key(KeyInput::Char('x'));
        canvas.handle_key(KeyInput::Backspace);
        assert_eq!(canvas.current_text_box().unwrap().text, "hi\n");

        // Undo is suppressed while editing.
        canvas.handle_key(KeyInput::Undo);
        assert!(canvas.is_editing_text());
    }

    #[test]
    fn test_text_draft_commits_on_next_pointer_down_with_min_size() {
        let mut canvas = CanvasState::new();
        let t = ToolSettings {
            font_size: 24.0,
            ..tools(ToolKind::Text)
        };
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        canvas.handle_pointer_move(Point::new(5.0, 5.0), &t);
        canvas.handle_pointer_up(Point::new(5.0, 5.0), &t).unwrap();
        canvas.handle_key(KeyInput::Char('a'));

        // The next pointer-down commits the draft regardless of tool.
        canvas.handle_pointer_down(Point::new(400.0, 400.0), &tools(ToolKind::Pencil));

        assert!(!canvas.is_editing_text());
        let CanvasElement::TextBox(tb) = canvas
            .all_elements()
            .find(|e| matches!(e, CanvasElement::TextBox(_)))
            .unwrap()
        else {
            panic!("expected a text box");
        };
        assert_eq!(tb.text, "a");
        assert_eq!(tb.bounds, BoundingBox::new(0.0, 0.0, 288.0, 192.0));
    }

    #[test]
    fn test_escape_discards_text_draft() {
        let mut canvas = CanvasState::new();
        let t = tools(ToolKind::Text);
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        canvas.handle_pointer_up(Point::new(0.0, 0.0), &t).unwrap();
        canvas.handle_key(KeyInput::Char('a'));
        canvas.handle_key(KeyInput::Escape);

        assert!(!canvas.is_editing_text());
        assert_eq!(canvas.element_count(), 0);
        assert!(canvas.take_committed().is_empty());
    }

    #[test]
    fn test_edit_existing_text_box_records_update() {
        let mut canvas = CanvasState::new();
        let tb = TextBox::new(
            "old".to_string(),
            BoundingBox::new(0.0, 0.0, 300.0, 200.0),
            Color::black(),
            None,
            20.0,
            "serif".to_string(),
        );
        let id = tb.id;
        canvas.insert_element(CanvasElement::TextBox(tb));

        assert!(canvas.begin_text_edit(id));
        canvas.handle_key(KeyInput::Backspace);
        canvas.handle_key(KeyInput::Backspace);
        canvas.handle_key(KeyInput::Backspace);
        canvas.handle_key(KeyInput::Char('n'));
        canvas.handle_key(KeyInput::Char('e'));
        canvas.handle_key(KeyInput::Char('w'));
        canvas.commit_text_draft();

        let CanvasElement::TextBox(tb) = canvas.all_elements().next().unwrap() else {
            panic!("expected a text box");
        };
        assert_eq!(tb.text, "new");
        assert_eq!(tb.id, id);

        let commits = canvas.take_committed();
        assert!(matches!(&commits[..], [CommittedEdit::Update { element }] if element.id() == id));

        // Undo restores the pre-edit snapshot.
        assert!(canvas.undo());
        let CanvasElement::TextBox(tb) = canvas.all_elements().next().unwrap() else {
            panic!("expected a text box");
        };
        assert_eq!(tb.text, "old");
    }

    #[test]
    fn test_escape_restores_original_when_editing_existing() {
        let mut canvas = CanvasState::new();
        let tb = TextBox::new(
            "keep me".to_string(),
            BoundingBox::new(0.0, 0.0, 300.0, 200.0),
            Color::black(),
            None,
            20.0,
            "serif".to_string(),
        );
        let id = tb.id;
        canvas.insert_element(CanvasElement::TextBox(tb));

        assert!(canvas.begin_text_edit(id));
        canvas.handle_key(KeyInput::Char('!'));
        canvas.handle_key(KeyInput::Escape);

        let CanvasElement::TextBox(tb) = canvas.all_elements().next().unwrap() else {
            panic!("expected a text box");
        };
        assert_eq!(tb.text, "keep me");
        assert!(canvas.take_committed().is_empty());
    }

    #[test]
    fn test_stroke_settings_flow_into_drafts() {
        let mut canvas = CanvasState::new();
        let t = ToolSettings {
            color: Color::new(255, 0, 0, 255),
            stroke_size: 9.0,
            stroke_style: StrokeStyle::Dashed,
            ..tools(ToolKind::Pencil)
        };
        canvas.handle_pointer_down(Point::new(0.0, 0.0), &t);
        let line = canvas.current_line().unwrap();
        assert_eq!(line.color, Color::new(255, 0, 0, 255));
        assert_eq!(line.width, 9.0);
        assert_eq!(line.style, StrokeStyle::Dashed);
    }
}
