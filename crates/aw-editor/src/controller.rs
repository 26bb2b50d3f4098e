//! Multi-cursor edit controller.
//!
//! The controller owns the cursor list and the selection list and turns
//! editing intents (type a char, drag a selection, move left) into
//! [`Document`] calls. It never owns the document; every operation borrows
//! it for the duration of the call.
//!
//! # Cursors
//!
//! There is always at least one cursor. Index 0 is the primary cursor: the
//! one selections anchor to and the one the IME follows. Adding a cursor at
//! a position that already holds one does nothing.
//!
//! # Selections
//!
//! In linear mode there is a single selection from the gesture's anchor to
//! the primary cursor. In rectangular mode there is one selection per line
//! between the anchor and the current point, each spanning the same column
//! range, with a cursor at the right edge of each.
//!
//! # Multi-cursor edits
//!
//! Edits run at each cursor in list order and each cursor advances by what
//! was inserted or removed at that cursor only. Two cursors on the same line
//! therefore drift apart after an insertion at the earlier one; callers that
//! need exact same-line behaviour should keep one cursor per line.

use std::collections::HashSet;

use aw_text::{Document, Position};

use crate::renderer::{Renderer, ScreenPoint};
use crate::selection::Selection;

/// Separator placed between pieces when copying several selections.
const PIECE_SEPARATOR: &str = "\r\n";

/// Caret motions shared by plain movement and shift-extended selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
}

impl Motion {
    /// Where `pos` lands after this motion. Left and right wrap across line
    /// ends; up and down keep the column, clamped to the target line.
    #[must_use]
    pub fn apply(self, pos: Position, doc: &Document) -> Position {
        let pos = doc.clamp_position(pos);
        let last = doc.line_count() - 1;
        match self {
            Self::Left if pos.col > 0 => Position::new(pos.line, pos.col - 1),
            Self::Left if pos.line > 0 => Position::new(pos.line - 1, doc.line_len(pos.line - 1)),
            Self::Right if pos.col < doc.line_len(pos.line) => Position::new(pos.line, pos.col + 1),
            Self::Right if pos.line < last => Position::new(pos.line + 1, 0),
            Self::Left | Self::Right => pos,
            Self::Up => doc.clamp_position(Position::new(pos.line.saturating_sub(1), pos.col)),
            Self::Down => doc.clamp_position(Position::new(pos.line + 1, pos.col)),
            Self::LineStart => Position::new(pos.line, 0),
            Self::LineEnd => Position::new(pos.line, doc.line_len(pos.line)),
            Self::DocumentStart => Position::ZERO,
            Self::DocumentEnd => Position::new(last, doc.line_len(last)),
        }
    }
}

// ---------------------------------------------------------------------------
// EditController
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditController {
    cursors: Vec<Position>,
    selections: Vec<Selection>,
    /// Fixed end of the active or most recent selection gesture.
    anchor: Position,
    selecting: bool,
    rectangular: bool,
}

impl Default for EditController {
    fn default() -> Self {
        Self::new()
    }
}

impl EditController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cursors: vec![Position::ZERO],
            selections: Vec::new(),
            anchor: Position::ZERO,
            selecting: false,
            rectangular: false,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn cursors(&self) -> &[Position] {
        &self.cursors
    }

    /// The primary cursor.
    #[must_use]
    pub fn primary(&self) -> Position {
        self.cursors[0]
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The primary selection, or an empty one at the primary cursor.
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selections
            .first()
            .copied()
            .unwrap_or_else(|| Selection::caret(self.primary()))
    }

    #[must_use]
    pub const fn is_selecting(&self) -> bool {
        self.selecting
    }

    #[must_use]
    pub const fn is_rectangular(&self) -> bool {
        self.rectangular
    }

    /// Choose rectangular or linear mode for the next selection gesture.
    pub const fn set_rectangular(&mut self, rectangular: bool) {
        self.rectangular = rectangular;
    }

    // -- Cursor set ---------------------------------------------------------

    /// Collapse to a single cursor at `pos` with no selection.
    pub fn set_cursor(&mut self, pos: Position) {
        self.cursors.clear();
        self.cursors.push(pos);
        self.selections.clear();
    }

    /// Add a cursor unless one already sits at `pos`.
    pub fn add_cursor(&mut self, pos: Position) {
        if !self.cursors.contains(&pos) {
            self.cursors.push(pos);
        }
    }

    /// Drop the newest cursor and the newest selection. The last remaining
    /// cursor is never removed.
    pub fn remove_last_cursor(&mut self) {
        if self.cursors.len() > 1 {
            self.cursors.pop();
            self.selections.pop();
        }
    }

    /// Back to a single cursor at the origin.
    pub fn clear_cursors(&mut self) {
        self.set_cursor(Position::ZERO);
    }

    /// Add a cursor one line above the newest cursor, same column.
    pub fn add_cursor_above(&mut self, doc: &Document) {
        let last = self.last_cursor();
        if last.line > 0 {
            self.add_cursor(doc.clamp_position(Position::new(last.line - 1, last.col)));
        }
    }

    /// Add a cursor one line below the newest cursor, same column.
    pub fn add_cursor_below(&mut self, doc: &Document) {
        let last = self.last_cursor();
        if last.line + 1 < doc.line_count() {
            self.add_cursor(doc.clamp_position(Position::new(last.line + 1, last.col)));
        }
    }

    /// Pull every cursor and selection back inside `doc` after it changed
    /// underneath the controller.
    pub fn clamp_to(&mut self, doc: &Document) {
        for c in &mut self.cursors {
            *c = doc.clamp_position(*c);
        }
        for s in &mut self.selections {
            s.start = doc.clamp_position(s.start);
            s.end = doc.clamp_position(s.end);
        }
        self.anchor = doc.clamp_position(self.anchor);
    }

    fn last_cursor(&self) -> Position {
        self.cursors.last().copied().unwrap_or_default()
    }

    fn dedup_cursors(&mut self) {
        let mut seen = HashSet::with_capacity(self.cursors.len());
        self.cursors.retain(|c| seen.insert(*c));
    }

    // -- Selection gestures -------------------------------------------------

    /// Start a mouse selection at a screen point.
    pub fn begin_selection(
        &mut self,
        point: ScreenPoint,
        rectangular: bool,
        renderer: &dyn Renderer,
        doc: &Document,
    ) {
        let pos = renderer.screen_to_position(point, doc);
        self.begin_selection_at(pos, rectangular, doc);
    }

    /// Start a selection gesture anchored at `pos`.
    pub fn begin_selection_at(&mut self, pos: Position, rectangular: bool, doc: &Document) {
        let pos = doc.clamp_position(pos);
        self.selecting = true;
        self.rectangular = rectangular;
        self.anchor = pos;
        self.set_cursor(pos);
        self.spread_selection(pos);
    }

    /// Move the free end of the active gesture to a screen point.
    pub fn update_selection(&mut self, point: ScreenPoint, renderer: &dyn Renderer, doc: &Document) {
        if self.selecting {
            let pos = renderer.screen_to_position(point, doc);
            self.update_selection_to(pos, doc);
        }
    }

    /// Move the free end of the active gesture to `pos`. Ignored when no
    /// gesture is active.
    pub fn update_selection_to(&mut self, pos: Position, doc: &Document) {
        if self.selecting {
            self.spread_selection(doc.clamp_position(pos));
        }
    }

    pub const fn end_selection(&mut self) {
        self.selecting = false;
    }

    /// Rebuild cursors and selections from the anchor to `current`.
    fn spread_selection(&mut self, current: Position) {
        if !self.rectangular {
            self.cursors[0] = current;
            self.selections.clear();
            self.selections.push(Selection::new(self.anchor, current));
            return;
        }

        let (top, bottom) = (self.anchor.line.min(current.line), self.anchor.line.max(current.line));
        let (left, right) = (self.anchor.col.min(current.col), self.anchor.col.max(current.col));
        self.cursors = (top..=bottom).map(|line| Position::new(line, right)).collect();
        self.selections = (top..=bottom)
            .map(|line| Selection::new(Position::new(line, left), Position::new(line, right)))
            .collect();
    }

    // -- Selection commands -------------------------------------------------

    /// Extend from the current anchor to `pos`: the primary selection's start
    /// when there is one, otherwise the primary cursor.
    pub fn select_to_position(&mut self, pos: Position, doc: &Document) {
        let pos = doc.clamp_position(pos);
        let anchor = self
            .selections
            .first()
            .map_or(self.primary(), |s| s.start);
        self.anchor = anchor;
        self.rectangular = false;
        self.selections.clear();
        self.selections.push(Selection::new(anchor, pos));
        self.cursors[0] = pos;
    }

    /// Shift+motion: move the primary cursor's target and extend to it.
    pub fn extend_selection(&mut self, motion: Motion, doc: &Document) {
        let target = motion.apply(self.primary(), doc);
        self.select_to_position(target, doc);
    }

    /// Select exactly `start..end` with the cursor at `end`.
    pub fn select_range(&mut self, start: Position, end: Position) {
        self.rectangular = false;
        self.anchor = start;
        self.cursors.clear();
        self.cursors.push(end);
        self.selections.clear();
        self.selections.push(Selection::new(start, end));
    }

    pub fn select_all(&mut self, doc: &Document) {
        let last = doc.line_count() - 1;
        self.select_range(Position::ZERO, Position::new(last, doc.line_len(last)));
    }

    /// True when any selection covers at least one char.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.selections.iter().any(|s| !s.is_empty())
    }

    /// Text of every non-empty selection, separated by `\r\n`.
    #[must_use]
    pub fn selected_text(&self, doc: &Document) -> String {
        self.selections
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| doc.text_range(s.start, s.end))
            .collect::<Vec<_>>()
            .join(PIECE_SEPARATOR)
    }

    // -- Editing ------------------------------------------------------------

    pub fn insert_char(&mut self, ch: char, doc: &mut Document) {
        self.take_selection(doc);
        for c in &mut self.cursors {
            *c = doc.insert_char(*c, ch);
        }
    }

    pub fn insert_text(&mut self, text: &str, doc: &mut Document) {
        self.take_selection(doc);
        for c in &mut self.cursors {
            *c = doc.insert_text(*c, text);
        }
    }

    /// Delete the selection, or one char at each cursor when nothing is
    /// selected.
    pub fn delete_char(&mut self, forward: bool, doc: &mut Document) {
        if self.has_selection() {
            self.delete_selection(doc);
            return;
        }
        self.selections.clear();
        for c in &mut self.cursors {
            *c = doc.delete_char(doc.clamp_position(*c), forward);
        }
    }

    /// Clear the way for new text: delete selected text, drop empty carets.
    fn take_selection(&mut self, doc: &mut Document) {
        if self.has_selection() {
            self.delete_selection(doc);
        } else {
            self.selections.clear();
        }
    }

    /// Remove all selected text, last selection first, and collapse each
    /// selection's cursor to the selection's lower end.
    pub fn delete_selection(&mut self, doc: &mut Document) {
        let mut order: Vec<usize> = (0..self.selections.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.selections[i].lower()));
        for i in order {
            let s = self.selections[i];
            if !s.is_empty() {
                doc.delete_range(s.start, s.end);
            }
        }

        for (c, s) in self.cursors.iter_mut().zip(&self.selections) {
            *c = doc.clamp_position(s.lower());
        }
        self.selections.clear();
        self.dedup_cursors();
    }

    // -- Movement -----------------------------------------------------------

    /// Move every cursor `dy` lines then `dx` columns, clamping each step.
    pub fn move_cursor(&mut self, dx: isize, dy: isize, doc: &Document) {
        let last = doc.line_count() - 1;
        for c in &mut self.cursors {
            let line = c.line.saturating_add_signed(dy).min(last);
            let col = c.col.saturating_add_signed(dx).min(doc.line_len(line));
            *c = doc.clamp_position(Position::new(line, col));
        }
        self.after_move();
    }

    /// Apply a motion to every cursor.
    pub fn move_by(&mut self, motion: Motion, doc: &Document) {
        for c in &mut self.cursors {
            *c = motion.apply(*c, doc);
        }
        self.after_move();
    }

    pub fn move_to_line_start(&mut self, doc: &Document) {
        self.move_by(Motion::LineStart, doc);
    }

    pub fn move_to_line_end(&mut self, doc: &Document) {
        self.move_by(Motion::LineEnd, doc);
    }

    pub fn move_to_document_start(&mut self, doc: &Document) {
        self.move_by(Motion::DocumentStart, doc);
    }

    pub fn move_to_document_end(&mut self, doc: &Document) {
        self.move_by(Motion::DocumentEnd, doc);
    }

    fn after_move(&mut self) {
        self.selections.clear();
        self.dedup_cursors();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::ApproxRenderer;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn doc(lines: &[&str]) -> Document {
        Document::from_text(&lines.join("\n"))
    }

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    // -- Cursor set ---------------------------------------------------------

    #[test]
    fn starts_with_one_cursor_at_origin() {
        let c = EditController::new();
        assert_eq!(c.cursors(), [Position::ZERO]);
        assert!(c.selections().is_empty());
        assert!(!c.has_selection());
    }

    #[test]
    fn add_cursor_ignores_duplicates() {
        let mut c = EditController::new();
        c.add_cursor(p(1, 1));
        c.add_cursor(p(1, 1));
        c.add_cursor(Position::ZERO);
        assert_eq!(c.cursors(), [p(0, 0), p(1, 1)]);
    }

    #[test]
    fn remove_last_cursor_keeps_one() {
        let mut c = EditController::new();
        c.add_cursor(p(1, 0));
        c.remove_last_cursor();
        c.remove_last_cursor();
        c.remove_last_cursor();
        assert_eq!(c.cursors(), [Position::ZERO]);
    }

    #[test]
    fn clear_cursors_resets_to_origin() {
        let mut c = EditController::new();
        c.set_cursor(p(3, 3));
        c.add_cursor(p(4, 4));
        c.clear_cursors();
        assert_eq!(c.cursors(), [Position::ZERO]);
    }

    #[test]
    fn add_cursor_above_and_below_follow_last_cursor() {
        let d = doc(&["long line", "ab", "another one"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 6));
        c.add_cursor_below(&d);
        c.add_cursor_below(&d);
        assert_eq!(c.cursors(), [p(0, 6), p(1, 2), p(2, 2)]);

        c.add_cursor_below(&d);
        assert_eq!(c.cursors().len(), 3);
    }

    #[test]
    fn add_cursor_above_at_top_is_noop() {
        let d = doc(&["a", "b"]);
        let mut c = EditController::new();
        c.add_cursor_above(&d);
        assert_eq!(c.cursors(), [Position::ZERO]);

        c.set_cursor(p(1, 1));
        c.add_cursor_above(&d);
        assert_eq!(c.cursors(), [p(1, 1), p(0, 1)]);
    }

    // -- Linear selection ---------------------------------------------------

    #[test]
    fn linear_drag_selects_from_anchor() {
        let d = doc(&["hello", "world"]);
        let mut c = EditController::new();
        c.begin_selection_at(p(0, 2), false, &d);
        c.update_selection_to(p(1, 3), &d);
        c.end_selection();

        assert_eq!(c.selections(), [Selection::new(p(0, 2), p(1, 3))]);
        assert_eq!(c.primary(), p(1, 3));
        assert_eq!(c.selected_text(&d), "llo\r\nwor");
    }

    #[test]
    fn drag_backwards_keeps_anchor_as_start() {
        let d = doc(&["hello"]);
        let mut c = EditController::new();
        c.begin_selection_at(p(0, 4), false, &d);
        c.update_selection_to(p(0, 1), &d);
        assert_eq!(c.selection(), Selection::new(p(0, 4), p(0, 1)));
        assert_eq!(c.selected_text(&d), "ell");
    }

    #[test]
    fn update_without_begin_is_ignored() {
        let d = doc(&["hello"]);
        let mut c = EditController::new();
        c.update_selection_to(p(0, 3), &d);
        assert!(c.selections().is_empty());

        c.begin_selection_at(p(0, 0), false, &d);
        c.end_selection();
        c.update_selection_to(p(0, 3), &d);
        assert!(!c.has_selection());
    }

    #[test]
    fn begin_collapses_extra_cursors() {
        let d = doc(&["abc", "def"]);
        let mut c = EditController::new();
        c.add_cursor(p(1, 1));
        c.begin_selection_at(p(0, 1), false, &d);
        assert_eq!(c.cursors(), [p(0, 1)]);
    }

    #[test]
    fn screen_selection_goes_through_renderer() {
        let d = doc(&["abcdefgh", "ijklmnop"]);
        let r = ApproxRenderer::default();
        let mut c = EditController::new();
        c.begin_selection(ScreenPoint::new(8, 0), false, &r, &d);
        c.update_selection(ScreenPoint::new(40, 25), &r, &d);
        assert_eq!(c.selection(), Selection::new(p(0, 1), p(1, 5)));
    }

    #[test]
    fn screen_points_are_clamped() {
        let d = doc(&["ab"]);
        let r = ApproxRenderer::default();
        let mut c = EditController::new();
        c.begin_selection(ScreenPoint::new(-10, -10), false, &r, &d);
        c.update_selection(ScreenPoint::new(10_000, 10_000), &r, &d);
        assert_eq!(c.selection(), Selection::new(p(0, 0), p(0, 2)));
    }

    // -- Rectangular selection ----------------------------------------------

    #[test]
    fn rectangular_selection_one_per_line() {
        let d = doc(&["abcd", "efgh", "ijkl"]);
        let mut c = EditController::new();
        c.begin_selection_at(p(0, 1), true, &d);
        c.update_selection_to(p(2, 3), &d);

        assert_eq!(
            c.selections(),
            [
                Selection::new(p(0, 1), p(0, 3)),
                Selection::new(p(1, 1), p(1, 3)),
                Selection::new(p(2, 1), p(2, 3)),
            ]
        );
        assert_eq!(c.cursors(), [p(0, 3), p(1, 3), p(2, 3)]);
        assert_eq!(c.selected_text(&d), "bc\r\nfg\r\njk");
    }

    #[test]
    fn rectangular_update_replaces_lists() {
        let d = doc(&["abcd", "efgh", "ijkl"]);
        let mut c = EditController::new();
        c.begin_selection_at(p(2, 3), true, &d);
        c.update_selection_to(p(0, 0), &d);
        assert_eq!(c.selections().len(), 3);

        c.update_selection_to(p(1, 2), &d);
        assert_eq!(
            c.selections(),
            [Selection::new(p(1, 2), p(1, 3)), Selection::new(p(2, 2), p(2, 3))]
        );
        assert_eq!(c.cursors(), [p(1, 3), p(2, 3)]);
    }

    #[test]
    fn rectangular_delete_and_type() {
        let mut d = doc(&["abcd", "efgh", "ijkl"]);
        let mut c = EditController::new();
        c.begin_selection_at(p(0, 1), true, &d);
        c.update_selection_to(p(2, 3), &d);
        c.end_selection();

        c.insert_char('X', &mut d);
        assert_eq!(d.lines(), ["aXd", "eXh", "iXl"]);
        assert_eq!(c.cursors(), [p(0, 2), p(1, 2), p(2, 2)]);
        assert!(c.selections().is_empty());
    }

    // -- Selection commands -------------------------------------------------

    #[test]
    fn select_to_position_uses_cursor_then_keeps_anchor() {
        let d = doc(&["hello world"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 2));
        c.select_to_position(p(0, 5), &d);
        assert_eq!(c.selection(), Selection::new(p(0, 2), p(0, 5)));

        c.select_to_position(p(0, 99), &d);
        assert_eq!(c.selection(), Selection::new(p(0, 2), p(0, 11)));
        assert_eq!(c.primary(), p(0, 11));
    }

    #[test]
    fn extend_selection_with_motions() {
        let d = doc(&["abc", "defgh"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 1));
        c.extend_selection(Motion::Right, &d);
        c.extend_selection(Motion::Down, &d);
        assert_eq!(c.selection(), Selection::new(p(0, 1), p(1, 2)));

        c.extend_selection(Motion::LineEnd, &d);
        assert_eq!(c.selected_text(&d), "bc\r\ndefgh");

        c.extend_selection(Motion::DocumentStart, &d);
        assert_eq!(c.selected_text(&d), "a");
    }

    #[test]
    fn select_all_spans_document() {
        let d = doc(&["ab", "cde"]);
        let mut c = EditController::new();
        c.select_all(&d);
        assert_eq!(c.selection(), Selection::new(p(0, 0), p(1, 3)));
        assert_eq!(c.primary(), p(1, 3));
        assert_eq!(c.selected_text(&d), "ab\r\ncde");
    }

    #[test]
    fn select_all_on_empty_document_is_empty() {
        let mut c = EditController::new();
        c.select_all(&Document::new());
        assert!(!c.has_selection());
        assert_eq!(c.selected_text(&Document::new()), "");
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn insert_newline_splits_line() {
        let mut d = doc(&["abc", "def"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 3));
        c.insert_char('\n', &mut d);
        assert_eq!(d.lines(), ["abc", "", "def"]);
        assert_eq!(c.primary(), p(1, 0));
    }

    #[test]
    fn typing_replaces_selection() {
        let mut d = doc(&["hello world"]);
        let mut c = EditController::new();
        c.select_range(p(0, 6), p(0, 11));
        c.insert_text("there", &mut d);
        assert_eq!(d.lines(), ["hello there"]);
        assert_eq!(c.primary(), p(0, 11));
        assert!(!c.has_selection());
    }

    #[test]
    fn backwards_selection_collapses_to_lower_end() {
        let mut d = doc(&["abc", "def"]);
        let mut c = EditController::new();
        c.select_range(p(1, 2), p(0, 1));
        c.delete_selection(&mut d);
        assert_eq!(d.lines(), ["af"]);
        assert_eq!(c.cursors(), [p(0, 1)]);
    }

    #[test]
    fn delete_char_with_selection_only_deletes_selection() {
        let mut d = doc(&["abcdef"]);
        let mut c = EditController::new();
        c.select_range(p(0, 2), p(0, 4));
        c.delete_char(false, &mut d);
        assert_eq!(d.lines(), ["abef"]);
        assert_eq!(c.primary(), p(0, 2));
    }

    #[test]
    fn backspace_and_delete_at_each_cursor() {
        let mut d = doc(&["abc", "def"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 1));
        c.add_cursor(p(1, 1));
        c.delete_char(false, &mut d);
        assert_eq!(d.lines(), ["bc", "ef"]);
        assert_eq!(c.cursors(), [p(0, 0), p(1, 0)]);

        c.delete_char(true, &mut d);
        assert_eq!(d.lines(), ["c", "f"]);
    }

    #[test]
    fn backspace_at_line_start_joins() {
        let mut d = doc(&["ab", "cd"]);
        let mut c = EditController::new();
        c.set_cursor(p(1, 0));
        c.delete_char(false, &mut d);
        assert_eq!(d.lines(), ["abcd"]);
        assert_eq!(c.primary(), p(0, 2));
    }

    #[test]
    fn multi_cursor_insert_on_separate_lines() {
        let mut d = doc(&["one", "two", "three"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 0));
        c.add_cursor(p(1, 0));
        c.add_cursor(p(2, 0));
        c.insert_text("- ", &mut d);
        assert_eq!(d.lines(), ["- one", "- two", "- three"]);
        assert_eq!(c.cursors(), [p(0, 2), p(1, 2), p(2, 2)]);
    }

    #[test]
    fn same_line_cursors_are_not_recoordinated() {
        let mut d = doc(&["abcd"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 1));
        c.add_cursor(p(0, 3));
        c.insert_char('X', &mut d);
        // The second X was aimed before "d" but lands before "c".
        assert_eq!(d.lines(), ["aXbXcd"]);
        assert_eq!(c.cursors(), [p(0, 2), p(0, 4)]);
    }

    #[test]
    fn multi_selection_copy_joins_pieces() {
        let d = doc(&["abc", "def", "ghi"]);
        let mut c = EditController::new();
        c.begin_selection_at(p(0, 0), true, &d);
        c.update_selection_to(p(2, 1), &d);
        assert_eq!(c.selected_text(&d), "a\r\nd\r\ng");
    }

    // -- Movement -----------------------------------------------------------

    #[test]
    fn move_cursor_line_then_column() {
        let d = doc(&["long line here", "ab", "xyz"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 10));
        c.move_cursor(0, 1, &d);
        assert_eq!(c.primary(), p(1, 2));
        c.move_cursor(1, 1, &d);
        assert_eq!(c.primary(), p(2, 3));
        c.move_cursor(-10, -10, &d);
        assert_eq!(c.primary(), p(0, 0));
    }

    #[test]
    fn movement_clears_selection() {
        let d = doc(&["hello"]);
        let mut c = EditController::new();
        c.select_range(p(0, 0), p(0, 3));
        c.move_cursor(1, 0, &d);
        assert!(c.selections().is_empty());
        assert_eq!(c.primary(), p(0, 4));
    }

    #[test]
    fn line_and_document_ends() {
        let d = doc(&["abc", "de"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 1));
        c.move_to_line_end(&d);
        assert_eq!(c.primary(), p(0, 3));
        c.move_to_line_start(&d);
        assert_eq!(c.primary(), p(0, 0));
        c.move_to_document_end(&d);
        assert_eq!(c.primary(), p(1, 2));
        c.move_to_document_start(&d);
        assert_eq!(c.primary(), p(0, 0));
    }

    #[test]
    fn cursors_that_meet_merge() {
        let d = doc(&["abc", "def"]);
        let mut c = EditController::new();
        c.set_cursor(p(0, 1));
        c.add_cursor(p(1, 2));
        c.move_to_document_start(&d);
        assert_eq!(c.cursors(), [Position::ZERO]);
    }

    #[test]
    fn motion_wraps_across_lines() {
        let d = doc(&["ab", "cd"]);
        assert_eq!(Motion::Left.apply(p(1, 0), &d), p(0, 2));
        assert_eq!(Motion::Right.apply(p(0, 2), &d), p(1, 0));
        assert_eq!(Motion::Right.apply(p(1, 2), &d), p(1, 2));
        assert_eq!(Motion::Left.apply(p(0, 0), &d), p(0, 0));
        assert_eq!(Motion::Up.apply(p(0, 1), &d), p(0, 1));
    }

    #[test]
    fn clamp_to_after_document_shrinks() {
        let mut c = EditController::new();
        c.set_cursor(p(5, 5));
        c.select_range(p(0, 9), p(4, 4));
        c.clamp_to(&doc(&["ab", "c"]));
        assert_eq!(c.primary(), p(1, 1));
        assert_eq!(c.selection(), Selection::new(p(0, 2), p(1, 1)));
    }

    // -- Properties ---------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, usize),
        RemoveLast,
        Clear,
        Type(char),
        Backspace,
        Move(isize, isize),
        Rect(usize, usize, usize, usize),
        AddBelow,
        SelectAll,
        DeleteSelection,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..6, 0usize..8).prop_map(|(l, c)| Op::Add(l, c)),
            Just(Op::RemoveLast),
            Just(Op::Clear),
            prop::sample::select(vec!['a', '\n', 'é']).prop_map(Op::Type),
            Just(Op::Backspace),
            (-3isize..3, -3isize..3).prop_map(|(x, y)| Op::Move(x, y)),
            (0usize..6, 0usize..8, 0usize..6, 0usize..8).prop_map(|(a, b, c, d)| Op::Rect(a, b, c, d)),
            Just(Op::AddBelow),
            Just(Op::SelectAll),
            Just(Op::DeleteSelection),
        ]
    }

    proptest! {
        #[test]
        fn always_at_least_one_cursor(ops in prop::collection::vec(arb_op(), 0..40)) {
            let mut d = doc(&["alpha", "beta", "gamma", "delta"]);
            let mut c = EditController::new();
            for op in ops {
                match op {
                    Op::Add(l, col) => c.add_cursor(d.clamp_position(p(l, col))),
                    Op::RemoveLast => c.remove_last_cursor(),
                    Op::Clear => c.clear_cursors(),
                    Op::Type(ch) => c.insert_char(ch, &mut d),
                    Op::Backspace => c.delete_char(false, &mut d),
                    Op::Move(dx, dy) => c.move_cursor(dx, dy, &d),
                    Op::Rect(l1, c1, l2, c2) => {
                        c.begin_selection_at(p(l1, c1), true, &d);
                        c.update_selection_to(p(l2, c2), &d);
                        c.end_selection();
                    }
                    Op::AddBelow => c.add_cursor_below(&d),
                    Op::SelectAll => c.select_all(&d),
                    Op::DeleteSelection => c.delete_selection(&mut d),
                }
                prop_assert!(!c.cursors().is_empty());
                prop_assert!(d.line_count() >= 1);
            }
        }
    }
}
