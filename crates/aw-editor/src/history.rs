//! Undo/redo history as a linear list of reversible commands.
//!
//! ```text
//!  history:  [c0] [c1] [c2] [c3]
//!                            ^ index = 3
//!            └── undoable ──┘ └ redoable
//! ```
//!
//! [`UndoManager::execute`] drops everything from `index` onward, applies the
//! command and appends it. [`undo`](UndoManager::undo) steps `index` back and
//! reverses that command; [`redo`](UndoManager::redo) re-applies it and steps
//! forward.
//!
//! Each entry carries an estimated size. When the total exceeds the memory
//! limit the oldest entries are evicted from the front, which permanently
//! shortens how far back undo can reach. Redo entries are never evicted
//! before undo entries.
//!
//! The history knows nothing about saved state; tracking whether the document
//! differs from disk is the session's job.

use std::collections::VecDeque;

use aw_text::{Document, Position, Range};

/// Default ceiling for [`UndoManager`] memory: 100 MiB.
pub const DEFAULT_MEMORY_LIMIT: usize = 100 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A reversible edit.
///
/// `Delete` and `Replace` capture the text they remove when they execute, not
/// when they are built, so a command describes *where* to edit and learns
/// *what* it overwrote from the document it runs against. All positions are
/// clamped and ordered on execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert {
        pos: Position,
        text: String,
    },
    Delete {
        start: Position,
        end: Position,
        deleted: String,
    },
    Replace {
        start: Position,
        end: Position,
        old: String,
        new: String,
    },
}

impl Command {
    #[must_use]
    pub fn insert(pos: Position, text: impl Into<String>) -> Self {
        Self::Insert {
            pos,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn delete(start: Position, end: Position) -> Self {
        Self::Delete {
            start,
            end,
            deleted: String::new(),
        }
    }

    #[must_use]
    pub fn replace(start: Position, end: Position, new: impl Into<String>) -> Self {
        Self::Replace {
            start,
            end,
            old: String::new(),
            new: new.into(),
        }
    }

    /// Apply the edit, capturing whatever it overwrites. Returns the caret
    /// position after the edit.
    fn execute(&mut self, doc: &mut Document) -> Position {
        match self {
            Self::Insert { pos, text } => {
                *pos = doc.clamp_position(*pos);
                doc.insert_text(*pos, text)
            }
            Self::Delete {
                start,
                end,
                deleted,
            } => {
                let r = clamped_range(doc, *start, *end);
                (*start, *end) = (r.start, r.end);
                *deleted = doc.text_range(r.start, r.end);
                doc.delete_range(r.start, r.end);
                r.start
            }
            Self::Replace {
                start,
                end,
                old,
                new,
            } => {
                let r = clamped_range(doc, *start, *end);
                (*start, *end) = (r.start, r.end);
                *old = doc.text_range(r.start, r.end);
                doc.replace_range(r.start, r.end, new)
            }
        }
    }

    /// Reverse a previously executed edit. Returns the caret position.
    fn undo(&self, doc: &mut Document) -> Position {
        match self {
            Self::Insert { pos, text } => {
                doc.delete_range(*pos, pos.advance(text));
                *pos
            }
            Self::Delete { start, deleted, .. } => doc.insert_text(*start, deleted),
            Self::Replace {
                start, old, new, ..
            } => doc.replace_range(*start, start.advance(new), old),
        }
    }

    /// Rough heap + inline footprint used for the memory limit.
    fn estimated_size(&self) -> usize {
        let text = match self {
            Self::Insert { text, .. } => text.len(),
            Self::Delete { deleted, .. } => deleted.len(),
            Self::Replace { old, new, .. } => old.len() + new.len(),
        };
        size_of::<Self>() + text
    }
}

fn clamped_range(doc: &Document, a: Position, b: Position) -> Range {
    Range::ordered(doc.clamp_position(a), doc.clamp_position(b))
}

// ---------------------------------------------------------------------------
// UndoManager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    command: Command,
    size: usize,
}

/// Linear undo history with a memory ceiling.
#[derive(Debug, Clone)]
pub struct UndoManager {
    history: VecDeque<Entry>,
    /// Entries before `index` are undoable, the rest redoable.
    index: usize,
    memory_limit: usize,
    memory_used: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_memory_limit(DEFAULT_MEMORY_LIMIT)
    }

    #[must_use]
    pub const fn with_memory_limit(memory_limit: usize) -> Self {
        Self {
            history: VecDeque::new(),
            index: 0,
            memory_limit,
            memory_used: 0,
        }
    }

    // -- Recording ----------------------------------------------------------

    /// Apply `command` to `doc` and record it, discarding any redo entries.
    /// Returns the caret position after the edit.
    pub fn execute(&mut self, mut command: Command, doc: &mut Document) -> Position {
        self.truncate_redo();

        let caret = command.execute(doc);
        tracing::trace!(?command, "execute");

        let size = command.estimated_size();
        self.history.push_back(Entry { command, size });
        self.memory_used += size;
        self.index += 1;

        self.enforce_limit();
        caret
    }

    /// Undo the most recent command. Returns where the caret belongs, or
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Option<Position> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.history[self.index].command.undo(doc))
    }

    /// Re-apply the most recently undone command. Returns where the caret
    /// belongs, or `None` when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Option<Position> {
        let entry = self.history.get_mut(self.index)?;
        let caret = entry.command.execute(doc);
        self.index += 1;
        Some(caret)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.history.clear();
        self.index = 0;
        self.memory_used = 0;
    }

    // -- Queries ------------------------------------------------------------

    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index < self.history.len()
    }

    #[must_use]
    pub const fn undo_count(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.history.len() - self.index
    }

    /// Estimated bytes held by the history.
    #[must_use]
    pub const fn memory_used(&self) -> usize {
        self.memory_used
    }

    #[must_use]
    pub const fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    /// Change the ceiling, evicting old entries right away if needed.
    pub fn set_memory_limit(&mut self, limit: usize) {
        self.memory_limit = limit;
        self.enforce_limit();
    }

    // -- Internals ----------------------------------------------------------

    fn truncate_redo(&mut self) {
        while self.history.len() > self.index {
            if let Some(entry) = self.history.pop_back() {
                self.memory_used -= entry.size;
            }
        }
    }

    fn enforce_limit(&mut self) {
        let mut evicted = 0usize;
        while self.memory_used > self.memory_limit {
            let Some(entry) = self.history.pop_front() else {
                break;
            };
            self.memory_used -= entry.size;
            self.index = self.index.saturating_sub(1);
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.history.len(),
                memory_used = self.memory_used,
                limit = self.memory_limit,
                "undo history over limit"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn doc(lines: &[&str]) -> Document {
        Document::from_text(&lines.join("\n"))
    }

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    // -- Single commands ----------------------------------------------------

    #[test]
    fn undo_insert() {
        let mut d = doc(&["hello"]);
        let mut h = UndoManager::new();
        let caret = h.execute(Command::insert(p(0, 5), " world"), &mut d);
        assert_eq!(caret, p(0, 11));
        assert_eq!(d.lines(), ["hello world"]);

        assert_eq!(h.undo(&mut d), Some(p(0, 5)));
        assert_eq!(d.lines(), ["hello"]);
    }

    #[test]
    fn undo_multiline_insert() {
        let mut d = doc(&["ab"]);
        let mut h = UndoManager::new();
        h.execute(Command::insert(p(0, 1), "x\r\ny\nz"), &mut d);
        assert_eq!(d.lines(), ["ax", "y", "zb"]);
        h.undo(&mut d);
        assert_eq!(d.lines(), ["ab"]);
    }

    #[test]
    fn delete_captures_text_at_execute() {
        let mut d = doc(&["abc", "def"]);
        let mut h = UndoManager::new();
        let caret = h.execute(Command::delete(p(1, 1), p(0, 1)), &mut d);
        assert_eq!(caret, p(0, 1));
        assert_eq!(d.lines(), ["aef"]);

        assert_eq!(h.undo(&mut d), Some(p(1, 1)));
        assert_eq!(d.lines(), ["abc", "def"]);
    }

    #[test]
    fn undo_replace() {
        let mut d = doc(&["one two three"]);
        let mut h = UndoManager::new();
        h.execute(Command::replace(p(0, 4), p(0, 7), "2\n2"), &mut d);
        assert_eq!(d.lines(), ["one 2", "2 three"]);

        h.undo(&mut d);
        assert_eq!(d.lines(), ["one two three"]);

        h.redo(&mut d);
        assert_eq!(d.lines(), ["one 2", "2 three"]);
    }

    #[test]
    fn out_of_range_positions_are_clamped_before_recording() {
        let mut d = doc(&["abc"]);
        let mut h = UndoManager::new();
        h.execute(Command::delete(p(0, 1), p(9, 9)), &mut d);
        assert_eq!(d.lines(), ["a"]);
        h.undo(&mut d);
        assert_eq!(d.lines(), ["abc"]);
    }

    // -- Stack behaviour ----------------------------------------------------

    #[test]
    fn empty_history() {
        let mut d = doc(&["x"]);
        let mut h = UndoManager::new();
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.undo(&mut d), None);
        assert_eq!(h.redo(&mut d), None);
    }

    #[test]
    fn undo_redo_sequence() {
        let mut d = doc(&[""]);
        let mut h = UndoManager::new();
        h.execute(Command::insert(p(0, 0), "a"), &mut d);
        h.execute(Command::insert(p(0, 1), "b"), &mut d);
        h.execute(Command::insert(p(0, 2), "c"), &mut d);
        assert_eq!(h.undo_count(), 3);

        h.undo(&mut d);
        h.undo(&mut d);
        assert_eq!(d.lines(), ["a"]);
        assert_eq!((h.undo_count(), h.redo_count()), (1, 2));

        h.redo(&mut d);
        assert_eq!(d.lines(), ["ab"]);
        assert!(h.can_redo());
    }

    #[test]
    fn execute_truncates_redo_tail() {
        let mut d = doc(&[""]);
        let mut h = UndoManager::new();
        h.execute(Command::insert(p(0, 0), "a"), &mut d);
        h.execute(Command::insert(p(0, 1), "b"), &mut d);
        h.undo(&mut d);

        h.execute(Command::insert(p(0, 1), "z"), &mut d);
        assert!(!h.can_redo());
        assert_eq!(d.lines(), ["az"]);

        h.undo(&mut d);
        h.undo(&mut d);
        assert_eq!(d.lines(), [""]);
        assert!(!h.can_undo());
    }

    #[test]
    fn truncation_releases_memory() {
        let mut d = doc(&[""]);
        let mut h = UndoManager::new();
        h.execute(Command::insert(p(0, 0), "aaaa"), &mut d);
        let one = h.memory_used();
        h.execute(Command::insert(p(0, 4), "bbbb"), &mut d);
        h.undo(&mut d);
        h.execute(Command::insert(p(0, 4), "cccc"), &mut d);
        assert_eq!(h.memory_used(), 2 * one);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut d = doc(&[""]);
        let mut h = UndoManager::new();
        h.execute(Command::insert(p(0, 0), "a"), &mut d);
        h.clear();
        assert!(!h.can_undo());
        assert_eq!(h.memory_used(), 0);
    }

    // -- Memory limit -------------------------------------------------------

    #[test]
    fn oldest_entries_are_evicted() {
        let mut d = doc(&[""]);
        let entry = Command::insert(p(0, 0), "x").estimated_size();
        let mut h = UndoManager::with_memory_limit(entry * 2);

        h.execute(Command::insert(p(0, 0), "a"), &mut d);
        h.execute(Command::insert(p(0, 1), "b"), &mut d);
        h.execute(Command::insert(p(0, 2), "c"), &mut d);
        assert_eq!(h.undo_count(), 2);
        assert!(h.memory_used() <= h.memory_limit());

        h.undo(&mut d);
        h.undo(&mut d);
        assert!(!h.can_undo());
        assert_eq!(d.lines(), ["a"]);
    }

    #[test]
    fn eviction_keeps_redo_entries() {
        let mut d = doc(&[""]);
        let entry = Command::insert(p(0, 0), "x").estimated_size();
        let mut h = UndoManager::new();
        for (i, s) in ["a", "b", "c"].into_iter().enumerate() {
            h.execute(Command::insert(p(0, i), s), &mut d);
        }
        h.undo(&mut d);

        h.set_memory_limit(entry * 2);
        assert_eq!((h.undo_count(), h.redo_count()), (1, 1));
        h.redo(&mut d);
        assert_eq!(d.lines(), ["abc"]);
    }

    #[test]
    fn command_bigger_than_limit_is_not_kept() {
        let mut d = doc(&[""]);
        let mut h = UndoManager::with_memory_limit(8);
        h.execute(Command::insert(p(0, 0), "hello"), &mut d);
        assert_eq!(d.lines(), ["hello"]);
        assert!(!h.can_undo());
        assert_eq!(h.memory_used(), 0);
    }

    // -- Properties ---------------------------------------------------------

    fn arb_doc() -> impl Strategy<Value = Document> {
        prop::collection::vec("[a-cé]{0,5}", 1..5).prop_map(|l| Document::from_text(&l.join("\n")))
    }

    fn arb_pos() -> impl Strategy<Value = Position> {
        (0usize..6, 0usize..7).prop_map(|(l, c)| Position::new(l, c))
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            (arb_pos(), "[xy\n]{0,4}").prop_map(|(p, t)| Command::insert(p, t)),
            (arb_pos(), arb_pos()).prop_map(|(a, b)| Command::delete(a, b)),
            (arb_pos(), arb_pos(), "[xy\n]{0,4}").prop_map(|(a, b, t)| Command::replace(a, b, t)),
        ]
    }

    proptest! {
        #[test]
        fn undo_restores_document(d in arb_doc(), cmd in arb_command()) {
            let mut d = d;
            let before = d.clone();
            let mut h = UndoManager::new();
            h.execute(cmd, &mut d);
            h.undo(&mut d);
            prop_assert_eq!(d.lines(), before.lines());
        }

        #[test]
        fn undo_all_then_redo_all(d in arb_doc(), cmds in prop::collection::vec(arb_command(), 1..8)) {
            let mut d = d;
            let before = d.clone();
            let mut h = UndoManager::new();
            for cmd in cmds {
                h.execute(cmd, &mut d);
            }
            let after = d.clone();

            while h.undo(&mut d).is_some() {}
            prop_assert_eq!(d.lines(), before.lines());

            while h.redo(&mut d).is_some() {}
            prop_assert_eq!(d.lines(), after.lines());
        }
    }
}
