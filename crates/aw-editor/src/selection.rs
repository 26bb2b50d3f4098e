//! Anchor/head selection.

use aw_text::{Position, Range};

/// A selected span. `start` is where the gesture began and may lie after
/// `end`; use [`range`](Self::range) for the ordered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    #[inline]
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty selection at `pos`.
    #[inline]
    #[must_use]
    pub const fn caret(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// The selected span with `start <= end`.
    #[inline]
    #[must_use]
    pub fn range(self) -> Range {
        Range::ordered(self.start, self.end)
    }

    /// The endpoint that comes first in the document.
    #[inline]
    #[must_use]
    pub fn lower(self) -> Position {
        self.start.min(self.end)
    }
}
