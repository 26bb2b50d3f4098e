//! Screen ↔ document coordinate mapping.
//!
//! The editing core never lays out glyphs. Whatever draws the text implements
//! [`Renderer`] and is handed to the controller for mouse input and to the
//! session for scrolling. Two implementations ship here:
//!
//! - [`ApproxRenderer`]: fixed cell guess (`y / 20`, `x / 8` by default), no
//!   scroll state. Used when nothing real is attached, and in tests.
//! - [`GridRenderer`]: a monospace cell grid with a scrollable viewport that
//!   measures tabs and wide chars by display width.

use aw_text::{Document, Position};
use unicode_width::UnicodeWidthChar;

/// A point in pixels relative to the text area's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Translates between pixels and document positions.
///
/// Returned positions are not clamped; callers pass them through
/// [`Document::clamp_position`].
pub trait Renderer {
    fn screen_to_position(&self, point: ScreenPoint, doc: &Document) -> Position;
    fn position_to_screen(&self, pos: Position, doc: &Document) -> ScreenPoint;
    /// Scroll just enough that `pos` is on screen.
    fn ensure_visible(&mut self, pos: Position, doc: &Document);
    /// Scroll by `delta` lines, positive moving down.
    fn scroll(&mut self, delta: i32);
    /// Columns per tab stop. Renderers that do not expand tabs ignore it.
    fn set_tab_width(&mut self, _tab_width: u8) {}
}

fn to_cells(px: i32, cell: u32) -> usize {
    usize::try_from(px).unwrap_or(0) / cell.max(1) as usize
}

fn to_px(cells: i64, cell: u32) -> i32 {
    let px = cells.saturating_mul(i64::from(cell));
    i32::try_from(px).unwrap_or(if px < 0 { i32::MIN } else { i32::MAX })
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// ApproxRenderer
// ---------------------------------------------------------------------------

pub const DEFAULT_LINE_HEIGHT: u32 = 20;
pub const DEFAULT_CHAR_WIDTH: u32 = 8;

/// Fixed-size cell estimate with no viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproxRenderer {
    pub line_height: u32,
    pub char_width: u32,
}

impl ApproxRenderer {
    #[must_use]
    pub const fn new(line_height: u32, char_width: u32) -> Self {
        Self {
            line_height,
            char_width,
        }
    }
}

impl Default for ApproxRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_HEIGHT, DEFAULT_CHAR_WIDTH)
    }
}

impl Renderer for ApproxRenderer {
    fn screen_to_position(&self, point: ScreenPoint, _doc: &Document) -> Position {
        Position::new(
            to_cells(point.y, self.line_height),
            to_cells(point.x, self.char_width),
        )
    }

    fn position_to_screen(&self, pos: Position, _doc: &Document) -> ScreenPoint {
        ScreenPoint::new(
            to_px(signed(pos.col), self.char_width),
            to_px(signed(pos.line), self.line_height),
        )
    }

    fn ensure_visible(&mut self, _pos: Position, _doc: &Document) {}

    fn scroll(&mut self, _delta: i32) {}
}

// ---------------------------------------------------------------------------
// GridRenderer
// ---------------------------------------------------------------------------

/// Display column of char column `char_col`, expanding tabs to the next
/// multiple of `tab_width` and counting wide chars as two cells.
#[must_use]
pub fn char_col_to_display_col(line: &str, char_col: usize, tab_width: u8) -> usize {
    let tab_w = usize::from(tab_width.max(1));
    line.chars().take(char_col).fold(0, |col, ch| match ch {
        '\t' => (col / tab_w + 1) * tab_w,
        _ => col + ch.width().unwrap_or(0),
    })
}

/// Char column whose cell covers `display_col`. Columns past the end of the
/// line map to the line length.
#[must_use]
pub fn display_col_to_char_col(line: &str, display_col: usize, tab_width: u8) -> usize {
    let tab_w = usize::from(tab_width.max(1));
    let mut col = 0;
    for (i, ch) in line.chars().enumerate() {
        let next = match ch {
            '\t' => (col / tab_w + 1) * tab_w,
            _ => col + ch.width().unwrap_or(0),
        };
        if display_col < next {
            return i;
        }
        col = next;
    }
    line.chars().count()
}

/// Monospace grid with a scrollable viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRenderer {
    cell_width: u32,
    cell_height: u32,
    /// Visible rows and columns.
    rows: usize,
    cols: usize,
    /// First visible line.
    top_line: usize,
    /// Horizontal scroll in display columns.
    left_col: usize,
    tab_width: u8,
}

impl GridRenderer {
    #[must_use]
    pub const fn new(cell_width: u32, cell_height: u32, rows: usize, cols: usize) -> Self {
        Self {
            cell_width,
            cell_height,
            rows,
            cols,
            top_line: 0,
            left_col: 0,
            tab_width: 4,
        }
    }

    #[must_use]
    pub const fn with_tab_width(mut self, tab_width: u8) -> Self {
        self.tab_width = tab_width;
        self
    }

    pub const fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
    }

    #[must_use]
    pub const fn top_line(&self) -> usize {
        self.top_line
    }

    #[must_use]
    pub const fn left_col(&self) -> usize {
        self.left_col
    }

    #[must_use]
    pub const fn tab_width(&self) -> u8 {
        self.tab_width
    }
}

impl Renderer for GridRenderer {
    fn screen_to_position(&self, point: ScreenPoint, doc: &Document) -> Position {
        let line = self.top_line + to_cells(point.y, self.cell_height);
        let display = self.left_col + to_cells(point.x, self.cell_width);
        Position::new(
            line,
            display_col_to_char_col(doc.line(line), display, self.tab_width),
        )
    }

    fn position_to_screen(&self, pos: Position, doc: &Document) -> ScreenPoint {
        let display = char_col_to_display_col(doc.line(pos.line), pos.col, self.tab_width);
        ScreenPoint::new(
            to_px(signed(display) - signed(self.left_col), self.cell_width),
            to_px(signed(pos.line) - signed(self.top_line), self.cell_height),
        )
    }

    fn ensure_visible(&mut self, pos: Position, doc: &Document) {
        if self.rows == 0 || self.cols == 0 {
            return;
        }

        if pos.line < self.top_line {
            self.top_line = pos.line;
        }
        if pos.line >= self.top_line + self.rows {
            self.top_line = pos.line - self.rows + 1;
        }

        let display = char_col_to_display_col(doc.line(pos.line), pos.col, self.tab_width);
        if display < self.left_col {
            self.left_col = display;
        }
        if display >= self.left_col + self.cols {
            self.left_col = display - self.cols + 1;
        }
    }

    fn scroll(&mut self, delta: i32) {
        self.top_line = self
            .top_line
            .saturating_add_signed(isize::try_from(delta).unwrap_or(0));
    }

    fn set_tab_width(&mut self, tab_width: u8) {
        self.tab_width = tab_width;
    }
}
