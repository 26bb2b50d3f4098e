//! One open document and everything that edits it.
//!
//! A [`Session`] owns the [`Document`] together with its controller, undo
//! history, search engine, options and renderer, and exposes the gestures a
//! host window forwards: keys, mouse, clipboard, IME and file commands.
//!
//! # Undo coverage
//!
//! With a single cursor every edit is recorded as a [`Command`], so typing,
//! deletion, paste, cut and replacement are all undoable. Edits made with
//! several cursors (or a rectangular selection) go straight through the
//! controller; the history is cleared afterwards because its positions no
//! longer describe the document.
//!
//! # Modified flag
//!
//! Set by any edit, undo or redo. Cleared by a successful open, reload, save
//! or new file.

use std::fmt;
use std::ops::Range as CharRange;
use std::path::{Path, PathBuf};

use aw_text::{Document, DocumentError, Position, Range};
use thiserror::Error;

use crate::controller::{EditController, Motion};
use crate::history::{Command, UndoManager};
use crate::options::{EditorOptions, OptionError};
use crate::renderer::{ApproxRenderer, Renderer, ScreenPoint};
use crate::search::{SearchEngine, SearchError, SearchResult};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no file name")]
    NoPath,

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// IME text being composed. Shown at the primary cursor, never part of the
/// document until committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    pub text: String,
    /// Char range of the clause currently being converted.
    pub target: CharRange<usize>,
}

impl Composition {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    doc: Document,
    controller: EditController,
    history: UndoManager,
    search: SearchEngine,
    options: EditorOptions,
    renderer: Box<dyn Renderer>,
    /// `renderer` is the built-in fallback sized from `options`.
    fallback_renderer: bool,
    path: Option<PathBuf>,
    modified: bool,
    composition: Composition,
    /// The match `find*` last selected.
    last_match: Option<SearchResult>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("modified", &self.modified)
            .field("lines", &self.doc.line_count())
            .field("cursors", &self.controller.cursors())
            .field("undo", &self.history.undo_count())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    #[must_use]
    pub fn with_options(options: EditorOptions) -> Self {
        Self {
            doc: Document::new(),
            controller: EditController::new(),
            history: UndoManager::with_memory_limit(options.undo_limit),
            search: SearchEngine::new(options.search_options()),
            options,
            renderer: Box::new(ApproxRenderer::new(options.line_height, options.char_width)),
            fallback_renderer: true,
            path: None,
            modified: false,
            composition: Composition::default(),
            last_match: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.doc
    }

    #[inline]
    #[must_use]
    pub const fn controller(&self) -> &EditController {
        &self.controller
    }

    #[must_use]
    pub const fn history(&self) -> &UndoManager {
        &self.history
    }

    #[must_use]
    pub const fn options(&self) -> &EditorOptions {
        &self.options
    }

    #[must_use]
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// The file this session reads from and saves to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True if the document changed since it was last opened or saved.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    #[must_use]
    pub const fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Attach the host's renderer in place of the fallback. Its tab width
    /// follows the `tabstop` option from then on.
    pub fn set_renderer(&mut self, mut renderer: Box<dyn Renderer>) {
        renderer.set_tab_width(self.options.tab_stop);
        self.renderer = renderer;
        self.fallback_renderer = false;
    }

    /// Run a `:set` argument string and push the result into the search
    /// engine, the undo limit and the renderer.
    ///
    /// All or nothing: when any directive fails, no option changes.
    ///
    /// # Errors
    ///
    /// The first directive that fails.
    pub fn set_options(&mut self, args: &str) -> Result<Option<String>, OptionError> {
        let mut options = self.options;
        let shown = options.set(args)?;
        self.options = options;

        self.search.set_options(options.search_options());
        self.history.set_memory_limit(options.undo_limit);
        if self.fallback_renderer {
            self.renderer = Box::new(ApproxRenderer::new(options.line_height, options.char_width));
        }
        self.renderer.set_tab_width(options.tab_stop);
        Ok(shown)
    }

    // -- Files --------------------------------------------------------------

    /// Start over with an empty, unnamed document.
    pub fn new_file(&mut self) {
        self.doc.clear();
        self.path = None;
        self.modified = false;
        self.reset();
        tracing::debug!("new file");
    }

    /// Load `path`. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// [`SessionError::Document`] if the file cannot be read or decoded.
    pub fn open(&mut self, path: &Path) -> Result<(), SessionError> {
        let doc = Document::open(path, &self.options.load_options()).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "open failed");
        })?;
        self.doc = doc;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        self.reset();
        Ok(())
    }

    /// Re-read the current file, keeping cursors where they still fit.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoPath`] for an unnamed document, otherwise as
    /// [`open`](Self::open).
    pub fn reload(&mut self) -> Result<(), SessionError> {
        let path = self.path.as_deref().ok_or(SessionError::NoPath)?;
        self.doc.reload(path, &self.options.load_options())?;
        self.modified = false;
        self.history.clear();
        self.last_match = None;
        self.controller.clamp_to(&self.doc);
        Ok(())
    }

    /// Save to the current path.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoPath`] when the document has never been named, or
    /// [`SessionError::Document`] if the write fails.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        self.save_as(&path)
    }

    /// Save to `path` and make it the current path.
    ///
    /// # Errors
    ///
    /// [`SessionError::Document`] if the write fails; the path and modified
    /// flag are left alone in that case.
    pub fn save_as(&mut self, path: &Path) -> Result<(), SessionError> {
        self.doc.save(path)?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    fn reset(&mut self) {
        self.controller = EditController::new();
        self.history.clear();
        self.composition = Composition::default();
        self.last_match = None;
    }

    // -- Editing ------------------------------------------------------------

    /// Typed character. Control characters other than tab and newline are
    /// ignored.
    pub fn type_char(&mut self, ch: char) {
        if ch.is_control() && ch != '\t' && ch != '\n' {
            return;
        }
        let mut buf = [0; 4];
        self.input(ch.encode_utf8(&mut buf));
    }

    pub fn backspace(&mut self) {
        self.delete(false);
    }

    pub fn delete_forward(&mut self) {
        self.delete(true);
    }

    /// Insert clipboard text over the selection.
    pub fn paste(&mut self, text: &str) {
        if !text.is_empty() {
            self.input(text);
        }
    }

    /// Selected text for the clipboard.
    #[must_use]
    pub fn copy(&self) -> String {
        self.controller.selected_text(&self.doc)
    }

    /// Remove the selection and return it for the clipboard.
    pub fn cut(&mut self) -> String {
        let text = self.copy();
        if text.is_empty() {
            return text;
        }
        match self.single_span() {
            Some(r) => {
                let caret = self.history.execute(Command::delete(r.start, r.end), &mut self.doc);
                self.controller.set_cursor(caret);
            }
            None => {
                self.controller.delete_selection(&mut self.doc);
                self.forget_history();
            }
        }
        self.touch();
        text
    }

    pub fn select_all(&mut self) {
        self.controller.select_all(&self.doc);
    }

    /// Select `start..end` with the cursor at `end`.
    pub fn select_range(&mut self, start: Position, end: Position) {
        self.controller
            .select_range(self.doc.clamp_position(start), self.doc.clamp_position(end));
    }

    /// Update the IME preview. `target` defaults to the whole text and is
    /// clamped to it. Empty text clears the preview.
    pub fn set_composition(&mut self, text: &str, target: Option<CharRange<usize>>) {
        let len = text.chars().count();
        let target = target.unwrap_or(0..len);
        let end = target.end.min(len);
        self.composition = Composition {
            text: text.to_owned(),
            target: target.start.min(end)..end,
        };
    }

    /// Drop the preview and insert the final IME text.
    pub fn commit_composition(&mut self, text: &str) {
        self.composition = Composition::default();
        self.paste(text);
    }

    /// Where the host should place the IME candidate window.
    #[must_use]
    pub fn composition_anchor(&self) -> ScreenPoint {
        self.renderer
            .position_to_screen(self.controller.primary(), &self.doc)
    }

    fn input(&mut self, text: &str) {
        match self.single_span() {
            Some(r) if r.is_empty() => {
                let caret = self.history.execute(Command::insert(r.start, text), &mut self.doc);
                self.controller.set_cursor(caret);
            }
            Some(r) => {
                let caret = self
                    .history
                    .execute(Command::replace(r.start, r.end, text), &mut self.doc);
                self.controller.set_cursor(caret);
            }
            None => {
                self.controller.insert_text(text, &mut self.doc);
                self.forget_history();
            }
        }
        self.touch();
    }

    fn delete(&mut self, forward: bool) {
        let Some(r) = self.single_span() else {
            self.controller.delete_char(forward, &mut self.doc);
            self.forget_history();
            self.touch();
            return;
        };

        let (start, end) = match (r.is_empty(), forward) {
            (false, _) => (r.start, r.end),
            (true, true) => (r.start, Motion::Right.apply(r.start, &self.doc)),
            (true, false) => (Motion::Left.apply(r.start, &self.doc), r.start),
        };
        if start == end {
            self.controller.set_cursor(start);
            return;
        }
        let caret = self.history.execute(Command::delete(start, end), &mut self.doc);
        self.controller.set_cursor(caret);
        self.touch();
    }

    /// The primary selection when the edit can be recorded as one command.
    fn single_span(&self) -> Option<Range> {
        (self.controller.cursors().len() == 1 && self.controller.selections().len() <= 1)
            .then(|| self.controller.selection().range())
    }

    fn forget_history(&mut self) {
        if self.history.can_undo() || self.history.can_redo() {
            tracing::debug!("multi-cursor edit, undo history cleared");
        }
        self.history.clear();
    }

    fn touch(&mut self) {
        self.modified = true;
        self.reveal();
    }

    fn reveal(&mut self) {
        self.renderer
            .ensure_visible(self.controller.primary(), &self.doc);
    }

    // -- Mouse --------------------------------------------------------------

    /// Button press. Shift extends the current selection, Alt starts a
    /// rectangular one.
    pub fn mouse_down(&mut self, point: ScreenPoint, shift: bool, alt: bool) {
        if shift && !alt {
            let pos = self.renderer.screen_to_position(point, &self.doc);
            self.controller.select_to_position(pos, &self.doc);
            return;
        }
        self.controller
            .begin_selection(point, alt, self.renderer.as_ref(), &self.doc);
    }

    pub fn mouse_drag(&mut self, point: ScreenPoint) {
        self.controller
            .update_selection(point, self.renderer.as_ref(), &self.doc);
    }

    pub fn mouse_up(&mut self) {
        self.controller.end_selection();
    }

    /// Wheel: `delta` lines, positive scrolling down.
    pub fn scroll(&mut self, delta: i32) {
        self.renderer.scroll(delta);
    }

    // -- Keys ---------------------------------------------------------------

    /// Arrow keys. With `extend`, the primary cursor's target becomes the
    /// free end of the selection.
    pub fn move_by(&mut self, dx: isize, dy: isize, extend: bool) {
        if extend {
            let p = self.controller.primary();
            let line = p.line.saturating_add_signed(dy).min(self.doc.line_count() - 1);
            let target = self
                .doc
                .clamp_position(Position::new(line, p.col.saturating_add_signed(dx)));
            self.controller.select_to_position(target, &self.doc);
        } else {
            self.controller.move_cursor(dx, dy, &self.doc);
        }
        self.reveal();
    }

    pub fn motion(&mut self, motion: Motion, extend: bool) {
        if extend {
            self.controller.extend_selection(motion, &self.doc);
        } else {
            self.controller.move_by(motion, &self.doc);
        }
        self.reveal();
    }

    pub fn line_start(&mut self, extend: bool) {
        self.motion(Motion::LineStart, extend);
    }

    pub fn line_end(&mut self, extend: bool) {
        self.motion(Motion::LineEnd, extend);
    }

    pub fn add_cursor_above(&mut self) {
        self.controller.add_cursor_above(&self.doc);
    }

    pub fn add_cursor_below(&mut self) {
        self.controller.add_cursor_below(&self.doc);
    }

    // -- Undo ---------------------------------------------------------------

    /// Run and record an arbitrary command. Returns the caret after it.
    pub fn execute(&mut self, command: Command) -> Position {
        let caret = self.history.execute(command, &mut self.doc);
        self.controller.set_cursor(caret);
        self.touch();
        caret
    }

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(caret) = self.history.undo(&mut self.doc) else {
            return false;
        };
        self.after_history(caret);
        true
    }

    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(caret) = self.history.redo(&mut self.doc) else {
            return false;
        };
        self.after_history(caret);
        true
    }

    fn after_history(&mut self, caret: Position) {
        self.controller.set_cursor(self.doc.clamp_position(caret));
        self.last_match = None;
        self.touch();
    }

    // -- Search -------------------------------------------------------------

    /// Search from the primary cursor and select the hit.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPattern`] for a bad regular expression.
    pub fn find(&mut self, pattern: &str) -> Result<Option<SearchResult>, SearchError> {
        self.search.check_pattern(pattern)?;
        let found = self
            .search
            .find(&self.doc, pattern, self.controller.primary());
        Ok(self.show_match(found))
    }

    pub fn find_next(&mut self) -> Option<SearchResult> {
        let found = self.search.find_next(&self.doc);
        self.show_match(found)
    }

    pub fn find_previous(&mut self) -> Option<SearchResult> {
        let found = self.search.find_previous(&self.doc);
        self.show_match(found)
    }

    fn show_match(&mut self, found: Option<SearchResult>) -> Option<SearchResult> {
        if let Some(m) = &found {
            self.controller.select_range(m.start, m.end);
            self.renderer.ensure_visible(m.end, &self.doc);
        }
        self.last_match.clone_from(&found);
        found
    }

    /// Replace the selected match and move on to the next one. Returns
    /// `false` when the selection is not the last match found.
    pub fn replace_selection_match(&mut self, replacement: &str) -> bool {
        let Some(m) = self.last_match.take() else {
            return false;
        };
        let sel = self.controller.selection().range();
        if sel != Range::new(m.start, m.end) || self.doc.text_range(m.start, m.end) != m.matched {
            return false;
        }

        let end = self
            .history
            .execute(Command::replace(m.start, m.end, replacement), &mut self.doc);
        self.controller.set_cursor(end);
        self.search.resume_after(m.start, end);
        self.touch();
        self.find_next();
        true
    }

    /// Replace every match of `pattern` as a single undoable edit. Returns
    /// the number of replacements.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPattern`] for a bad regular expression.
    pub fn replace_all(&mut self, pattern: &str, replacement: &str) -> Result<usize, SearchError> {
        self.search.check_pattern(pattern)?;
        let matches = self.search.find_all(&self.doc, pattern);
        let (Some(first), Some(last)) = (matches.first(), matches.last()) else {
            return Ok(0);
        };

        let mut text = String::new();
        let mut at = first.start;
        for m in &matches {
            text.push_str(&self.doc.text_range(at, m.start));
            text.push_str(replacement);
            at = m.end;
        }

        let caret = self
            .history
            .execute(Command::replace(first.start, last.end, text), &mut self.doc);
        self.controller.set_cursor(caret);
        self.last_match = None;
        self.touch();
        tracing::debug!(pattern, count = matches.len(), "replace all");
        Ok(matches.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
