//! Line-array document: the text being edited.
//!
//! A `Document` is an ordered list of lines with no terminators stored. There
//! is always at least one line; an empty document is `[""]`.
//!
//! # Line breaks
//!
//! On load, `\r\n`, lone `\r` and lone `\n` each count as exactly one break,
//! and the fragment after the last break is a line even when empty, so
//! `"a\n"` loads as `["a", ""]`. On save every break is written as `\r\n`
//! after a UTF-8 BOM, with nothing after the last line.
//!
//! # Positions
//!
//! Every editing method clamps the positions it is given (see
//! [`clamp_position`](Document::clamp_position)) and returns where the caret
//! belongs afterwards. Reads never panic: [`line`](Document::line) returns
//! `""` past the end.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::encoding::{self, DecodePolicy, Encoding};
use crate::error::{DecodeError, DocumentError};
use crate::position::{Position, Range, char_to_byte};
use crate::source::FileBytes;

/// Files larger than this are memory-mapped instead of read into a buffer.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 10 * 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const LINE_BREAK: &str = "\r\n";

// ---------------------------------------------------------------------------
// LoadOptions
// ---------------------------------------------------------------------------

/// How [`Document::open`] reads and decodes a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Size in bytes above which the file is memory-mapped.
    pub mmap_threshold: u64,
    pub decode: DecodePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            decode: DecodePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    encoding: Encoding,
    lossy: bool,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// An empty document: one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            encoding: Encoding::Utf8,
            lossy: false,
        }
    }

    /// Build a document from already-decoded text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            encoding: Encoding::Utf8,
            lossy: false,
        }
    }

    /// Decode raw file contents.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the decode cascade is exhausted.
    pub fn from_bytes(bytes: &[u8], policy: &DecodePolicy) -> Result<Self, DecodeError> {
        let decoded = encoding::decode(bytes, policy)?;
        Ok(Self {
            lines: split_lines(&decoded.text),
            encoding: decoded.encoding,
            lossy: decoded.lossy,
        })
    }

    /// Load a document from disk.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Read`] if the file cannot be opened, mapped or read;
    /// [`DocumentError::Decode`] if its bytes cannot be decoded.
    pub fn open(path: &Path, options: &LoadOptions) -> Result<Self, DocumentError> {
        let bytes = FileBytes::read(path, options.mmap_threshold)?;
        let doc = Self::from_bytes(&bytes, &options.decode)?;
        tracing::debug!(
            path = %path.display(),
            bytes = bytes.len(),
            mapped = bytes.is_mapped(),
            encoding = %doc.encoding,
            lossy = doc.lossy,
            lines = doc.line_count(),
            "loaded document"
        );
        Ok(doc)
    }

    /// Replace this document's contents with the file at `path`.
    ///
    /// On failure the document is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn reload(&mut self, path: &Path, options: &LoadOptions) -> Result<(), DocumentError> {
        *self = Self::open(path, options)?;
        Ok(())
    }

    /// Reset to a single empty line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines.push(String::new());
        self.encoding = Encoding::Utf8;
        self.lossy = false;
    }

    // -- Saving -------------------------------------------------------------

    /// Write the document to `path` as UTF-8 with BOM and `\r\n` breaks.
    ///
    /// Not transactional: a failure midway may leave a partial file.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Write`] if creating, writing or flushing fails.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let file = File::create(path).map_err(|e| DocumentError::write(path, e))?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)
            .and_then(|()| out.flush())
            .map_err(|e| DocumentError::write(path, e))?;
        tracing::debug!(path = %path.display(), lines = self.line_count(), "saved document");
        Ok(())
    }

    /// The exact bytes [`save`](Self::save) writes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(UTF8_BOM.len() + self.text_len_hint());
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        out.write_all(UTF8_BOM)?;
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.write_all(LINE_BREAK.as_bytes())?;
            }
            out.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn text_len_hint(&self) -> usize {
        self.lines.iter().map(String::len).sum::<usize>()
            + LINE_BREAK.len() * (self.lines.len() - 1)
    }

    // -- Reading ------------------------------------------------------------

    /// Number of lines. Always at least 1.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Content of line `i`, or `""` when `i` is out of bounds.
    #[must_use]
    pub fn line(&self, i: usize) -> &str {
        self.lines.get(i).map_or("", String::as_str)
    }

    /// Length of line `i` in chars, 0 when out of bounds.
    #[must_use]
    pub fn line_len(&self, i: usize) -> usize {
        self.line(i).chars().count()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Encoding the document was decoded from.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Malformed input was replaced while decoding. Saving such a document
    /// does not reproduce the original bytes.
    #[must_use]
    pub const fn is_lossy(&self) -> bool {
        self.lossy
    }

    /// Whole text, lines joined with `\r\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join(LINE_BREAK)
    }

    /// Text between two positions, in either order, lines joined with `\r\n`.
    #[must_use]
    pub fn text_range(&self, a: Position, b: Position) -> String {
        let Range { start, end } = Range::ordered(self.clamp_position(a), self.clamp_position(b));
        let first = &self.lines[start.line];
        let from = char_to_byte(first, start.col);

        if start.line == end.line {
            return first[from..char_to_byte(first, end.col)].to_owned();
        }

        let mut out = String::from(&first[from..]);
        for line in &self.lines[start.line + 1..end.line] {
            out.push_str(LINE_BREAK);
            out.push_str(line);
        }
        let last = &self.lines[end.line];
        out.push_str(LINE_BREAK);
        out.push_str(&last[..char_to_byte(last, end.col)]);
        out
    }

    // -- Positions ----------------------------------------------------------

    /// Pull `pos` inside the document: line into `[0, line_count - 1]`,
    /// column into `[0, line_len]`. Idempotent.
    #[must_use]
    pub fn clamp_position(&self, pos: Position) -> Position {
        let line = pos.line.min(self.lines.len() - 1);
        let col = pos.col.min(self.line_len(line));
        Position::new(line, col)
    }

    #[must_use]
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.line < self.lines.len() && pos.col <= self.line_len(pos.line)
    }

    // -- Editing ------------------------------------------------------------

    /// Insert one char. `\n` or `\r` splits the line at the column.
    /// Returns the position just after the insertion.
    pub fn insert_char(&mut self, pos: Position, ch: char) -> Position {
        let pos = self.clamp_position(pos);
        if ch == '\n' || ch == '\r' {
            return self.split_line(pos);
        }
        let line = &mut self.lines[pos.line];
        line.insert(char_to_byte(line, pos.col), ch);
        Position::new(pos.line, pos.col + 1)
    }

    /// Insert text that may span lines. `\r` is dropped and `\n` breaks.
    /// Returns the position just after the inserted text.
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.clamp_position(pos);
        let text: Cow<'_, str> = if text.contains('\r') {
            Cow::Owned(text.replace('\r', ""))
        } else {
            Cow::Borrowed(text)
        };

        let line = &mut self.lines[pos.line];
        let tail = line.split_off(char_to_byte(line, pos.col));
        let mut pieces = text.split('\n');
        line.push_str(pieces.next().unwrap_or_default());

        let mut rest: Vec<String> = pieces.map(str::to_owned).collect();
        match rest.last_mut() {
            Some(last) => last.push_str(&tail),
            None => line.push_str(&tail),
        }
        let at = pos.line + 1;
        self.lines.splice(at..at, rest);

        pos.advance(&text)
    }

    /// Delete one char next to `pos`.
    ///
    /// Forward removes the char at `pos`, or joins the next line at end of
    /// line. Backward removes the char before `pos`, or joins onto the
    /// previous line at column 0 and returns that line's former end. At the
    /// document's edges, and for positions outside the document, nothing
    /// happens.
    pub fn delete_char(&mut self, pos: Position, forward: bool) -> Position {
        if !self.is_valid_position(pos) {
            return pos;
        }
        let len = self.line_len(pos.line);

        if forward {
            if pos.col < len {
                let line = &mut self.lines[pos.line];
                line.remove(char_to_byte(line, pos.col));
            } else if pos.line + 1 < self.lines.len() {
                let next = self.lines.remove(pos.line + 1);
                self.lines[pos.line].push_str(&next);
            }
            return pos;
        }

        if pos.col > 0 {
            let line = &mut self.lines[pos.line];
            line.remove(char_to_byte(line, pos.col - 1));
            Position::new(pos.line, pos.col - 1)
        } else if pos.line > 0 {
            let current = self.lines.remove(pos.line);
            let prev = &mut self.lines[pos.line - 1];
            let join = Position::new(pos.line - 1, prev.chars().count());
            prev.push_str(&current);
            join
        } else {
            pos
        }
    }

    /// Delete everything between two positions, in either order.
    pub fn delete_range(&mut self, a: Position, b: Position) {
        let Range { start, end } = Range::ordered(self.clamp_position(a), self.clamp_position(b));
        if start == end {
            return;
        }

        let end_line = &self.lines[end.line];
        let tail = end_line[char_to_byte(end_line, end.col)..].to_owned();
        let first = &mut self.lines[start.line];
        first.truncate(char_to_byte(first, start.col));
        first.push_str(&tail);

        if end.line > start.line {
            self.lines.drain(start.line + 1..=end.line);
        }
    }

    /// Delete between two positions and insert `text` at the lower one.
    /// Returns the position just after the inserted text.
    pub fn replace_range(&mut self, a: Position, b: Position, text: &str) -> Position {
        let start = self.clamp_position(a).min(self.clamp_position(b));
        self.delete_range(a, b);
        self.insert_text(start, text)
    }

    fn split_line(&mut self, pos: Position) -> Position {
        let line = &mut self.lines[pos.line];
        let tail = line.split_off(char_to_byte(line, pos.col));
        self.lines.insert(pos.line + 1, tail);
        Position::new(pos.line + 1, 0)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.lines.len())
            .field("encoding", &self.encoding)
            .field("lossy", &self.lossy)
            .finish()
    }
}

/// Split on `\r\n`, `\r` or `\n`. Always yields at least one line.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    lines.push(current);
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
