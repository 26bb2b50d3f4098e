//! Search and replace over a [`Document`].
//!
//! Patterns are literal strings or regular expressions, matched one line at
//! a time; a match never spans a line break. Results carry char columns.
//!
//! # Search flow
//!
//! 1. [`SearchEngine::find`] remembers the pattern and returns the first match
//!    at or after a start position, wrapping to the top when allowed.
//! 2. [`find_next`](SearchEngine::find_next) resumes at the end of the
//!    previous match, so successive hits never overlap.
//! 3. [`find_previous`](SearchEngine::find_previous) walks backwards from the
//!    previous match, column by column.
//!
//! [`find_all`](SearchEngine::find_all) and
//! [`replace_all`](SearchEngine::replace_all) never wrap. Replacements go from
//! the last match to the first so earlier positions stay valid.
//!
//! An invalid regular expression matches nothing; use
//! [`check_pattern`](SearchEngine::check_pattern) to report it.

use aw_text::position::{byte_to_char, char_to_byte};
use aw_text::{Document, Position};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Options & results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchOptions {
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub wrap_around: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            use_regex: false,
            case_sensitive: false,
            whole_word: false,
            wrap_around: true,
        }
    }
}

/// One match: `[start, end)` on a single line, plus the matched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub start: Position,
    pub end: Position,
    pub matched: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// A pattern compiled for one set of options.
enum Matcher {
    Literal {
        needle: Vec<char>,
        fold: bool,
        whole_word: bool,
    },
    Regex(Regex),
}

/// Lowercase `ch` when that yields exactly one char.
fn fold(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(c), None) => c,
        _ => ch,
    }
}

fn is_word_char(ch: Option<&char>) -> bool {
    ch.is_some_and(|c| c.is_alphanumeric())
}

impl Matcher {
    /// `None` for an empty pattern, which never matches.
    fn compile(pattern: &str, options: SearchOptions) -> Result<Option<Self>, SearchError> {
        if pattern.is_empty() {
            return Ok(None);
        }
        if !options.use_regex {
            let fold_case = !options.case_sensitive;
            return Ok(Some(Self::Literal {
                needle: pattern
                    .chars()
                    .map(|c| if fold_case { fold(c) } else { c })
                    .collect(),
                fold: fold_case,
                whole_word: options.whole_word,
            }));
        }

        let source = if options.whole_word {
            format!(r"\b(?:{pattern})\b")
        } else {
            pattern.to_owned()
        };
        RegexBuilder::new(&source)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map(|re| Some(Self::Regex(re)))
            .map_err(|source| SearchError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })
    }

    fn haystack(&self, line: &str) -> Vec<char> {
        match self {
            Self::Literal { fold: true, .. } => line.chars().map(fold).collect(),
            _ => line.chars().collect(),
        }
    }

    /// Literal match of the needle at exactly `col`, boundary rules included.
    fn literal_at(hay: &[char], needle: &[char], whole_word: bool, col: usize) -> bool {
        let end = col + needle.len();
        end <= hay.len()
            && hay[col..end] == *needle
            && (!whole_word
                || (!is_word_char(col.checked_sub(1).and_then(|i| hay.get(i)))
                    && !is_word_char(hay.get(end))))
    }

    /// First match starting at char column `from` or later.
    fn find_in_line(&self, line: &str, from: usize) -> Option<(usize, usize)> {
        match self {
            Self::Literal {
                needle, whole_word, ..
            } => {
                let hay = self.haystack(line);
                let mut col = from;
                while col + needle.len() <= hay.len() {
                    if hay[col..col + needle.len()] == **needle {
                        if Self::literal_at(&hay, needle, *whole_word, col) {
                            return Some((col, col + needle.len()));
                        }
                        // Failed the word test; resume after this occurrence.
                        col += needle.len();
                    } else {
                        col += 1;
                    }
                }
                None
            }
            Self::Regex(re) => {
                if from > line.chars().count() {
                    return None;
                }
                re.find_at(line, char_to_byte(line, from))
                    .map(|m| (byte_to_char(line, m.start()), byte_to_char(line, m.end())))
            }
        }
    }

    /// The match starting at the greatest column below `limit`.
    fn last_before(&self, line: &str, limit: usize) -> Option<(usize, usize)> {
        let len = line.chars().count();
        let upper = limit.min(len + 1);
        match self {
            Self::Literal {
                needle, whole_word, ..
            } => {
                let hay = self.haystack(line);
                (0..upper)
                    .rev()
                    .find(|&col| Self::literal_at(&hay, needle, *whole_word, col))
                    .map(|col| (col, col + needle.len()))
            }
            Self::Regex(re) => (0..upper).rev().find_map(|col| {
                let at = char_to_byte(line, col);
                re.find_at(line, at)
                    .filter(|m| m.start() == at)
                    .map(|m| (col, byte_to_char(line, m.end())))
            }),
        }
    }
}

fn result(doc: &Document, line: usize, (start, end): (usize, usize)) -> SearchResult {
    SearchResult {
        start: Position::new(line, start),
        end: Position::new(line, end),
        matched: doc.line(line).chars().skip(start).take(end - start).collect(),
    }
}

// ---------------------------------------------------------------------------
// SearchEngine
// ---------------------------------------------------------------------------

/// Stateful search: remembers the pattern and where the last match began.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    options: SearchOptions,
    pattern: String,
    /// Start of the last match, or where the last search began.
    cursor: Position,
    /// Where `find_next` resumes: the end of the last match (one column
    /// further for an empty match), or the end of the last replacement.
    resume: Position,
}

impl SearchEngine {
    #[must_use]
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn options(&self) -> SearchOptions {
        self.options
    }

    pub const fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }

    /// The pattern used by the last [`find`](Self::find).
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Where [`find_next`](Self::find_next) and
    /// [`find_previous`](Self::find_previous) continue from.
    #[must_use]
    pub const fn cursor(&self) -> Position {
        self.cursor
    }

    /// Validate `pattern` under the current options.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidPattern`] when regex mode is on and the pattern
    /// does not compile.
    pub fn check_pattern(&self, pattern: &str) -> Result<(), SearchError> {
        Matcher::compile(pattern, self.options).map(|_| ())
    }

    fn matcher(&self, pattern: &str) -> Option<Matcher> {
        match Matcher::compile(pattern, self.options) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "search pattern rejected");
                None
            }
        }
    }

    // -- Navigation ---------------------------------------------------------

    /// First match at or after `start`. With wrap-around, continues from the
    /// top of the document back to `start`.
    pub fn find(&mut self, doc: &Document, pattern: &str, start: Position) -> Option<SearchResult> {
        pattern.clone_into(&mut self.pattern);
        self.cursor = start;
        self.resume = start;
        let found = self.scan_forward(doc, start)?;
        self.settle_on(&found);
        Some(found)
    }

    /// Next match after the end of the previous one.
    pub fn find_next(&mut self, doc: &Document) -> Option<SearchResult> {
        let found = self.scan_forward(doc, self.resume)?;
        self.settle_on(&found);
        Some(found)
    }

    /// Closest match that starts before the previous one.
    pub fn find_previous(&mut self, doc: &Document) -> Option<SearchResult> {
        let found = self.scan_backward(doc, self.cursor)?;
        self.settle_on(&found);
        Some(found)
    }

    fn settle_on(&mut self, found: &SearchResult) {
        self.cursor = found.start;
        self.resume = if found.end > found.start {
            found.end
        } else {
            Position::new(found.end.line, found.end.col + 1)
        };
    }

    fn scan_forward(&self, doc: &Document, start: Position) -> Option<SearchResult> {
        let matcher = self.matcher(&self.pattern)?;
        tracing::trace!(pattern = %self.pattern, %start, "scan forward");

        for line in start.line..doc.line_count() {
            let from = if line == start.line { start.col } else { 0 };
            if let Some(span) = matcher.find_in_line(doc.line(line), from) {
                return Some(result(doc, line, span));
            }
        }

        if !self.options.wrap_around {
            return None;
        }
        for line in 0..=start.line.min(doc.line_count() - 1) {
            if let Some(span) = matcher.find_in_line(doc.line(line), 0) {
                if line < start.line || span.0 < start.col {
                    return Some(result(doc, line, span));
                }
            }
        }
        None
    }

    fn scan_backward(&self, doc: &Document, before: Position) -> Option<SearchResult> {
        let matcher = self.matcher(&self.pattern)?;
        let last = doc.line_count() - 1;
        let before = Position::new(before.line.min(last), before.col);
        tracing::trace!(pattern = %self.pattern, %before, "scan backward");

        for line in (0..=before.line).rev() {
            let limit = if line == before.line { before.col } else { usize::MAX };
            if let Some(span) = matcher.last_before(doc.line(line), limit) {
                return Some(result(doc, line, span));
            }
        }

        if !self.options.wrap_around {
            return None;
        }
        (before.line..=last).rev().find_map(|line| {
            matcher
                .last_before(doc.line(line), usize::MAX)
                .map(|span| result(doc, line, span))
        })
    }

    // -- Bulk ---------------------------------------------------------------

    /// Every match in document order. Never wraps; an empty match advances
    /// one column so the scan always terminates.
    #[must_use]
    pub fn find_all(&self, doc: &Document, pattern: &str) -> Vec<SearchResult> {
        let Some(matcher) = self.matcher(pattern) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (i, text) in doc.lines().iter().enumerate() {
            let len = doc.line_len(i);
            let mut col = 0;
            while col <= len {
                let Some((start, end)) = matcher.find_in_line(text, col) else {
                    break;
                };
                out.push(result(doc, i, (start, end)));
                col = if end > start { end } else { end + 1 };
            }
        }
        out
    }

    /// Replace one match. Returns the position after the replacement, which
    /// is also where the next [`find_next`](Self::find_next) starts.
    pub fn replace(&mut self, doc: &mut Document, found: &SearchResult, replacement: &str) -> Position {
        let end = doc.replace_range(found.start, found.end, replacement);
        self.resume_after(found.start, end);
        end
    }

    /// Record that the match at `start` was replaced by text ending at
    /// `end`, for callers that edit the document themselves.
    pub const fn resume_after(&mut self, start: Position, end: Position) {
        self.cursor = start;
        self.resume = end;
    }

    /// Replace every match of `pattern`, last first. Returns the count.
    pub fn replace_all(&self, doc: &mut Document, pattern: &str, replacement: &str) -> usize {
        let matches = self.find_all(doc, pattern);
        for m in matches.iter().rev() {
            doc.replace_range(m.start, m.end, replacement);
        }
        tracing::debug!(pattern, count = matches.len(), "replace all");
        matches.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
