//! Editor options and the `:set` system.
//!
//! [`parse_set`] turns `:set` arguments into [`SetDirective`]s and
//! [`EditorOptions::apply`] executes them. A startup file is a list of `set`
//! lines read by [`EditorOptions::from_rc`].
//!
//! # Supported syntax
//!
//! | Syntax           | Effect                        |
//! |------------------|-------------------------------|
//! | `:set option`    | Enable boolean / show value   |
//! | `:set nooption`  | Disable boolean               |
//! | `:set option!`   | Toggle boolean                |
//! | `:set option?`   | Query current value           |
//! | `:set option=V`  | Assign a value                |
//! | `:set`           | Show changed options          |
//! | `:set all`       | Show all options              |
//!
//! # Option names
//!
//! | Full name        | Abbrev | Type    | Default       |
//! |------------------|--------|---------|---------------|
//! | `regex`          | `re`   | bool    | false         |
//! | `ignorecase`     | `ic`   | bool    | true          |
//! | `wholeword`      | `ww`   | bool    | false         |
//! | `wrapscan`       | `ws`   | bool    | true          |
//! | `lossyutf8`      | `lu`   | bool    | true          |
//! | `undolimit`      | `ul`   | integer | 104857600     |
//! | `mmapthreshold`  | `mt`   | integer | 10485760      |
//! | `lineheight`     | `lh`   | integer | 20            |
//! | `charwidth`      | `cw`   | integer | 8             |
//! | `tabstop`        | `ts`   | integer | 4             |
//! | `legacyencoding` | `le`   | string  | windows-1252  |

use aw_text::{DEFAULT_MMAP_THRESHOLD, DecodePolicy, LoadOptions};
use encoding_rs::Encoding as CodePage;
use thiserror::Error;

use crate::history::DEFAULT_MEMORY_LIMIT;
use crate::renderer::{DEFAULT_CHAR_WIDTH, DEFAULT_LINE_HEIGHT};
use crate::search::SearchOptions;

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

/// A parsed `:set` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `:set option`
    On(String),
    /// `:set nooption`
    Off(String),
    /// `:set option!`
    Toggle(String),
    /// `:set option?`
    Query(String),
    /// `:set option=value`
    Assign(String, String),
    /// `:set` with no arguments.
    ShowChanged,
    /// `:set all`
    ShowAll,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("not a boolean option: {0}")]
    NotBoolean(String),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("line {line}: expected `set ...`, found `{text}`")]
    Syntax { line: usize, text: String },
}

// ---------------------------------------------------------------------------
// Option table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opt {
    Regex,
    IgnoreCase,
    WholeWord,
    WrapScan,
    LossyUtf8,
    UndoLimit,
    MmapThreshold,
    LineHeight,
    CharWidth,
    TabStop,
    LegacyEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Number,
    Text,
}

/// (option, full name, abbreviation), in `:set all` order.
const TABLE: &[(Opt, &str, &str)] = &[
    (Opt::Regex, "regex", "re"),
    (Opt::IgnoreCase, "ignorecase", "ic"),
    (Opt::WholeWord, "wholeword", "ww"),
    (Opt::WrapScan, "wrapscan", "ws"),
    (Opt::LossyUtf8, "lossyutf8", "lu"),
    (Opt::UndoLimit, "undolimit", "ul"),
    (Opt::MmapThreshold, "mmapthreshold", "mt"),
    (Opt::LineHeight, "lineheight", "lh"),
    (Opt::CharWidth, "charwidth", "cw"),
    (Opt::TabStop, "tabstop", "ts"),
    (Opt::LegacyEncoding, "legacyencoding", "le"),
];

impl Opt {
    fn lookup(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, full, abbrev)| name == *full || name == *abbrev)
            .map(|(opt, _, _)| *opt)
    }

    fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(opt, _, _)| *opt == self)
            .map_or("", |(_, full, _)| *full)
    }

    const fn kind(self) -> Kind {
        match self {
            Self::Regex | Self::IgnoreCase | Self::WholeWord | Self::WrapScan | Self::LossyUtf8 => {
                Kind::Bool
            }
            Self::UndoLimit
            | Self::MmapThreshold
            | Self::LineHeight
            | Self::CharWidth
            | Self::TabStop => Kind::Number,
            Self::LegacyEncoding => Kind::Text,
        }
    }
}

/// Returns `true` if `name` is a known boolean option (full name or abbreviation).
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    Opt::lookup(name).is_some_and(|o| o.kind() == Kind::Bool)
}

/// Returns `true` if `name` is a known option that takes a value.
#[must_use]
pub fn is_value_option(name: &str) -> bool {
    Opt::lookup(name).is_some_and(|o| o.kind() != Kind::Bool)
}

#[must_use]
pub fn is_known_option(name: &str) -> bool {
    Opt::lookup(name).is_some()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the full `:set` argument string. Empty input is
/// [`SetDirective::ShowChanged`].
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return vec![SetDirective::ShowChanged];
    }
    trimmed.split_whitespace().map(parse_set_arg).collect()
}

/// Parse a single `:set` argument.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if arg == "all" {
        return SetDirective::ShowAll;
    }
    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_owned(), value.to_owned());
    }
    if let Some(name) = arg.strip_suffix('?') {
        return SetDirective::Query(name.to_owned());
    }
    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_owned());
    }
    // Only a known boolean after "no" negates, so `nothing` stays unknown.
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return SetDirective::Off(name.to_owned());
        }
    }
    // A bare value option shows its value.
    if is_value_option(arg) {
        return SetDirective::Query(arg.to_owned());
    }
    SetDirective::On(arg.to_owned())
}

/// `"name"` when true, `"noname"` when false.
#[must_use]
pub fn format_bool(name: &str, value: bool) -> String {
    if value {
        name.to_owned()
    } else {
        format!("no{name}")
    }
}

// ---------------------------------------------------------------------------
// EditorOptions
// ---------------------------------------------------------------------------

/// Every configurable knob of the editing core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EditorOptions {
    pub regex: bool,
    pub ignore_case: bool,
    pub whole_word: bool,
    pub wrap_scan: bool,
    pub lossy_utf8: bool,
    /// Undo history ceiling in bytes.
    pub undo_limit: usize,
    /// Files above this many bytes are memory-mapped.
    pub mmap_threshold: u64,
    /// Fallback cell height in pixels.
    pub line_height: u32,
    /// Fallback cell width in pixels.
    pub char_width: u32,
    pub tab_stop: u8,
    pub legacy_encoding: &'static CodePage,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            regex: false,
            ignore_case: true,
            whole_word: false,
            wrap_scan: true,
            lossy_utf8: true,
            undo_limit: DEFAULT_MEMORY_LIMIT,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            line_height: DEFAULT_LINE_HEIGHT,
            char_width: DEFAULT_CHAR_WIDTH,
            tab_stop: 4,
            legacy_encoding: encoding_rs::WINDOWS_1252,
        }
    }
}

impl EditorOptions {
    /// Build options from a startup file: one `set ...` per line, blank
    /// lines and `"` comments ignored.
    ///
    /// # Errors
    ///
    /// The first line that is not a `set` command, or the first directive
    /// that fails to apply.
    pub fn from_rc(text: &str) -> Result<Self, OptionError> {
        let mut options = Self::default();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('"') {
                continue;
            }
            let args = line
                .strip_prefix(':')
                .unwrap_or(line)
                .strip_prefix("set")
                .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
                .ok_or_else(|| OptionError::Syntax {
                    line: i + 1,
                    text: line.to_owned(),
                })?;
            options.set(args)?;
        }
        Ok(options)
    }

    /// Run a whole `:set` argument string. Returns the text to show the
    /// user, if any directive produced output.
    ///
    /// # Errors
    ///
    /// Stops at the first directive that fails.
    pub fn set(&mut self, args: &str) -> Result<Option<String>, OptionError> {
        let mut shown = Vec::new();
        for directive in parse_set(args) {
            if let Some(text) = self.apply(&directive)? {
                shown.push(text);
            }
        }
        Ok((!shown.is_empty()).then(|| shown.join("  ")))
    }

    /// Execute one directive.
    ///
    /// # Errors
    ///
    /// [`OptionError::Unknown`] for unrecognized names,
    /// [`OptionError::NotBoolean`] for on/off/toggle on a value option, and
    /// [`OptionError::InvalidValue`] for assignments that do not parse.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<Option<String>, OptionError> {
        match directive {
            SetDirective::On(name) => self.set_bool(name, |_| true).map(|()| None),
            SetDirective::Off(name) => self.set_bool(name, |_| false).map(|()| None),
            SetDirective::Toggle(name) => self.set_bool(name, |v| !v).map(|()| None),
            SetDirective::Query(name) => Ok(Some(self.show(known(name)?))),
            SetDirective::Assign(name, value) => self.assign(known(name)?, value).map(|()| None),
            SetDirective::ShowChanged => {
                let defaults = Self::default();
                Ok(Some(self.show_where(|opt| self.show(opt) != defaults.show(opt))))
            }
            SetDirective::ShowAll => Ok(Some(self.show_where(|_| true))),
        }
    }

    /// Search options derived from `regex`, `ignorecase`, `wholeword` and
    /// `wrapscan`.
    #[must_use]
    pub const fn search_options(&self) -> SearchOptions {
        SearchOptions {
            use_regex: self.regex,
            case_sensitive: !self.ignore_case,
            whole_word: self.whole_word,
            wrap_around: self.wrap_scan,
        }
    }

    #[must_use]
    pub const fn load_options(&self) -> LoadOptions {
        LoadOptions {
            mmap_threshold: self.mmap_threshold,
            decode: DecodePolicy {
                lossy_utf8: self.lossy_utf8,
                legacy: self.legacy_encoding,
            },
        }
    }

    fn bool_mut(&mut self, opt: Opt) -> Option<&mut bool> {
        match opt {
            Opt::Regex => Some(&mut self.regex),
            Opt::IgnoreCase => Some(&mut self.ignore_case),
            Opt::WholeWord => Some(&mut self.whole_word),
            Opt::WrapScan => Some(&mut self.wrap_scan),
            Opt::LossyUtf8 => Some(&mut self.lossy_utf8),
            _ => None,
        }
    }

    fn set_bool(&mut self, name: &str, f: impl FnOnce(bool) -> bool) -> Result<(), OptionError> {
        let opt = known(name)?;
        let slot = self
            .bool_mut(opt)
            .ok_or_else(|| OptionError::NotBoolean(name.to_owned()))?;
        *slot = f(*slot);
        tracing::debug!(option = opt.name(), value = *slot, "option set");
        Ok(())
    }

    fn assign(&mut self, opt: Opt, value: &str) -> Result<(), OptionError> {
        let invalid = || OptionError::InvalidValue {
            name: opt.name().to_owned(),
            value: value.to_owned(),
        };
        match opt {
            Opt::UndoLimit => self.undo_limit = value.parse().map_err(|_| invalid())?,
            Opt::MmapThreshold => self.mmap_threshold = value.parse().map_err(|_| invalid())?,
            Opt::LineHeight => self.line_height = parse_nonzero(value).ok_or_else(invalid)?,
            Opt::CharWidth => self.char_width = parse_nonzero(value).ok_or_else(invalid)?,
            Opt::TabStop => self.tab_stop = parse_nonzero(value).ok_or_else(invalid)?,
            Opt::LegacyEncoding => {
                self.legacy_encoding = CodePage::for_label(value.as_bytes()).ok_or_else(invalid)?;
            }
            _ => return Err(invalid()),
        }
        tracing::debug!(option = opt.name(), value, "option set");
        Ok(())
    }

    fn show(&self, opt: Opt) -> String {
        let name = opt.name();
        match opt {
            Opt::Regex => format_bool(name, self.regex),
            Opt::IgnoreCase => format_bool(name, self.ignore_case),
            Opt::WholeWord => format_bool(name, self.whole_word),
            Opt::WrapScan => format_bool(name, self.wrap_scan),
            Opt::LossyUtf8 => format_bool(name, self.lossy_utf8),
            Opt::UndoLimit => format!("{name}={}", self.undo_limit),
            Opt::MmapThreshold => format!("{name}={}", self.mmap_threshold),
            Opt::LineHeight => format!("{name}={}", self.line_height),
            Opt::CharWidth => format!("{name}={}", self.char_width),
            Opt::TabStop => format!("{name}={}", self.tab_stop),
            Opt::LegacyEncoding => format!("{name}={}", self.legacy_encoding.name()),
        }
    }

    fn show_where(&self, mut keep: impl FnMut(Opt) -> bool) -> String {
        TABLE
            .iter()
            .map(|(opt, _, _)| *opt)
            .filter(|&opt| keep(opt))
            .map(|opt| self.show(opt))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

fn known(name: &str) -> Result<Opt, OptionError> {
    Opt::lookup(name).ok_or_else(|| OptionError::Unknown(name.to_owned()))
}

fn parse_nonzero<T: std::str::FromStr + Default + PartialEq>(value: &str) -> Option<T> {
    value.parse().ok().filter(|v| *v != T::default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
