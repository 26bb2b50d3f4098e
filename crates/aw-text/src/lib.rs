//! # aw-text: Text model for awedit
//!
//! - **[`position`]**: `Position` (line, col) and `Range`, 0-indexed, char columns
//! - **[`document`]**: `Document`, a line array with clamped editing and file I/O
//! - **[`encoding`]**: BOM sniffing and the UTF-8 / UTF-16 / legacy decode cascade
//! - **[`error`]**: `DocumentError` and `DecodeError`
//!
//! Large files are memory-mapped during load; the mapping never outlives
//! [`Document::open`].

pub mod document;
pub mod encoding;
pub mod error;
pub mod position;

mod source;

pub use document::{DEFAULT_MMAP_THRESHOLD, Document, LoadOptions};
pub use encoding::{DecodePolicy, Decoded, Encoding};
pub use error::{DecodeError, DocumentError};
pub use position::{Position, Range};
