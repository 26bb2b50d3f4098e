//! # aw-editor: Editing core for awedit
//!
//! Everything between a window's input events and the [`aw_text::Document`]:
//!
//! - **[`selection`]**: `Selection`, an anchor/caret pair that may be empty
//! - **[`controller`]**: multi-cursor `EditController` with linear and
//!   rectangular selection
//! - **[`history`]**: `Command` and the memory-bounded `UndoManager`
//! - **[`search`]**: literal and regex `SearchEngine` with wrap-around
//! - **[`renderer`]**: the `Renderer` trait plus approximate and grid renderers
//! - **[`options`]**: `:set` directives and `EditorOptions`
//! - **[`session`]**: `Session`, one document and all of the above
//!
//! No drawing happens here; hosts supply a [`Renderer`] and forward input.

pub mod controller;
pub mod history;
pub mod options;
pub mod renderer;
pub mod search;
pub mod selection;
pub mod session;

pub use controller::{EditController, Motion};
pub use history::{Command, DEFAULT_MEMORY_LIMIT, UndoManager};
pub use options::{EditorOptions, OptionError, SetDirective};
pub use renderer::{ApproxRenderer, GridRenderer, Renderer, ScreenPoint};
pub use search::{SearchEngine, SearchError, SearchOptions, SearchResult};
pub use selection::Selection;
pub use session::{Composition, Session, SessionError};
