//! Edit Engine - documents, selection, navigation and input dispatch
//!
//! [`Document`] owns the tree, its pagination and the selection, and applies
//! [`EditCommand`]s by running the normalize/paginate pipeline. [`Editor`]
//! sits on top and turns host [`InputEvent`]s into commands, caret moves and
//! viewport updates.

mod document;
mod editor;
mod error;
mod input;
mod navigation;
mod selection;

pub use document::*;
pub use editor::*;
pub use error::*;
pub use input::*;
pub use navigation::*;
pub use selection::*;
