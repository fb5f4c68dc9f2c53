//! Layout Engine - line wrapping, pagination and pixel mapping
//!
//! This crate keeps the document model consistent with rendered geometry:
//! it re-wraps lines after edits, distributes nodes over fixed-size pages
//! and maps document positions to and from pixel coordinates.

mod error;
mod events;
mod layout_tree;
mod normalizer;
mod page;
mod pagination;
mod view;

pub use error::*;
pub use events::*;
pub use layout_tree::*;
pub use normalizer::*;
pub use page::*;
pub use pagination::*;
pub use view::*;
