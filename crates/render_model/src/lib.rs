//! Render Model - what the host paints
//!
//! This crate turns the layout of the paginated document into paint items,
//! and owns the two pieces of view state that live outside the document:
//! the blinking caret and the scrolled viewport.

mod caret;
mod converter;
mod error;
mod render_item;
mod selection;
mod viewport;

pub use caret::*;
pub use converter::*;
pub use error::*;
pub use render_item::*;
pub use selection::*;
pub use viewport::*;
