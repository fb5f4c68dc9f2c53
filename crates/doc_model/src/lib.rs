//! Document Model - arena tree of paragraphs, lines and ranges
//!
//! This crate provides the content model of the editor: leaf nodes holding
//! wrapped lines of text, linked continuation chains for paragraphs split
//! across pages, and ranges addressing positions inside them. Every
//! reference between entities is an id resolved through [`DocumentTree`].

mod annotation;
mod error;
mod line;
mod line_content;
mod node;
mod node_id;
mod range;
mod settings;
mod tree;

pub use annotation::*;
pub use error::*;
pub use line::*;
pub use line_content::*;
pub use node::*;
pub use node_id::*;
pub use range::*;
pub use settings::*;
pub use tree::*;
