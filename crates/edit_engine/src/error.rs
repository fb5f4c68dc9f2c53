//! Error types for editing operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Document has no caret position")]
    NoCaret,

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Layout error: {0}")]
    Layout(#[from] layout_engine::LayoutError),

    #[error("Render error: {0}")]
    Render(#[from] render_model::RenderError),
}

pub type Result<T> = std::result::Result<T, EditError>;
