//! Error types for layout engine

use doc_model::PageId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout failed: {0}")]
    LayoutFailed(String),

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Page index {0} out of range")]
    PageIndexOutOfRange(usize),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
