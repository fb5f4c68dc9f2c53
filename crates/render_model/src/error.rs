//! Error types for render model

use doc_model::LineId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Line {0} is laid out but missing from the document")]
    MissingLine(LineId),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
