//! Error types for document model operations

use crate::{LineId, NodeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Passed incorrect offset! node {node_id}, offset {offset}, length {length}")]
    IncorrectOffset {
        node_id: NodeId,
        offset: usize,
        length: usize,
    },

    #[error("Invalid content range {start}..{end} for length {length}")]
    InvalidContentRange {
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Line not found: {0}")]
    LineNotFound(LineId),

    #[error("Node {0} is not a leaf node")]
    NotALeaf(NodeId),

    #[error("Node {0} is already linked")]
    AlreadyLinked(NodeId),

    #[error("Unknown node attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid attribute value for {key}: {value}")]
    InvalidAttributeValue { key: String, value: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Settings serialization failed: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
