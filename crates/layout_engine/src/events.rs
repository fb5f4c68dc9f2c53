//! Signals produced while a change is laid out
//!
//! These are returned to the caller of the edit pipeline rather than
//! dispatched to handlers, so the order in which they appear is the order in
//! which the layout steps ran.

use doc_model::{NodeId, PageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutEvent {
    /// Content of a page changed height
    FillingChanged { page: usize },
    /// Nodes left a page because it ran out of room
    PageOverflow { page: usize, nodes: Vec<NodeId> },
    /// A node was removed from the document
    NodeRemoved { node: NodeId },
    PageCreated { page: PageId, index: usize },
    PageRemoved { page: PageId },
    /// A linked continuation was folded back into its predecessor
    NodesMerged { into: NodeId, removed: NodeId },
}
