//! Nodes of the document
//!
//! A node is either a leaf holding lines of text or a branch holding child
//! nodes. Leaves may be linked into a continuation chain when a paragraph
//! is split across pages.

use crate::{DocModelError, LineId, NodeId, PageId, Result};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// Enumeration of node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Paragraph,
    Container,
}

/// Presentation attributes settable on a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Font size override in pixels
    pub font_size: Option<f32>,
    /// Line height override as a multiple of the font size
    pub line_height: Option<f32>,
    /// CSS class
    pub class: Option<String>,
}

impl NodeAttributes {
    /// Set an attribute by key, an empty value clears it
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || DocModelError::InvalidAttributeValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let number = |value: &str| -> Result<Option<f32>> {
            if value.is_empty() {
                return Ok(None);
            }
            match value.trim_end_matches("px").parse::<f32>() {
                Ok(n) if n > 0.0 && n.is_finite() => Ok(Some(n)),
                _ => Err(invalid()),
            }
        };
        match key {
            "font-size" => self.font_size = number(value)?,
            "line-height" => self.line_height = number(value)?,
            "class" => {
                self.class = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(DocModelError::UnknownAttribute(key.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "font-size" => self.font_size.map(|v| v.to_string()),
            "line-height" => self.line_height.map(|v| v.to_string()),
            "class" => self.class.clone(),
            _ => None,
        }
    }
}

/// Lines and chain links of a leaf node
#[derive(Debug, Clone, Default)]
pub struct LeafData {
    pub(crate) lines: Vec<LineId>,
    pub(crate) previous_linked: Option<NodeId>,
    pub(crate) next_linked: Option<NodeId>,
    /// Node offset where each line starts, rebuilt lazily after edits
    pub(crate) line_starts: OnceCell<Vec<usize>>,
}

impl LeafData {
    pub fn lines(&self) -> &[LineId] {
        &self.lines
    }

    pub fn previous_linked(&self) -> Option<NodeId> {
        self.previous_linked
    }

    pub fn next_linked(&self) -> Option<NodeId> {
        self.next_linked
    }

    pub(crate) fn invalidate(&mut self) {
        self.line_starts.take();
    }
}

/// Children of a branch node
#[derive(Debug, Clone, Default)]
pub struct BranchData {
    pub(crate) children: Vec<NodeId>,
}

impl BranchData {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(LeafData),
    Branch(BranchData),
}

/// A node of the document
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    node_type: NodeType,
    attributes: NodeAttributes,
    page: Option<PageId>,
    kind: NodeKind,
}

impl Node {
    /// Create a paragraph leaf without lines
    pub fn new_leaf() -> Self {
        Self {
            id: NodeId::new(),
            node_type: NodeType::Paragraph,
            attributes: NodeAttributes::default(),
            page: None,
            kind: NodeKind::Leaf(LeafData::default()),
        }
    }

    pub fn new_branch() -> Self {
        Self {
            id: NodeId::new(),
            node_type: NodeType::Container,
            attributes: NodeAttributes::default(),
            page: None,
            kind: NodeKind::Branch(BranchData::default()),
        }
    }

    pub fn with_attributes(mut self, attributes: NodeAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn attributes(&self) -> &NodeAttributes {
        &self.attributes
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) -> Result<()> {
        self.attributes.set(key, value)
    }

    pub fn set_attributes(&mut self, attributes: NodeAttributes) {
        self.attributes = attributes;
    }

    /// Page the node is placed on, `None` until paginated
    pub fn page(&self) -> Option<PageId> {
        self.page
    }

    pub fn set_page(&mut self, page: Option<PageId>) {
        self.page = page;
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafData> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Branch(_) => None,
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> Option<&mut LeafData> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BranchData> {
        match &self.kind {
            NodeKind::Branch(branch) => Some(branch),
            NodeKind::Leaf(_) => None,
        }
    }

    pub(crate) fn as_branch_mut(&mut self) -> Option<&mut BranchData> {
        match &mut self.kind {
            NodeKind::Branch(branch) => Some(branch),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Lines of a leaf, empty for branches
    pub fn lines(&self) -> &[LineId] {
        self.as_leaf().map(LeafData::lines).unwrap_or(&[])
    }

    /// Whether pagination may split this node between lines
    pub fn is_splittable(&self) -> bool {
        self.as_leaf().is_some_and(|leaf| leaf.lines.len() > 1)
    }

    pub fn previous_linked(&self) -> Option<NodeId> {
        self.as_leaf().and_then(LeafData::previous_linked)
    }

    pub fn next_linked(&self) -> Option<NodeId> {
        self.as_leaf().and_then(LeafData::next_linked)
    }

    pub fn is_linked(&self) -> bool {
        self.previous_linked().is_some() || self.next_linked().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_known_attributes() {
        let mut node = Node::new_leaf();
        node.set_attribute("font-size", "20px").unwrap();
        node.set_attribute("line-height", "1.2").unwrap();
        node.set_attribute("class", "quote").unwrap();
        assert_eq!(node.attributes().font_size, Some(20.0));
        assert_eq!(node.attributes().get("line-height"), Some("1.2".to_string()));
        assert_eq!(node.attributes().get("class"), Some("quote".to_string()));

        node.set_attribute("class", "").unwrap();
        assert_eq!(node.attributes().class, None);
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let mut node = Node::new_leaf();
        assert!(matches!(
            node.set_attribute("color", "red"),
            Err(DocModelError::UnknownAttribute(_))
        ));
        assert!(matches!(
            node.set_attribute("font-size", "big"),
            Err(DocModelError::InvalidAttributeValue { .. })
        ));
    }

    #[test]
    fn test_branch_is_not_splittable() {
        let branch = Node::new_branch();
        assert!(!branch.is_leaf());
        assert!(!branch.is_splittable());
        assert!(branch.lines().is_empty());
    }
}
