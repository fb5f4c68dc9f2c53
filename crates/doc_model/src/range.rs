//! Caret and selection ranges
//!
//! A range endpoint is a (line, node offset) pair. The node offset counts
//! chars from the start of the line's owning node; the line only matters to
//! disambiguate an offset that is both the end of one wrapped line and the
//! start of the next, which is what `is_start_of_line` selects.

use crate::{DocModelError, DocumentTree, LineId, NodeId, Result};

/// Resolution of a node-wide offset to a concrete line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOffsetInfo {
    pub node: NodeId,
    pub line_index: usize,
    pub line: LineId,
    /// Offset inside the line
    pub line_offset: usize,
    /// Offset inside the node
    pub node_offset: usize,
    pub line_length: usize,
    pub is_end_of_line: bool,
    /// Offset of the owning node inside its linked chain
    pub linked_node_offset: usize,
}

impl LineOffsetInfo {
    /// Offset inside the whole linked chain
    pub fn chain_offset(&self) -> usize {
        self.linked_node_offset + self.node_offset
    }

    pub fn is_start_of_line(&self) -> bool {
        self.line_offset == 0
    }
}

/// One side of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEndpoint {
    pub line: LineId,
    pub node_offset: usize,
    pub is_start_of_line: bool,
    pub info: LineOffsetInfo,
}

impl RangeEndpoint {
    pub fn resolve(
        tree: &DocumentTree,
        line: LineId,
        node_offset: usize,
        is_start_of_line: bool,
    ) -> Result<Self> {
        let node = tree
            .line(line)
            .ok_or(DocModelError::LineNotFound(line))?
            .node();
        Self::resolve_in_node(tree, node, node_offset, is_start_of_line)
    }

    pub fn resolve_in_node(
        tree: &DocumentTree,
        node: NodeId,
        node_offset: usize,
        is_start_of_line: bool,
    ) -> Result<Self> {
        let info = tree
            .range_info_for_offset(node, node_offset, is_start_of_line)
            .ok_or_else(|| DocModelError::IncorrectOffset {
                node_id: node,
                offset: node_offset,
                length: tree.node_length(node),
            })?;
        Ok(Self {
            line: info.line,
            node_offset,
            is_start_of_line,
            info,
        })
    }

    pub fn node(&self) -> NodeId {
        self.info.node
    }

    fn same_position(&self, other: &Self) -> bool {
        self.info.node == other.info.node && self.node_offset == other.node_offset
    }
}

/// A caret (collapsed) or selection range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: RangeEndpoint,
    end: RangeEndpoint,
}

impl Range {
    pub fn new(
        tree: &DocumentTree,
        (start_line, start_offset, start_start_of_line): (LineId, usize, bool),
        (end_line, end_offset, end_start_of_line): (LineId, usize, bool),
    ) -> Result<Self> {
        Ok(Self {
            start: RangeEndpoint::resolve(tree, start_line, start_offset, start_start_of_line)?,
            end: RangeEndpoint::resolve(tree, end_line, end_offset, end_start_of_line)?,
        })
    }

    /// Collapsed range at a node offset
    pub fn caret(tree: &DocumentTree, node: NodeId, node_offset: usize, is_start_of_line: bool) -> Result<Self> {
        let endpoint = RangeEndpoint::resolve_in_node(tree, node, node_offset, is_start_of_line)?;
        Ok(Self::from_endpoints(endpoint, endpoint))
    }

    pub fn from_endpoints(start: RangeEndpoint, end: RangeEndpoint) -> Self {
        Self { start, end }
    }

    pub fn set_start_position(
        &mut self,
        tree: &DocumentTree,
        line: LineId,
        node_offset: usize,
        is_start_of_line: Option<bool>,
    ) -> Result<()> {
        self.start = RangeEndpoint::resolve(tree, line, node_offset, is_start_of_line.unwrap_or(false))?;
        Ok(())
    }

    pub fn set_end_position(
        &mut self,
        tree: &DocumentTree,
        line: LineId,
        node_offset: usize,
        is_start_of_line: Option<bool>,
    ) -> Result<()> {
        self.end = RangeEndpoint::resolve(tree, line, node_offset, is_start_of_line.unwrap_or(false))?;
        Ok(())
    }

    pub fn start(&self) -> &RangeEndpoint {
        &self.start
    }

    pub fn end(&self) -> &RangeEndpoint {
        &self.end
    }

    pub fn start_node(&self) -> NodeId {
        self.start.node()
    }

    pub fn end_node(&self) -> NodeId {
        self.end.node()
    }

    pub fn start_info(&self) -> &LineOffsetInfo {
        &self.start.info
    }

    pub fn end_info(&self) -> &LineOffsetInfo {
        &self.end.info
    }

    pub fn is_collapsed(&self) -> bool {
        self.start.same_position(&self.end)
    }

    /// Collapse onto one boundary, a no-op when already collapsed
    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    /// Re-derive both endpoints against the current tree
    pub fn refresh(&mut self, tree: &DocumentTree) -> Result<()> {
        self.start = RangeEndpoint::resolve_in_node(
            tree,
            self.start.node(),
            self.start.node_offset,
            self.start.is_start_of_line,
        )?;
        self.end = RangeEndpoint::resolve_in_node(
            tree,
            self.end.node(),
            self.end.node_offset,
            self.end.is_start_of_line,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditorSettings, LineContent};

    fn two_line_tree() -> (DocumentTree, NodeId, LineId, LineId) {
        let mut tree = DocumentTree::new(EditorSettings::default());
        let node = tree.create_paragraph_after(None).unwrap();
        let first = tree.lines_of(node).unwrap()[0];
        tree.line_content_mut(first).unwrap().insert_text("hello ", 0).unwrap();
        let second = tree
            .insert_line(node, 1, LineContent::from_text("world"))
            .unwrap();
        (tree, node, first, second)
    }

    #[test]
    fn test_set_position_validates_offset() {
        let (tree, node, first, _) = two_line_tree();
        let mut range = Range::caret(&tree, node, 0, false).unwrap();
        assert!(range.set_start_position(&tree, first, 11, None).is_ok());
        let err = range.set_start_position(&tree, first, 12, None).unwrap_err();
        assert!(err.to_string().starts_with("Passed incorrect offset!"));
    }

    #[test]
    fn test_start_of_line_disambiguates_wrap_boundary() {
        let (tree, node, first, second) = two_line_tree();
        let end_of_first = Range::caret(&tree, node, 6, false).unwrap();
        assert_eq!(end_of_first.start().line, first);
        assert!(end_of_first.start_info().is_end_of_line);

        let start_of_second = Range::caret(&tree, node, 6, true).unwrap();
        assert_eq!(start_of_second.start().line, second);
        assert_eq!(start_of_second.start_info().line_offset, 0);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let (tree, node, first, second) = two_line_tree();
        let mut range = Range::new(&tree, (first, 1, false), (second, 8, false)).unwrap();
        assert!(!range.is_collapsed());
        range.collapse(true);
        assert!(range.is_collapsed());
        let before = range;
        range.collapse(false);
        assert_eq!(range, before);
        range.collapse(true);
        assert_eq!(range, before);
        assert_eq!(range.start_node(), node);
    }
}
