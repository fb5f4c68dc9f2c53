//! A visual line of a leaf node

use crate::{LineContent, LineId, NodeId};

/// Selected char range inside one line, used to paint the selection overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSelection {
    pub start: usize,
    pub end: usize,
}

impl LineSelection {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One line of text inside a leaf node
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    node: NodeId,
    content: LineContent,
    selection: Option<LineSelection>,
}

impl Line {
    pub fn new(node: NodeId) -> Self {
        Self::with_content(node, LineContent::new())
    }

    pub fn with_content(node: NodeId, content: LineContent) -> Self {
        Self {
            id: LineId::new(),
            node,
            content,
            selection: None,
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// Owning node
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn set_node(&mut self, node: NodeId) {
        self.node = node;
    }

    pub fn content(&self) -> &LineContent {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut LineContent {
        &mut self.content
    }

    pub fn text(&self) -> &str {
        self.content.text()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn selection(&self) -> Option<LineSelection> {
        self.selection
    }

    pub fn is_selected(&self) -> bool {
        self.selection.is_some()
    }

    /// Mark `[start, end)` as selected, clamped to the line length.
    ///
    /// An empty line can still carry an empty selection so that its
    /// overlay is painted while the range spans over it.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.len();
        let end = end.min(len);
        self.selection = Some(LineSelection {
            start: start.min(end),
            end,
        });
    }

    pub fn unselect(&mut self) {
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_selection_is_clamped() {
        let mut line = Line::with_content(NodeId::new(), LineContent::from_text("abc"));
        line.select(1, 10);
        assert_eq!(line.selection(), Some(LineSelection { start: 1, end: 3 }));
        line.unselect();
        assert!(!line.is_selected());
    }

    #[test]
    fn test_empty_line_keeps_overlay() {
        let mut line = Line::new(NodeId::new());
        line.select(0, 0);
        assert!(line.is_selected());
        assert!(line.selection().unwrap().is_empty());
    }
}
