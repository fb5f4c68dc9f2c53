//! Pages and their content regions

use crate::Rect;
use doc_model::{NodeId, PageId, PageSettings};

/// The nodes placed in a page's content region, in reading order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    nodes: Vec<NodeId>,
}

impl PageContent {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| *n == node)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    pub fn insert(&mut self, index: usize, node: NodeId) {
        self.nodes.insert(index.min(self.nodes.len()), node);
    }

    /// Insert `nodes` before the current first node
    pub fn prepend(&mut self, nodes: &[NodeId]) {
        self.nodes.splice(0..0, nodes.iter().copied());
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.nodes.pop()
    }

    pub fn remove_first(&mut self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(self.nodes.remove(0))
        }
    }

    pub fn remove(&mut self, node: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| *n != node);
        self.nodes.len() != before
    }

    pub fn replace_first(&mut self, node: NodeId) {
        match self.nodes.first_mut() {
            Some(first) => *first = node,
            None => self.nodes.push(node),
        }
    }
}

/// A fixed-size page with a header band, a content region and a footer band
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: PageId,
    content: PageContent,
}

impl Page {
    pub fn new() -> Self {
        Self::with_nodes(Vec::new())
    }

    pub fn with_nodes(nodes: Vec<NodeId>) -> Self {
        Self {
            id: PageId::new(),
            content: PageContent { nodes },
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut PageContent {
        &mut self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Height available to content: page height minus margins, header and footer
    pub fn get_max_content_size(settings: &PageSettings) -> f32 {
        settings.max_content_height()
    }

    /// Page bounds when stacked at `index`
    pub fn bounds(settings: &PageSettings, index: usize) -> Rect {
        Rect::new(0.0, index as f32 * settings.stride(), settings.width, settings.height)
    }

    pub fn header_area(settings: &PageSettings, index: usize) -> Rect {
        let page = Self::bounds(settings, index);
        Rect::new(
            settings.margin_left,
            page.y + settings.margin_top,
            settings.content_width(),
            settings.header_height,
        )
    }

    pub fn content_area(settings: &PageSettings, index: usize) -> Rect {
        let page = Self::bounds(settings, index);
        Rect::new(
            settings.margin_left,
            page.y + settings.content_top(),
            settings.content_width(),
            settings.max_content_height(),
        )
    }

    pub fn footer_area(settings: &PageSettings, index: usize) -> Rect {
        let content = Self::content_area(settings, index);
        Rect::new(
            settings.margin_left,
            content.bottom(),
            settings.content_width(),
            settings.footer_height,
        )
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_geometry() {
        let settings = PageSettings::default();
        assert_eq!(Page::get_max_content_size(&settings), 660.0);

        let second = Page::bounds(&settings, 1);
        assert_eq!(second.y, 820.0);

        let content = Page::content_area(&settings, 1);
        assert_eq!(content.x, 50.0);
        assert_eq!(content.y, 890.0);
        assert_eq!(content.width, 500.0);

        let footer = Page::footer_area(&settings, 0);
        assert_eq!(footer.y, 730.0);
        assert_eq!(footer.bottom(), 760.0);
    }

    #[test]
    fn test_page_content_ordering() {
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        let mut content = PageContent::default();
        content.push(c);
        content.prepend(&[a, b]);
        assert_eq!(content.nodes(), &[a, b, c]);
        assert_eq!(content.remove_first(), Some(a));
        assert!(content.remove(c));
        assert_eq!(content.nodes(), &[b]);
    }
}
