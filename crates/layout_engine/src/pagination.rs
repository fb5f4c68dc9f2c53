//! Distribution of nodes over pages
//!
//! The pagination index is a list of pages, each listing its nodes in
//! reading order. Flattened in page order it always equals the tree's node
//! index. Growth is handled by [`Pagination::check_page_overflow`], which
//! moves or splits nodes off the bottom of a page onto the next one;
//! shrinkage by [`Pagination::check_filling`], which pulls nodes (or their
//! leading lines) up from the following page.

use crate::{LayoutError, LayoutEvent, Page, Result};
use doc_model::{DocumentTree, NodeId, PageId};
use text_engine::TextMeasurer;

/// Heights within this tolerance of the limit count as fitting
const HEIGHT_EPSILON: f32 = 0.01;

/// Measured height of a node: the sum of its line heights, or of its
/// children for a branch.
pub fn node_height(tree: &DocumentTree, measurer: &dyn TextMeasurer, node: NodeId) -> f32 {
    let Some(n) = tree.node(node) else {
        return 0.0;
    };
    if let Some(branch) = n.as_branch() {
        return branch
            .children()
            .iter()
            .map(|child| node_height(tree, measurer, *child))
            .sum();
    }
    line_heights(tree, measurer, node).iter().sum()
}

/// Measured height of each line of a leaf
pub fn line_heights(tree: &DocumentTree, measurer: &dyn TextMeasurer, node: NodeId) -> Vec<f32> {
    let style = tree.text_style(node);
    tree.node(node)
        .map(|n| n.lines())
        .unwrap_or(&[])
        .iter()
        .filter_map(|l| tree.line(*l))
        .map(|line| line.content().height(measurer, &style))
        .collect()
}

/// Number of leading lines of `node` whose stacked height fits `available`
fn lines_fitting(tree: &DocumentTree, measurer: &dyn TextMeasurer, node: NodeId, available: f32) -> usize {
    let mut used = 0.0;
    let mut count = 0;
    for height in line_heights(tree, measurer, node) {
        if used + height > available + HEIGHT_EPSILON {
            break;
        }
        used += height;
        count += 1;
    }
    count
}

/// Node to page assignment
#[derive(Debug, Clone)]
pub struct Pagination {
    pages: Vec<Page>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagination {
    /// A single empty page
    pub fn new() -> Self {
        Self {
            pages: vec![Page::new()],
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_index_of(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id() == id)
    }

    /// Index of the page holding `node`
    pub fn page_of(&self, node: NodeId) -> Option<usize> {
        self.pages.iter().position(|p| p.content().contains(node))
    }

    pub fn nodes_on_page(&self, index: usize) -> &[NodeId] {
        self.pages.get(index).map(|p| p.content().nodes()).unwrap_or(&[])
    }

    /// Every node in page order then in-page order
    pub fn flattened(&self) -> Vec<NodeId> {
        self.pages
            .iter()
            .flat_map(|p| p.content().nodes().iter().copied())
            .collect()
    }

    /// Whether the flattened index equals the tree's node index
    pub fn is_consistent_with(&self, tree: &DocumentTree) -> bool {
        self.flattened() == tree.node_index()
    }

    /// Height used on a page
    pub fn content_height(&self, tree: &DocumentTree, measurer: &dyn TextMeasurer, index: usize) -> f32 {
        self.nodes_on_page(index)
            .iter()
            .map(|n| node_height(tree, measurer, *n))
            .sum()
    }

    /// Lay out the whole document from scratch
    pub fn paginate_all(&mut self, tree: &mut DocumentTree, measurer: &dyn TextMeasurer) -> Result<Vec<LayoutEvent>> {
        self.pages = vec![Page::with_nodes(tree.node_index().to_vec())];
        self.repaginate(tree, measurer, 0)
    }

    /// Bring the index back in line with the tree and redistribute content
    /// starting at page `from`.
    pub fn repaginate(&mut self, tree: &mut DocumentTree, measurer: &dyn TextMeasurer, from: usize) -> Result<Vec<LayoutEvent>> {
        let mut events = Vec::new();
        self.sync_with_tree(tree);
        let start = from.min(self.pages.len().saturating_sub(1));

        let mut page = start;
        while page < self.pages.len() {
            let overflowed = self.check_page_overflow(tree, measurer, page, &mut events)?;
            if !overflowed && page > start {
                break;
            }
            page += 1;
        }

        let mut page = start.saturating_sub(1);
        while page + 1 < self.pages.len() {
            self.check_filling(tree, measurer, page, &mut events)?;
            page += 1;
        }

        self.coalesce_linked(tree, &mut events)?;
        self.remove_empty_pages(&mut events);
        self.assign_pages(tree);

        if !self.is_consistent_with(tree) {
            return Err(LayoutError::LayoutFailed(
                "pagination index diverged from node index".to_string(),
            ));
        }
        Ok(events)
    }

    /// Drop nodes that left the tree and place new ones right after their
    /// predecessor in reading order.
    pub fn sync_with_tree(&mut self, tree: &DocumentTree) {
        let index = tree.node_index();
        for page in &mut self.pages {
            let stale: Vec<NodeId> = page
                .content()
                .nodes()
                .iter()
                .copied()
                .filter(|n| !index.contains(n))
                .collect();
            for node in stale {
                page.content_mut().remove(node);
            }
        }

        for (position, node) in index.iter().enumerate() {
            if self.page_of(*node).is_some() {
                continue;
            }
            let predecessor = index[..position]
                .iter()
                .rev()
                .find_map(|p| self.page_of(*p).map(|page| (page, *p)));
            match predecessor {
                Some((page, previous)) => {
                    let content = self.pages[page].content_mut();
                    let at = content.position(previous).map_or(0, |i| i + 1);
                    content.insert(at, *node);
                }
                None => {
                    if self.pages.is_empty() {
                        self.pages.push(Page::new());
                    }
                    self.pages[0].content_mut().insert(0, *node);
                }
            }
        }
    }

    /// Move or split nodes off the bottom of page `index` until it fits.
    /// Returns whether anything left the page.
    pub fn check_page_overflow(
        &mut self,
        tree: &mut DocumentTree,
        measurer: &dyn TextMeasurer,
        index: usize,
        events: &mut Vec<LayoutEvent>,
    ) -> Result<bool> {
        let max = Page::get_max_content_size(&tree.settings().page);
        let mut overflowed: Vec<NodeId> = Vec::new();

        loop {
            let height = self.content_height(tree, measurer, index);
            if height <= max + HEIGHT_EPSILON {
                break;
            }
            let nodes = self.nodes_on_page(index);
            let Some(&last) = nodes.last() else {
                break;
            };
            let is_only_node = nodes.len() == 1;
            let available = max - (height - node_height(tree, measurer, last));
            let line_count = tree.node(last).map_or(0, |n| n.lines().len());
            let fit = if tree.is_leaf(last) {
                lines_fitting(tree, measurer, last, available)
            } else {
                0
            };

            if fit >= 1 && fit < line_count {
                let continuation = tree.split_at_line(last, fit)?;
                overflowed.insert(0, continuation);
                tracing::debug!(page = index, node = %last, kept_lines = fit, "split node on overflow");
                break;
            }
            if !is_only_node {
                self.pages[index].content_mut().pop();
                overflowed.insert(0, last);
                continue;
            }
            if line_count > 1 {
                // Not even the first line fits an otherwise empty page
                let continuation = tree.split_at_line(last, 1)?;
                overflowed.insert(0, continuation);
                break;
            }
            tracing::warn!(page = index, node = %last, "node taller than an empty page");
            break;
        }

        if overflowed.is_empty() {
            return Ok(false);
        }
        events.push(LayoutEvent::PageOverflow {
            page: index,
            nodes: overflowed.clone(),
        });
        self.on_page_overflow(index, &overflowed, events);
        Ok(true)
    }

    /// Prepend overflowed nodes to the next page, creating it if needed
    fn on_page_overflow(&mut self, index: usize, nodes: &[NodeId], events: &mut Vec<LayoutEvent>) {
        match self.pages.get_mut(index + 1) {
            Some(next) => next.content_mut().prepend(nodes),
            None => {
                let page = Page::with_nodes(nodes.to_vec());
                events.push(LayoutEvent::PageCreated {
                    page: page.id(),
                    index: index + 1,
                });
                tracing::debug!(index = index + 1, "created page");
                self.pages.push(page);
            }
        }
    }

    /// Pull content from the page after `index` while it has room
    pub fn check_filling(
        &mut self,
        tree: &mut DocumentTree,
        measurer: &dyn TextMeasurer,
        index: usize,
        events: &mut Vec<LayoutEvent>,
    ) -> Result<()> {
        let max = Page::get_max_content_size(&tree.settings().page);
        loop {
            if index + 1 >= self.pages.len() {
                break;
            }
            let Some(first) = self.pages[index + 1].content().first() else {
                let removed = self.pages.remove(index + 1);
                events.push(LayoutEvent::PageRemoved { page: removed.id() });
                continue;
            };
            let available = max - self.content_height(tree, measurer, index);
            if available <= HEIGHT_EPSILON {
                break;
            }
            let previous_on_page = self.pages[index].content().last();
            let continues_previous =
                previous_on_page.is_some() && tree.previous_linked(first) == previous_on_page;

            if node_height(tree, measurer, first) <= available + HEIGHT_EPSILON {
                self.pages[index + 1].content_mut().remove_first();
                self.pages[index].content_mut().push(first);
                events.push(LayoutEvent::FillingChanged { page: index });
                tracing::trace!(page = index, node = %first, "pulled node up");
                continue;
            }

            let fit = if tree.is_leaf(first) {
                lines_fitting(tree, measurer, first, available)
            } else {
                0
            };
            if fit == 0 {
                break;
            }
            match previous_on_page {
                Some(previous) if continues_previous => {
                    tree.pull_linked_lines(previous, fit)?;
                    tracing::trace!(page = index, node = %previous, lines = fit, "pulled linked lines up");
                }
                _ => {
                    let continuation = tree.split_at_line(first, fit)?;
                    self.pages[index + 1].content_mut().replace_first(continuation);
                    self.pages[index].content_mut().push(first);
                    tracing::trace!(page = index, node = %first, lines = fit, "split node to fill page");
                }
            }
            events.push(LayoutEvent::FillingChanged { page: index });
            break;
        }
        Ok(())
    }

    /// Merge linked neighbours that share a page
    pub fn coalesce_linked(&mut self, tree: &mut DocumentTree, events: &mut Vec<LayoutEvent>) -> Result<()> {
        for page in &mut self.pages {
            let mut i = 0;
            while i + 1 < page.content().len() {
                let nodes = page.content().nodes();
                let (current, following) = (nodes[i], nodes[i + 1]);
                if tree.next_linked(current) == Some(following) {
                    tree.merge_linked(current)?;
                    page.content_mut().remove(following);
                    events.push(LayoutEvent::NodesMerged {
                        into: current,
                        removed: following,
                    });
                    tracing::debug!(into = %current, removed = %following, "merged linked nodes");
                } else {
                    i += 1;
                }
            }
        }
        Ok(())
    }

    /// Remove pages without nodes, keeping at least one page
    pub fn remove_empty_pages(&mut self, events: &mut Vec<LayoutEvent>) {
        let mut i = 0;
        while i < self.pages.len() {
            if self.pages.len() > 1 && self.pages[i].is_empty() {
                let removed = self.pages.remove(i);
                events.push(LayoutEvent::PageRemoved { page: removed.id() });
                tracing::debug!(index = i, "removed empty page");
            } else {
                i += 1;
            }
        }
    }

    fn assign_pages(&self, tree: &mut DocumentTree) {
        for page in &self.pages {
            for node in page.content().nodes() {
                if let Some(n) = tree.node_mut(*node) {
                    n.set_page(Some(page.id()));
                }
            }
        }
    }
}
