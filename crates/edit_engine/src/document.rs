//! The edit pipeline
//!
//! [`Document`] owns the tree, the page assignment and the selection of one
//! editing session. Every change runs the same fixed sequence:
//!
//! 1. mutate the tree and leave the selection on a valid position
//! 2. normalize the lines that were edited, reflow whole nodes that need it
//! 3. repaginate from the first affected page, reflowing nodes that
//!    pagination merged back together until nothing merges any more
//! 4. re-derive the selection from paragraph-wide anchors and refresh the
//!    line overlays
//!
//! The [`LayoutEvent`]s produced along the way are returned in order.

use crate::navigation::{endpoint_in_chain, Direction, MovementUnit, NavigationOptions, Navigator};
use crate::{clear_overlays, select_document, EditError, Result, Selection, SelectionTransition};
use doc_model::{DocumentTree, EditorSettings, NodeId, RangeEndpoint};
use layout_engine::{grapheme_offsets, LayoutEvent, LayoutView, Normalizer, Pagination};
use perf::{time_scope, TimerCategory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use text_engine::TextMeasurer;
use tracing::{debug, warn};

/// Upper bound on merge/reflow/repaginate rounds of one edit
const MAX_MERGE_ROUNDS: usize = 16;

/// A change to the document content or structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditCommand {
    /// Insert at the caret, replacing a non-collapsed selection.
    /// A `'\n'` starts a new paragraph.
    InsertText(String),
    /// Split the paragraph at the caret
    InsertNewline,
    /// Backspace
    DeleteBackward,
    /// Forward delete
    DeleteForward,
    RemoveSelection,
    /// Set an attribute on every node of the selected paragraphs
    SetNodeAttribute { key: String, value: String },
    /// Add a paragraph after the paragraph of `after`, or at the start
    InsertParagraph { after: Option<NodeId>, text: String },
    RemoveNode(NodeId),
}

/// What one edit produced
#[derive(Debug, Clone, Default)]
pub struct EditOutcome {
    pub events: Vec<LayoutEvent>,
    /// Whether the command changed anything
    pub changed: bool,
}

/// Bookkeeping of one edit, consumed when the edit settles
#[derive(Debug, Default)]
struct EditContext {
    /// (node, line index) pairs to normalize
    touched: Vec<(NodeId, usize)>,
    /// Nodes to rewrap completely
    reflow: Vec<NodeId>,
    removed: Vec<NodeId>,
    /// Pages holding changed nodes before the change
    pages: Vec<usize>,
    changed: bool,
}

impl EditContext {
    fn touch(&mut self, pagination: &Pagination, node: NodeId, line_index: usize) {
        self.touched.push((node, line_index));
        self.pages.extend(pagination.page_of(node));
        self.changed = true;
    }

    fn reflow(&mut self, pagination: &Pagination, node: NodeId) {
        if !self.reflow.contains(&node) {
            self.reflow.push(node);
        }
        self.pages.extend(pagination.page_of(node));
        self.changed = true;
    }

    fn removed(&mut self, pagination: &Pagination, node: NodeId) {
        self.removed.push(node);
        self.pages.extend(pagination.page_of(node));
        self.changed = true;
    }
}

/// A selection endpoint expressed against the paragraph, which survives
/// pagination moving lines between linked nodes
#[derive(Debug, Clone, Copy)]
struct Anchor {
    head: NodeId,
    offset: usize,
    is_start_of_line: bool,
}

impl Anchor {
    fn capture(tree: &DocumentTree, endpoint: &RangeEndpoint) -> Self {
        Self {
            head: tree.chain_head(endpoint.node()),
            offset: tree.linked_node_offset(endpoint.node()) + endpoint.node_offset,
            is_start_of_line: endpoint.is_start_of_line,
        }
    }

    fn resolve(&self, tree: &DocumentTree) -> Result<RangeEndpoint> {
        let head = if tree.is_leaf(self.head) {
            self.head
        } else {
            tree.first_leaf().ok_or(EditError::NoCaret)?
        };
        let offset = self.offset.min(tree.chain_length(head));
        endpoint_in_chain(tree, head, offset, self.is_start_of_line)
    }
}

/// One editing session: content, pages and selection
#[derive(Debug, Clone)]
pub struct Document {
    tree: DocumentTree,
    pagination: Pagination,
    selection: Selection,
    measurer: Arc<dyn TextMeasurer>,
}

impl Document {
    /// A document holding one empty paragraph on one page
    pub fn new(settings: EditorSettings, measurer: Arc<dyn TextMeasurer>) -> Result<Self> {
        Self::from_tree(DocumentTree::with_empty_paragraph(settings), measurer)
    }

    /// A document with one paragraph per entry, wrapped and paginated
    pub fn from_paragraphs(settings: EditorSettings, measurer: Arc<dyn TextMeasurer>, paragraphs: &[&str]) -> Result<Self> {
        if paragraphs.is_empty() {
            return Self::new(settings, measurer);
        }
        let mut tree = DocumentTree::new(settings);
        let normalizer = Normalizer::for_tree(measurer.as_ref(), &tree);
        let mut previous = None;
        for text in paragraphs {
            let node = tree.create_paragraph_after(previous)?;
            if !text.is_empty() {
                tree.insert_text(node, 0, text, false)?;
                normalizer.reflow(&mut tree, node)?;
            }
            previous = Some(node);
        }
        Self::from_tree(tree, measurer)
    }

    /// Paginate an existing tree and put the caret at its start
    pub fn from_tree(mut tree: DocumentTree, measurer: Arc<dyn TextMeasurer>) -> Result<Self> {
        if tree.first_leaf().is_none() {
            tree.create_paragraph_after(None)?;
        }
        let mut pagination = Pagination::new();
        pagination.paginate_all(&mut tree, measurer.as_ref())?;
        let first = tree.first_leaf().ok_or(EditError::NoCaret)?;
        let selection = Selection::caret_at(&tree, first, 0, true)?;
        debug!(
            nodes = tree.node_count(),
            pages = pagination.page_count(),
            "document created"
        );
        Ok(Self {
            tree,
            pagination,
            selection,
            measurer,
        })
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn settings(&self) -> &EditorSettings {
        self.tree.settings()
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    /// Absolute geometry of the current state
    pub fn view(&self) -> LayoutView<'_> {
        time_scope!("layout_view", TimerCategory::Render);
        LayoutView::new(&self.tree, &self.pagination, self.measurer.as_ref())
    }

    // ========== Selection ==========

    /// Replace the selection, updating line overlays incrementally
    pub fn set_selection(&mut self, selection: Selection) -> Result<SelectionTransition> {
        time_scope!("set_selection", TimerCategory::Selection);
        let old = self.selection;
        let old_range = (!old.is_collapsed()).then_some(old.range());
        let transition = if old.is_collapsed() && selection.is_collapsed() {
            SelectionTransition::Cleared
        } else {
            select_document(&mut self.tree, old_range, selection.range())?
        };
        self.selection = selection;
        Ok(transition)
    }

    /// Collapse the selection onto `endpoint`
    pub fn set_caret(&mut self, endpoint: RangeEndpoint) -> Result<()> {
        let mut selection = self.selection;
        selection.set_caret(endpoint);
        self.set_selection(selection)?;
        Ok(())
    }

    /// Move the focus to `endpoint`, keeping the anchor
    pub fn extend_selection(&mut self, endpoint: RangeEndpoint) -> Result<SelectionTransition> {
        let mut selection = self.selection;
        selection.extend_to(&self.tree, endpoint)?;
        self.set_selection(selection)
    }

    pub fn select_all(&mut self) -> Result<()> {
        let selection = Selection::select_all(&self.tree)?;
        self.set_selection(selection)?;
        Ok(())
    }

    /// Move or extend the caret. Returns whether the focus moved.
    pub fn move_caret(&mut self, direction: Direction, unit: MovementUnit, extend: bool) -> Result<bool> {
        let result = {
            let view = self.view();
            Navigator::new(&view).navigate(
                &self.selection,
                direction,
                unit,
                NavigationOptions {
                    extend_selection: extend,
                },
            )?
        };
        self.set_selection(result.selection)?;
        Ok(result.moved)
    }

    /// Position under a document-space point
    pub fn position_at(&self, x: f32, y: f32) -> Option<RangeEndpoint> {
        let view = self.view();
        let (line, line_offset) = view.hit_test(x, y)?;
        let line_start = self.tree.line_start_offset(line)?;
        RangeEndpoint::resolve(&self.tree, line, line_start + line_offset, line_offset == 0).ok()
    }

    // ========== Editing ==========

    /// Run one command through the whole pipeline
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome> {
        debug!(?command, "applying edit");
        let mut cx = EditContext::default();
        cx.pages.extend(self.pagination.page_of(self.selection.range().start_node()));

        match command {
            EditCommand::InsertText(text) => self.insert_text(&mut cx, &text)?,
            EditCommand::InsertNewline => self.insert_newline(&mut cx)?,
            EditCommand::DeleteBackward => self.delete_backward(&mut cx)?,
            EditCommand::DeleteForward => self.delete_forward(&mut cx)?,
            EditCommand::RemoveSelection => self.remove_selection(&mut cx)?,
            EditCommand::SetNodeAttribute { key, value } => self.set_node_attribute(&mut cx, &key, &value)?,
            EditCommand::InsertParagraph { after, text } => self.insert_paragraph(&mut cx, after, &text)?,
            EditCommand::RemoveNode(node) => self.remove_node(&mut cx, node)?,
        }

        if !cx.changed {
            return Ok(EditOutcome::default());
        }
        self.settle(cx)
    }

    fn insert_text(&mut self, cx: &mut EditContext, text: &str) -> Result<()> {
        if !self.selection.is_collapsed() {
            self.remove_selection(cx)?;
        }
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.insert_newline(cx)?;
            }
            if part.is_empty() {
                continue;
            }
            let focus = *self.selection.focus();
            let node = focus.node();
            let info = self
                .tree
                .insert_text(node, focus.node_offset, part, focus.is_start_of_line)?;
            cx.touch(&self.pagination, node, info.line_index);
            let offset = focus.node_offset + part.chars().count();
            self.selection
                .set_caret(RangeEndpoint::resolve_in_node(&self.tree, node, offset, false)?);
        }
        Ok(())
    }

    fn insert_newline(&mut self, cx: &mut EditContext) -> Result<()> {
        if !self.selection.is_collapsed() {
            self.remove_selection(cx)?;
        }
        let focus = *self.selection.focus();
        // The start of a continuation is the end of the node before it
        let (node, offset) = match (focus.node_offset, self.tree.previous_linked(focus.node())) {
            (0, Some(previous)) => (previous, self.tree.node_length(previous)),
            _ => (focus.node(), focus.node_offset),
        };

        let new_node = self.tree.split(node, offset)?;
        let last_line = self.tree.lines_of(node)?.len().saturating_sub(1);
        cx.touch(&self.pagination, node, last_line);
        cx.reflow(&self.pagination, new_node);
        self.drop_empty_members(cx, self.tree.chain_head(node))?;
        self.selection
            .set_caret(RangeEndpoint::resolve_in_node(&self.tree, new_node, 0, true)?);
        Ok(())
    }

    fn delete_backward(&mut self, cx: &mut EditContext) -> Result<()> {
        if !self.selection.is_collapsed() {
            return self.remove_selection(cx);
        }
        let focus = *self.selection.focus();
        let head = self.tree.chain_head(focus.node());
        let offset = focus.info.chain_offset();

        if offset == 0 {
            let Some(previous) = self.tree.previous_leaf(head) else {
                return Ok(());
            };
            let previous_head = self.tree.chain_head(previous);
            let join_at = self.tree.chain_length(previous_head);
            let adopted = self.tree.join_into(previous, head)?;
            cx.removed(&self.pagination, head);
            cx.reflow(&self.pagination, previous);
            for node in adopted {
                cx.reflow(&self.pagination, node);
            }
            self.selection
                .set_caret(endpoint_in_chain(&self.tree, previous_head, join_at, false)?);
            return Ok(());
        }

        let boundaries = grapheme_offsets(&self.tree.paragraph_text(head));
        let start = boundaries
            .iter()
            .rev()
            .copied()
            .find(|b| *b < offset)
            .unwrap_or(0);
        self.remove_chain_range(cx, head, start, offset)?;
        self.selection
            .set_caret(endpoint_in_chain(&self.tree, head, start, false)?);
        Ok(())
    }

    fn delete_forward(&mut self, cx: &mut EditContext) -> Result<()> {
        if !self.selection.is_collapsed() {
            return self.remove_selection(cx);
        }
        let focus = *self.selection.focus();
        let head = self.tree.chain_head(focus.node());
        let offset = focus.info.chain_offset();
        let length = self.tree.chain_length(head);

        if offset >= length {
            let last = self.tree.chain(head).last().copied().unwrap_or(head);
            let Some(next) = self.tree.next_leaf(last) else {
                return Ok(());
            };
            let adopted = self.tree.join_into(last, next)?;
            cx.removed(&self.pagination, next);
            cx.reflow(&self.pagination, last);
            for node in adopted {
                cx.reflow(&self.pagination, node);
            }
            self.selection
                .set_caret(endpoint_in_chain(&self.tree, head, offset, false)?);
            return Ok(());
        }

        let boundaries = grapheme_offsets(&self.tree.paragraph_text(head));
        let end = boundaries
            .iter()
            .copied()
            .find(|b| *b > offset)
            .unwrap_or(length);
        self.remove_chain_range(cx, head, offset, end)?;
        self.selection
            .set_caret(endpoint_in_chain(&self.tree, head, offset, focus.is_start_of_line)?);
        Ok(())
    }

    fn remove_selection(&mut self, cx: &mut EditContext) -> Result<()> {
        if self.selection.is_collapsed() {
            return Ok(());
        }
        let range = *self.selection.range();
        let start_head = self.tree.chain_head(range.start_node());
        let end_head = self.tree.chain_head(range.end_node());
        let start = range.start_info().chain_offset();
        let end = range.end_info().chain_offset();

        if start_head == end_head {
            self.remove_chain_range(cx, start_head, start, end)?;
        } else {
            let start_length = self.tree.chain_length(start_head);
            self.remove_chain_range(cx, start_head, start, start_length)?;
            self.remove_chain_range(cx, end_head, 0, end)?;

            let start_last = self.tree.chain(start_head).last().copied().unwrap_or(start_head);
            let first = self.tree.node_position(start_last).ok_or(EditError::NoCaret)?;
            let last = self.tree.node_position(end_head).ok_or(EditError::NoCaret)?;
            let between: Vec<NodeId> = self
                .tree
                .node_index()
                .get(first + 1..last)
                .map(<[NodeId]>::to_vec)
                .unwrap_or_default();
            for node in between {
                cx.removed(&self.pagination, node);
                self.tree.remove_node(node)?;
            }

            let adopted = self.tree.join_into(start_last, end_head)?;
            cx.removed(&self.pagination, end_head);
            cx.reflow(&self.pagination, start_last);
            for node in adopted {
                cx.reflow(&self.pagination, node);
            }
        }

        debug!(start, end, "removed selection");
        self.selection.set_caret(endpoint_in_chain(
            &self.tree,
            start_head,
            start,
            range.start().is_start_of_line,
        )?);
        Ok(())
    }

    fn set_node_attribute(&mut self, cx: &mut EditContext, key: &str, value: &str) -> Result<()> {
        let range = *self.selection.range();
        let first = self
            .tree
            .node_position(self.tree.chain_head(range.start_node()))
            .ok_or(EditError::NoCaret)?;
        let end_chain = self.tree.chain(range.end_node());
        let last = end_chain
            .last()
            .and_then(|n| self.tree.node_position(*n))
            .ok_or(EditError::NoCaret)?;

        let nodes: Vec<NodeId> = self
            .tree
            .node_index()
            .get(first..=last)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|n| self.tree.is_leaf(*n))
            .collect();
        for node in nodes {
            self.tree
                .node_mut(node)
                .ok_or(doc_model::DocModelError::NodeNotFound(node))?
                .set_attribute(key, value)?;
            cx.reflow(&self.pagination, node);
        }
        Ok(())
    }

    fn insert_paragraph(&mut self, cx: &mut EditContext, after: Option<NodeId>, text: &str) -> Result<()> {
        let mut anchor = match after {
            Some(node) => {
                if self.tree.node_position(node).is_none() {
                    return Err(doc_model::DocModelError::NodeNotFound(node).into());
                }
                if !self.tree.is_leaf(node) {
                    return Err(EditError::InvalidCommand(format!(
                        "cannot insert a paragraph after branch {}",
                        node
                    )));
                }
                self.tree.chain(node).last().copied()
            }
            None => None,
        };
        if let Some(node) = anchor {
            cx.pages.extend(self.pagination.page_of(node));
        }

        let mut last = None;
        for part in text.split('\n') {
            let node = self.tree.create_paragraph_after(anchor)?;
            if !part.is_empty() {
                self.tree.insert_text(node, 0, part, false)?;
            }
            cx.reflow(&self.pagination, node);
            anchor = Some(node);
            last = Some(node);
        }

        if let Some(node) = last {
            let length = self.tree.node_length(node);
            self.selection
                .set_caret(RangeEndpoint::resolve_in_node(&self.tree, node, length, false)?);
        }
        Ok(())
    }

    fn remove_node(&mut self, cx: &mut EditContext, node: NodeId) -> Result<()> {
        if self.tree.node_position(node).is_none() {
            return Err(doc_model::DocModelError::NodeNotFound(node).into());
        }
        self.selection.collapse(false);
        let focus = *self.selection.focus();
        let replacement = if focus.node() == node {
            if let Some(previous) = self
                .tree
                .previous_linked(node)
                .or_else(|| self.tree.previous_leaf(node))
            {
                Some((previous, self.tree.node_length(previous), false))
            } else {
                self.tree
                    .next_linked(node)
                    .or_else(|| self.tree.next_leaf(node))
                    .map(|next| (next, 0, true))
            }
        } else {
            None
        };

        cx.removed(&self.pagination, node);
        self.tree.remove_node(node)?;

        if self.tree.first_leaf().is_none() {
            let empty = self.tree.create_paragraph_after(None)?;
            self.selection
                .set_caret(RangeEndpoint::resolve_in_node(&self.tree, empty, 0, true)?);
        } else if let Some((target, offset, is_start_of_line)) = replacement {
            self.selection
                .set_caret(RangeEndpoint::resolve_in_node(&self.tree, target, offset, is_start_of_line)?);
        } else {
            // Offsets inside other nodes are unaffected, only line ids need refreshing
            let mut range = *self.selection.range();
            range.refresh(&self.tree)?;
            self.selection = Selection::new(range, false);
        }
        Ok(())
    }

    /// Remove paragraph-wide `[start, end)` from the chain starting at `head`
    fn remove_chain_range(&mut self, cx: &mut EditContext, head: NodeId, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let mut member_start = 0;
        for member in self.tree.chain(head) {
            let length = self.tree.node_length(member);
            let (s, e) = (start.max(member_start), end.min(member_start + length));
            if s < e {
                let first_changed = self.tree.remove_range(member, s - member_start, e - member_start)?;
                cx.touch(&self.pagination, member, first_changed);
            }
            member_start += length;
        }
        self.drop_empty_members(cx, head)
    }

    /// Drop continuations that ran empty; an empty head absorbs its
    /// continuation instead so the paragraph keeps its identity.
    fn drop_empty_members(&mut self, cx: &mut EditContext, head: NodeId) -> Result<()> {
        let chain = self.tree.chain(head);
        if chain.len() < 2 {
            return Ok(());
        }
        for member in chain.iter().skip(1) {
            if self.tree.node_length(*member) == 0 {
                cx.removed(&self.pagination, *member);
                self.tree.remove_node(*member)?;
            }
        }
        if self.tree.node_length(head) == 0 {
            if let Some(merged) = self.tree.merge_linked(head)? {
                cx.removed(&self.pagination, merged);
                cx.reflow(&self.pagination, head);
            }
        }
        Ok(())
    }

    /// Normalize, repaginate and re-derive the selection
    fn settle(&mut self, cx: EditContext) -> Result<EditOutcome> {
        let reversed = self.selection.is_reversed();
        let start = Anchor::capture(&self.tree, self.selection.range().start());
        let end = Anchor::capture(&self.tree, self.selection.range().end());

        let measurer = Arc::clone(&self.measurer);
        let normalizer = Normalizer::for_tree(measurer.as_ref(), &self.tree);
        {
            time_scope!("normalize", TimerCategory::Normalize);
            for (node, line_index) in &cx.touched {
                if self.tree.is_leaf(*node) && !cx.reflow.contains(node) {
                    normalizer.normalize(&mut self.tree, *node, *line_index)?;
                }
            }
            for node in &cx.reflow {
                if self.tree.is_leaf(*node) {
                    normalizer.reflow(&mut self.tree, *node)?;
                }
            }
        }

        let mut events: Vec<LayoutEvent> = cx
            .removed
            .iter()
            .map(|node| LayoutEvent::NodeRemoved { node: *node })
            .collect();
        let from = cx.pages.iter().copied().min().unwrap_or(0);
        self.repaginate(&normalizer, from, &mut events)?;

        {
            time_scope!("restore_selection", TimerCategory::Selection);
            let start = start.resolve(&self.tree)?;
            let end = end.resolve(&self.tree)?;
            self.selection = Selection::new(doc_model::Range::from_endpoints(start, end), reversed);
            clear_overlays(&mut self.tree)?;
            if !self.selection.is_collapsed() {
                select_document(&mut self.tree, None, self.selection.range())?;
            }
        }

        Ok(EditOutcome {
            events,
            changed: true,
        })
    }

    /// Repaginate, then reflow and repaginate again for every round in
    /// which pagination merged linked nodes back together
    fn repaginate(&mut self, normalizer: &Normalizer<'_>, from: usize, events: &mut Vec<LayoutEvent>) -> Result<()> {
        time_scope!("repaginate", TimerCategory::Paginate);
        let mut seen = events.len();
        events.extend(self.pagination.repaginate(&mut self.tree, self.measurer.as_ref(), from)?);

        for round in 0.. {
            let merged: Vec<NodeId> = events[seen..]
                .iter()
                .filter_map(|e| match e {
                    LayoutEvent::NodesMerged { into, .. } => Some(*into),
                    _ => None,
                })
                .filter(|n| self.tree.is_leaf(*n))
                .collect();
            seen = events.len();
            if merged.is_empty() {
                break;
            }
            if round >= MAX_MERGE_ROUNDS {
                warn!(rounds = round, "merge reflow did not settle");
                break;
            }

            for node in &merged {
                normalizer.reflow(&mut self.tree, *node)?;
            }
            // A merge can leave its page overflowing even when the reflow is a no-op
            let from = merged
                .iter()
                .filter_map(|n| self.pagination.page_of(*n))
                .min()
                .unwrap_or(0);
            events.extend(self.pagination.repaginate(&mut self.tree, self.measurer.as_ref(), from)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_engine::MonospaceMeasurer;

    /// 10px per char, 20px lines, 200px wide content
    fn settings() -> EditorSettings {
        let mut settings = EditorSettings::default();
        settings.page.width = 300.0;
        settings.document.font_size = 10.0;
        settings.document.line_height = 2.0;
        settings
    }

    fn document(paragraphs: &[&str]) -> Document {
        Document::from_paragraphs(settings(), Arc::new(MonospaceMeasurer::new(1.0)), paragraphs).unwrap()
    }

    fn line_texts(doc: &Document, node: NodeId) -> Vec<String> {
        doc.tree()
            .lines_of(node)
            .unwrap()
            .iter()
            .map(|l| doc.tree().line(*l).unwrap().text().to_string())
            .collect()
    }

    fn caret_to(doc: &mut Document, paragraph: usize, offset: usize) {
        let node = doc.tree().node_index()[paragraph];
        let endpoint = RangeEndpoint::resolve_in_node(doc.tree(), node, offset, false).unwrap();
        doc.set_caret(endpoint).unwrap();
    }

    #[test]
    fn test_insert_moves_caret() {
        let mut doc = document(&["abc"]);
        caret_to(&mut doc, 0, 1);
        doc.apply(EditCommand::InsertText("XY".into())).unwrap();
        assert_eq!(doc.tree().plain_text(), "aXYbc");
        assert_eq!(doc.selection().focus().node_offset, 3);
    }

    #[test]
    fn test_newline_splits_paragraph() {
        let mut doc = document(&["hello world"]);
        caret_to(&mut doc, 0, 5);
        doc.apply(EditCommand::InsertNewline).unwrap();
        assert_eq!(doc.tree().plain_text(), "hello\n world");
        let second = doc.tree().node_index()[1];
        assert_eq!(doc.selection().focus().node(), second);
        assert_eq!(doc.selection().focus().node_offset, 0);
    }

    #[test]
    fn test_text_with_newlines() {
        let mut doc = document(&[""]);
        doc.apply(EditCommand::InsertText("one\ntwo".into())).unwrap();
        assert_eq!(doc.tree().plain_text(), "one\ntwo");
        assert_eq!(doc.selection().focus().node_offset, 3);
    }

    #[test]
    fn test_backspace_joins_paragraphs() {
        let mut doc = document(&["abc", "def"]);
        caret_to(&mut doc, 1, 0);
        let outcome = doc.apply(EditCommand::DeleteBackward).unwrap();
        assert_eq!(doc.tree().plain_text(), "abcdef");
        assert_eq!(doc.selection().focus().node_offset, 3);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, LayoutEvent::NodeRemoved { .. })));
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let mut doc = document(&["abc"]);
        caret_to(&mut doc, 0, 0);
        let outcome = doc.apply(EditCommand::DeleteBackward).unwrap();
        assert!(!outcome.changed);
        assert_eq!(doc.tree().plain_text(), "abc");
    }

    #[test]
    fn test_delete_forward() {
        let mut doc = document(&["abc", "def"]);
        caret_to(&mut doc, 0, 1);
        doc.apply(EditCommand::DeleteForward).unwrap();
        assert_eq!(doc.tree().plain_text(), "ac\ndef");
        caret_to(&mut doc, 0, 2);
        doc.apply(EditCommand::DeleteForward).unwrap();
        assert_eq!(doc.tree().plain_text(), "acdef");
        caret_to(&mut doc, 0, 5);
        assert!(!doc.apply(EditCommand::DeleteForward).unwrap().changed);
    }

    #[test]
    fn test_remove_selection_across_paragraphs() {
        let mut doc = document(&["abc", "middle", "def"]);
        let nodes = doc.tree().node_index().to_vec();
        let start = RangeEndpoint::resolve_in_node(doc.tree(), nodes[0], 1, false).unwrap();
        let end = RangeEndpoint::resolve_in_node(doc.tree(), nodes[2], 2, false).unwrap();
        doc.set_caret(start).unwrap();
        doc.extend_selection(end).unwrap();

        doc.apply(EditCommand::RemoveSelection).unwrap();
        assert_eq!(doc.tree().plain_text(), "af");
        assert_eq!(doc.tree().node_count(), 1);
        assert!(doc.selection().is_collapsed());
        assert_eq!(doc.selection().focus().node_offset, 1);
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut doc = document(&["hello"]);
        let node = doc.tree().node_index()[0];
        let end = RangeEndpoint::resolve_in_node(doc.tree(), node, 4, false).unwrap();
        caret_to(&mut doc, 0, 1);
        doc.extend_selection(end).unwrap();
        doc.apply(EditCommand::InsertText("a".into())).unwrap();
        assert_eq!(doc.tree().plain_text(), "hao");
    }

    #[test]
    fn test_set_node_attribute_rewraps() {
        let mut doc = document(&["aaaa bbbb cccc dddd"]);
        let node = doc.tree().node_index()[0];
        assert_eq!(line_texts(&doc, node).len(), 1);
        doc.apply(EditCommand::SetNodeAttribute {
            key: "font-size".into(),
            value: "20".into(),
        })
        .unwrap();
        assert!(line_texts(&doc, node).len() > 1);
        assert_eq!(doc.tree().plain_text(), "aaaa bbbb cccc dddd");
    }

    #[test]
    fn test_unknown_attribute_is_an_error() {
        let mut doc = document(&["abc"]);
        let err = doc
            .apply(EditCommand::SetNodeAttribute {
                key: "colour".into(),
                value: "red".into(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            EditError::DocModel(doc_model::DocModelError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_insert_and_remove_paragraph() {
        let mut doc = document(&["first"]);
        let first = doc.tree().node_index()[0];
        doc.apply(EditCommand::InsertParagraph {
            after: Some(first),
            text: "second".into(),
        })
        .unwrap();
        assert_eq!(doc.tree().plain_text(), "first\nsecond");
        let second = doc.tree().node_index()[1];
        assert_eq!(doc.selection().focus().node(), second);

        let outcome = doc.apply(EditCommand::RemoveNode(second)).unwrap();
        assert!(outcome.events.contains(&LayoutEvent::NodeRemoved { node: second }));
        assert_eq!(doc.tree().plain_text(), "first");
        assert_eq!(doc.selection().focus().node(), first);
        assert_eq!(doc.selection().focus().node_offset, 5);

        doc.apply(EditCommand::RemoveNode(first)).unwrap();
        assert_eq!(doc.tree().node_count(), 1);
        assert_eq!(doc.tree().plain_text(), "");
    }

    #[test]
    fn test_remove_missing_node_fails() {
        let mut doc = document(&["abc"]);
        assert!(doc.apply(EditCommand::RemoveNode(NodeId::new())).is_err());
    }

    #[test]
    fn test_position_at_hits_text() {
        let doc = document(&["abcdef"]);
        // Content starts at x 50, y 70
        let position = doc.position_at(82.0, 75.0).unwrap();
        assert_eq!(position.node_offset, 3);
    }
}
