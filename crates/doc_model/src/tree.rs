//! Document tree storage and operations
//!
//! Nodes and lines live in flat tables keyed by id. Every cross reference
//! (owning node of a line, linked neighbours of a leaf, branch children) is
//! an id resolved through these tables.

use crate::{
    DocModelError, EditorSettings, LeafData, Line, LineContent, LineId, LineOffsetInfo, Node,
    NodeId, Result,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use text_engine::TextStyle;

/// The complete document tree
#[derive(Debug, Clone)]
pub struct DocumentTree {
    /// Top-level nodes in reading order
    node_index: Vec<NodeId>,
    nodes: HashMap<NodeId, Node>,
    lines: HashMap<LineId, Line>,
    settings: EditorSettings,
}

impl DocumentTree {
    /// Create a tree without any node
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            node_index: Vec::new(),
            nodes: HashMap::new(),
            lines: HashMap::new(),
            settings,
        }
    }

    /// Create a tree holding a single empty paragraph
    pub fn with_empty_paragraph(settings: EditorSettings) -> Self {
        let mut tree = Self::new(settings);
        let node = Node::new_leaf();
        let id = tree.push_node(node);
        tree.attach_new_line(id, 0, LineContent::new());
        tree
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        &mut self.settings
    }

    /// Measurement style of a node: document defaults overridden by node attributes
    pub fn text_style(&self, node: NodeId) -> TextStyle {
        let document = &self.settings.document;
        let attributes = self.nodes.get(&node).map(Node::attributes);
        let font_size = attributes
            .and_then(|a| a.font_size)
            .unwrap_or(document.font_size);
        let line_height = attributes
            .and_then(|a| a.line_height)
            .unwrap_or(document.line_height);
        let style = TextStyle::new(font_size, line_height);
        match &document.font_family {
            Some(family) => style.with_family(family.clone()),
            None => style,
        }
    }

    // ========== Lookup ==========

    pub fn node_index(&self) -> &[NodeId] {
        &self.node_index
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn node_position(&self, id: NodeId) -> Option<usize> {
        self.node_index.iter().position(|n| *n == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    /// Mutable access for selection bookkeeping; content goes through
    /// [`Self::line_content_mut`].
    pub fn line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.lines.get_mut(&id)
    }

    /// Mutable line content, invalidating the owning node's offset cache
    pub fn line_content_mut(&mut self, id: LineId) -> Result<&mut LineContent> {
        let node = self
            .lines
            .get(&id)
            .ok_or(DocModelError::LineNotFound(id))?
            .node();
        if let Some(leaf) = self.nodes.get_mut(&node).and_then(Node::as_leaf_mut) {
            leaf.invalidate();
        }
        self.lines
            .get_mut(&id)
            .map(Line::content_mut)
            .ok_or(DocModelError::LineNotFound(id))
    }

    pub fn leaf(&self, id: NodeId) -> Result<&LeafData> {
        self.nodes
            .get(&id)
            .ok_or(DocModelError::NodeNotFound(id))?
            .as_leaf()
            .ok_or(DocModelError::NotALeaf(id))
    }

    fn leaf_mut(&mut self, id: NodeId) -> Result<&mut LeafData> {
        let leaf = self
            .nodes
            .get_mut(&id)
            .ok_or(DocModelError::NodeNotFound(id))?
            .as_leaf_mut()
            .ok_or(DocModelError::NotALeaf(id))?;
        leaf.invalidate();
        Ok(leaf)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(Node::is_leaf)
    }

    pub fn lines_of(&self, id: NodeId) -> Result<&[LineId]> {
        Ok(self.leaf(id)?.lines())
    }

    /// Owning node and index of a line
    pub fn line_position(&self, line: LineId) -> Option<(NodeId, usize)> {
        let node = self.lines.get(&line)?.node();
        let index = self.leaf(node).ok()?.lines.iter().position(|l| *l == line)?;
        Some((node, index))
    }

    /// Node offset where each line starts, memoized until the node changes
    pub fn line_starts(&self, id: NodeId) -> Result<&[usize]> {
        let leaf = self.leaf(id)?;
        let starts = leaf.line_starts.get_or_init(|| {
            let mut acc = 0;
            leaf.lines
                .iter()
                .map(|line| {
                    let start = acc;
                    acc += self.lines.get(line).map_or(0, Line::len);
                    start
                })
                .collect()
        });
        Ok(starts.as_slice())
    }

    /// Node offset at which a line starts
    pub fn line_start_offset(&self, line: LineId) -> Option<usize> {
        let (node, index) = self.line_position(line)?;
        self.line_starts(node).ok()?.get(index).copied()
    }

    /// Char length of a node, zero for branches
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.leaf(id) {
            Ok(leaf) => leaf
                .lines
                .iter()
                .filter_map(|l| self.lines.get(l))
                .map(Line::len)
                .sum(),
            Err(_) => 0,
        }
    }

    /// Text of one node
    pub fn node_text(&self, id: NodeId) -> String {
        self.nodes
            .get(&id)
            .map(Node::lines)
            .unwrap_or(&[])
            .iter()
            .filter_map(|l| self.lines.get(l))
            .map(Line::text)
            .collect()
    }

    /// Text of the whole paragraph a node belongs to
    pub fn paragraph_text(&self, id: NodeId) -> String {
        self.chain(id).iter().map(|n| self.node_text(*n)).collect()
    }

    /// Text of the document, one paragraph per line
    pub fn plain_text(&self) -> String {
        let paragraphs: Vec<String> = self
            .node_index
            .iter()
            .filter(|id| self.is_leaf(**id) && self.previous_linked(**id).is_none())
            .map(|id| self.paragraph_text(*id))
            .collect();
        paragraphs.join("\n")
    }

    /// Text of every line of every node in reading order, without separators
    pub fn flattened_text(&self) -> String {
        self.node_index.iter().map(|id| self.node_text(*id)).collect()
    }

    /// Next leaf after `id` in reading order
    pub fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        let pos = self.node_position(id)?;
        self.node_index[pos + 1..]
            .iter()
            .copied()
            .find(|n| self.is_leaf(*n))
    }

    /// Previous leaf before `id` in reading order
    pub fn previous_leaf(&self, id: NodeId) -> Option<NodeId> {
        let pos = self.node_position(id)?;
        self.node_index[..pos]
            .iter()
            .rev()
            .copied()
            .find(|n| self.is_leaf(*n))
    }

    pub fn first_leaf(&self) -> Option<NodeId> {
        self.node_index.iter().copied().find(|n| self.is_leaf(*n))
    }

    pub fn last_leaf(&self) -> Option<NodeId> {
        self.node_index.iter().rev().copied().find(|n| self.is_leaf(*n))
    }

    /// Line following `line` in reading order, crossing node boundaries
    pub fn line_after(&self, line: LineId) -> Option<LineId> {
        let (node, index) = self.line_position(line)?;
        let lines = self.leaf(node).ok()?.lines();
        if let Some(next) = lines.get(index + 1) {
            return Some(*next);
        }
        let next_node = self.next_leaf(node)?;
        self.leaf(next_node).ok()?.lines().first().copied()
    }

    /// Line preceding `line` in reading order, crossing node boundaries
    pub fn line_before(&self, line: LineId) -> Option<LineId> {
        let (node, index) = self.line_position(line)?;
        if index > 0 {
            return self.leaf(node).ok()?.lines().get(index - 1).copied();
        }
        let previous = self.previous_leaf(node)?;
        self.leaf(previous).ok()?.lines().last().copied()
    }

    /// Compare two (node, offset) positions in reading order
    pub fn compare_positions(&self, a: (NodeId, usize), b: (NodeId, usize)) -> Option<Ordering> {
        let pa = self.node_position(a.0)?;
        let pb = self.node_position(b.0)?;
        Some(pa.cmp(&pb).then(a.1.cmp(&b.1)))
    }

    // ========== Node CRUD ==========

    /// Insert a top-level node at `index` in reading order
    pub fn insert_node(&mut self, index: usize, node: Node) -> Result<NodeId> {
        if index > self.node_index.len() {
            return Err(DocModelError::InvalidOperation(format!(
                "node index {} out of bounds ({})",
                index,
                self.node_index.len()
            )));
        }
        let id = node.id();
        self.nodes.insert(id, node);
        self.node_index.insert(index, id);
        Ok(id)
    }

    /// Insert a top-level node right after `anchor`, or first when `None`
    pub fn insert_node_after(&mut self, anchor: Option<NodeId>, node: Node) -> Result<NodeId> {
        let index = match anchor {
            Some(anchor) => self
                .node_position(anchor)
                .ok_or(DocModelError::NodeNotFound(anchor))?
                + 1,
            None => 0,
        };
        self.insert_node(index, node)
    }

    pub fn push_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        self.node_index.push(id);
        id
    }

    /// Insert an empty paragraph after `anchor` (or first) and return it
    pub fn create_paragraph_after(&mut self, anchor: Option<NodeId>) -> Result<NodeId> {
        let id = self.insert_node_after(anchor, Node::new_leaf())?;
        self.attach_new_line(id, 0, LineContent::new());
        Ok(id)
    }

    /// Add a child node to a branch
    pub fn add_child(&mut self, branch: NodeId, child: Node) -> Result<NodeId> {
        let id = child.id();
        let data = self
            .nodes
            .get_mut(&branch)
            .ok_or(DocModelError::NodeNotFound(branch))?
            .as_branch_mut()
            .ok_or_else(|| DocModelError::InvalidOperation(format!("{} is not a branch", branch)))?;
        data.children.push(id);
        let is_leaf = child.is_leaf();
        self.nodes.insert(id, child);
        if is_leaf && self.leaf(id)?.lines.is_empty() {
            self.attach_new_line(id, 0, LineContent::new());
        }
        Ok(id)
    }

    /// Remove a node with its lines; a node in the middle of a linked chain
    /// leaves its neighbours linked to each other.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let node = self.nodes.remove(&id).ok_or(DocModelError::NodeNotFound(id))?;

        let (previous, next) = (node.previous_linked(), node.next_linked());
        if let Some(prev) = previous.and_then(|p| self.nodes.get_mut(&p)).and_then(Node::as_leaf_mut) {
            prev.next_linked = next;
        }
        if let Some(next_leaf) = next.and_then(|n| self.nodes.get_mut(&n)).and_then(Node::as_leaf_mut) {
            next_leaf.previous_linked = previous;
        }

        for line in node.lines() {
            self.lines.remove(line);
        }
        if let Some(branch) = node.as_branch() {
            for child in branch.children().to_vec() {
                self.remove_node(child)?;
            }
        }
        for other in self.nodes.values_mut() {
            if let Some(branch) = other.as_branch_mut() {
                branch.children.retain(|c| *c != id);
            }
        }
        self.node_index.retain(|n| *n != id);
        tracing::debug!(node = %id, "removed node");
        Ok(node)
    }

    // ========== Lines ==========

    /// Insert a line holding `content` at `index` of a leaf
    pub fn insert_line(&mut self, node: NodeId, index: usize, content: LineContent) -> Result<LineId> {
        let count = self.leaf(node)?.lines.len();
        if index > count {
            return Err(DocModelError::InvalidOperation(format!(
                "line index {} out of bounds ({})",
                index, count
            )));
        }
        Ok(self.attach_new_line(node, index, content))
    }

    /// Detach and drop a line
    pub fn remove_line(&mut self, line: LineId) -> Result<Line> {
        let (node, index) = self
            .line_position(line)
            .ok_or(DocModelError::LineNotFound(line))?;
        self.leaf_mut(node)?.lines.remove(index);
        self.lines.remove(&line).ok_or(DocModelError::LineNotFound(line))
    }

    /// Move lines `[start, end)` of `from` into `to` at `at`
    pub fn move_lines(
        &mut self,
        from: NodeId,
        start: usize,
        end: usize,
        to: NodeId,
        at: usize,
    ) -> Result<()> {
        let count = self.leaf(from)?.lines.len();
        if start > end || end > count {
            return Err(DocModelError::InvalidOperation(format!(
                "line range {}..{} out of bounds ({})",
                start, end, count
            )));
        }
        let target_count = self.leaf(to)?.lines.len();
        if at > target_count || (from == to) {
            return Err(DocModelError::InvalidOperation(format!(
                "cannot move lines into {} at {}",
                to, at
            )));
        }

        let moved: Vec<LineId> = self.leaf_mut(from)?.lines.drain(start..end).collect();
        for line in &moved {
            if let Some(l) = self.lines.get_mut(line) {
                l.set_node(to);
            }
        }
        let target = self.leaf_mut(to)?;
        target.lines.splice(at..at, moved);
        Ok(())
    }

    fn attach_new_line(&mut self, node: NodeId, index: usize, content: LineContent) -> LineId {
        let line = Line::with_content(node, content);
        let id = line.id();
        if let Ok(leaf) = self.leaf_mut(node) {
            leaf.lines.insert(index, id);
            self.lines.insert(id, line);
        }
        id
    }

    // ========== Offset resolution ==========

    /// Resolve a node-wide offset to a line.
    ///
    /// An offset at a wrap boundary resolves to the end of the earlier line
    /// unless `prefer_start_of_line` is set.
    pub fn range_info_for_offset(
        &self,
        node: NodeId,
        offset: usize,
        prefer_start_of_line: bool,
    ) -> Option<LineOffsetInfo> {
        let leaf = self.leaf(node).ok()?;
        let starts = self.line_starts(node).ok()?;
        let count = leaf.lines.len();
        for (i, line_id) in leaf.lines.iter().enumerate() {
            let line_length = self.lines.get(line_id)?.len();
            let start = starts[i];
            if offset > start + line_length {
                continue;
            }
            if prefer_start_of_line && offset == start + line_length && i + 1 < count {
                continue;
            }
            let line_offset = offset - start;
            return Some(LineOffsetInfo {
                node,
                line_index: i,
                line: *line_id,
                line_offset,
                node_offset: offset,
                line_length,
                is_end_of_line: line_offset == line_length,
                linked_node_offset: self.linked_node_offset(node),
            });
        }
        None
    }

    /// Resolve an offset counted from the head of the linked chain `node`
    /// belongs to.
    pub fn range_info_by_linked_nodes_offset(
        &self,
        node: NodeId,
        offset: usize,
        prefer_start_of_line: bool,
    ) -> Option<LineOffsetInfo> {
        let chain = self.chain(node);
        let mut remaining = offset;
        for (i, member) in chain.iter().enumerate() {
            let length = self.node_length(*member);
            let has_next = i + 1 < chain.len();
            if remaining < length || (remaining == length && !(prefer_start_of_line && has_next)) {
                return self.range_info_for_offset(*member, remaining, prefer_start_of_line);
            }
            remaining -= length;
        }
        None
    }

    // ========== Linked chains ==========

    pub fn previous_linked(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(Node::previous_linked)
    }

    pub fn next_linked(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(Node::next_linked)
    }

    /// Link `next` as the continuation of `previous`
    pub fn link_nodes(&mut self, previous: NodeId, next: NodeId) -> Result<()> {
        if self.leaf(previous)?.next_linked.is_some() {
            return Err(DocModelError::AlreadyLinked(previous));
        }
        if self.leaf(next)?.previous_linked.is_some() {
            return Err(DocModelError::AlreadyLinked(next));
        }
        self.leaf_mut(previous)?.next_linked = Some(next);
        self.leaf_mut(next)?.previous_linked = Some(previous);
        tracing::trace!(previous = %previous, next = %next, "linked nodes");
        Ok(())
    }

    /// Break the link after `id`, returning the detached continuation
    pub fn unlink_next(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        let next = self.leaf_mut(id)?.next_linked.take();
        if let Some(next) = next {
            self.leaf_mut(next)?.previous_linked = None;
        }
        Ok(next)
    }

    /// First node of the chain `id` belongs to
    pub fn chain_head(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(previous) = self.previous_linked(current) {
            current = previous;
        }
        current
    }

    /// Every node of the chain `id` belongs to, head first
    pub fn chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![self.chain_head(id)];
        while let Some(next) = chain.last().and_then(|n| self.next_linked(*n)) {
            chain.push(next);
        }
        chain
    }

    /// Sum of the lengths of the chain members before `id`
    pub fn linked_node_offset(&self, id: NodeId) -> usize {
        let mut offset = 0;
        let mut current = self.previous_linked(id);
        while let Some(previous) = current {
            offset += self.node_length(previous);
            current = self.previous_linked(previous);
        }
        offset
    }

    pub fn chain_length(&self, id: NodeId) -> usize {
        self.chain(id).iter().map(|n| self.node_length(*n)).sum()
    }

    // ========== Content edits ==========

    /// Insert text at a node-wide offset, returning where it landed
    pub fn insert_text(
        &mut self,
        node: NodeId,
        offset: usize,
        text: &str,
        prefer_start_of_line: bool,
    ) -> Result<LineOffsetInfo> {
        let info = self
            .range_info_for_offset(node, offset, prefer_start_of_line)
            .ok_or_else(|| DocModelError::IncorrectOffset {
                node_id: node,
                offset,
                length: self.node_length(node),
            })?;
        self.line_content_mut(info.line)?
            .insert_text(text, info.line_offset)?;
        Ok(info)
    }

    /// Remove node-wide `[start, end)`.
    ///
    /// Lines entirely inside the range are dropped, partially covered lines
    /// are spliced; the node always keeps at least one line. Returns the index
    /// of the first line that changed.
    pub fn remove_range(&mut self, node: NodeId, start: usize, end: usize) -> Result<usize> {
        let length = self.node_length(node);
        if start > end || end > length {
            return Err(DocModelError::IncorrectOffset {
                node_id: node,
                offset: if start > length { start } else { end },
                length,
            });
        }

        let lines = self.leaf(node)?.lines.clone();
        let starts = self.line_starts(node)?.to_vec();
        let mut first_changed = None;
        let mut dropped = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let line_start = starts[i];
            let line_end = line_start + self.lines.get(line).map_or(0, Line::len);
            let (s, e) = (start.max(line_start), end.min(line_end));
            if s >= e {
                continue;
            }
            first_changed.get_or_insert(i);
            if s == line_start && e == line_end {
                dropped.push(*line);
            } else {
                self.line_content_mut(*line)?
                    .remove_at(s - line_start, e - line_start)?;
            }
        }

        if dropped.len() == lines.len() {
            let keep = dropped.remove(0);
            let content = self.line_content_mut(keep)?;
            let len = content.len();
            content.remove_at(0, len)?;
        }
        for line in dropped {
            self.remove_line(line)?;
        }

        let remaining = self.leaf(node)?.lines.len();
        let first = match first_changed {
            Some(i) => i,
            None => self
                .range_info_for_offset(node, start, false)
                .map_or(0, |info| info.line_index),
        };
        Ok(first.min(remaining.saturating_sub(1)))
    }

    /// Split a node at a node-wide offset.
    ///
    /// Content before `offset` stays, the rest moves to a new sibling that
    /// also takes over the continuation chain. Splitting at the very end of a
    /// node with a linked continuation just detaches and returns it.
    pub fn split(&mut self, node: NodeId, offset: usize) -> Result<NodeId> {
        let length = self.node_length(node);
        if offset == length {
            if let Some(next) = self.unlink_next(node)? {
                tracing::debug!(node = %node, next = %next, "split detached linked node");
                return Ok(next);
            }
        }

        let info = self
            .range_info_for_offset(node, offset, true)
            .ok_or(DocModelError::IncorrectOffset {
                node_id: node,
                offset,
                length,
            })?;
        let attributes = self
            .nodes
            .get(&node)
            .map(|n| n.attributes().clone())
            .unwrap_or_default();
        let new_node = Node::new_leaf().with_attributes(attributes);
        let new_id = self.insert_node_after(Some(node), new_node)?;

        let tail = self
            .line_content_mut(info.line)?
            .cut_fragment(info.line_offset, info.line_length)?;
        let mut head_content = LineContent::new();
        head_content.append_fragment(&tail);
        self.attach_new_line(new_id, 0, head_content);

        let count = self.leaf(node)?.lines.len();
        self.move_lines(node, info.line_index + 1, count, new_id, 1)?;

        if info.line_offset == 0 && info.line_index > 0 {
            self.remove_line(info.line)?;
        }

        if let Some(next) = self.unlink_next(node)? {
            self.link_nodes(new_id, next)?;
        }
        tracing::debug!(node = %node, new_node = %new_id, offset, "split node");
        Ok(new_id)
    }

    /// Move lines from `line_index` on into a new linked continuation placed
    /// right after `node`.
    pub fn split_at_line(&mut self, node: NodeId, line_index: usize) -> Result<NodeId> {
        let count = self.leaf(node)?.lines.len();
        if line_index == 0 || line_index >= count {
            return Err(DocModelError::InvalidOperation(format!(
                "cannot split {} at line {} of {}",
                node, line_index, count
            )));
        }
        let attributes = self
            .nodes
            .get(&node)
            .map(|n| n.attributes().clone())
            .unwrap_or_default();
        let new_id = self.insert_node_after(Some(node), Node::new_leaf().with_attributes(attributes))?;
        self.move_lines(node, line_index, count, new_id, 0)?;
        if let Some(next) = self.unlink_next(node)? {
            self.link_nodes(new_id, next)?;
        }
        self.link_nodes(node, new_id)?;
        tracing::debug!(node = %node, continuation = %new_id, line_index, "split node by lines");
        Ok(new_id)
    }

    /// Move the first `count` lines of the continuation of `node` back into
    /// `node`, removing the continuation when it runs empty.
    pub fn pull_linked_lines(&mut self, node: NodeId, count: usize) -> Result<Option<NodeId>> {
        let Some(next) = self.next_linked(node) else {
            return Ok(None);
        };
        let available = self.leaf(next)?.lines.len();
        if count >= available {
            return self.merge_linked(node);
        }
        let at = self.leaf(node)?.lines.len();
        self.move_lines(next, 0, count, node, at)?;
        Ok(None)
    }

    /// Merge the linked continuation of `node` into it. Returns the removed node.
    pub fn merge_linked(&mut self, node: NodeId) -> Result<Option<NodeId>> {
        let Some(next) = self.next_linked(node) else {
            return Ok(None);
        };
        self.join_into(node, next)?;
        Ok(Some(next))
    }

    /// Append every line of `source` to `target` and remove `source`.
    ///
    /// `target` takes over the continuation of `source`. Adopted chain
    /// members inherit the attributes of `target` and are returned so the
    /// caller can reflow them.
    pub fn join_into(&mut self, target: NodeId, source: NodeId) -> Result<Vec<NodeId>> {
        if target == source {
            return Err(DocModelError::InvalidOperation(format!(
                "cannot join {} into itself",
                target
            )));
        }
        match self.next_linked(target) {
            Some(next) if next != source => return Err(DocModelError::AlreadyLinked(target)),
            _ => {}
        }
        let count = self.leaf(source)?.lines.len();
        let at = self.leaf(target)?.lines.len();
        self.move_lines(source, 0, count, target, at)?;

        self.unlink_next(target)?;
        let continuation = self.unlink_next(source)?;
        if let Some(previous) = self.previous_linked(source) {
            self.unlink_next(previous)?;
        }
        self.remove_node(source)?;
        let mut adopted = Vec::new();
        if let Some(continuation) = continuation {
            self.link_nodes(target, continuation)?;
            let attributes = self
                .node(target)
                .map(|n| n.attributes().clone())
                .ok_or(DocModelError::NodeNotFound(target))?;
            let mut next = Some(continuation);
            while let Some(member) = next {
                self.node_mut(member)
                    .ok_or(DocModelError::NodeNotFound(member))?
                    .set_attributes(attributes.clone());
                adopted.push(member);
                next = self.next_linked(member);
            }
        }
        tracing::debug!(into = %target, from = %source, adopted = adopted.len(), "joined nodes");
        Ok(adopted)
    }

    // ========== Consistency ==========

    /// Check structural invariants: index entries exist, linked pointers are
    /// symmetric, lines point back at their owner and every leaf has a line.
    pub fn validate(&self) -> Result<()> {
        for id in &self.node_index {
            let node = self.nodes.get(id).ok_or(DocModelError::NodeNotFound(*id))?;
            let Some(leaf) = node.as_leaf() else {
                continue;
            };
            if leaf.lines.is_empty() {
                return Err(DocModelError::InvalidOperation(format!("{} has no lines", id)));
            }
            for line in &leaf.lines {
                let owner = self.lines.get(line).ok_or(DocModelError::LineNotFound(*line))?.node();
                if owner != *id {
                    return Err(DocModelError::InvalidOperation(format!(
                        "line {} belongs to {} but is listed in {}",
                        line, owner, id
                    )));
                }
            }
            if let Some(next) = leaf.next_linked {
                if self.previous_linked(next) != Some(*id) {
                    return Err(DocModelError::InvalidOperation(format!(
                        "asymmetric link {} -> {}",
                        id, next
                    )));
                }
            }
            if let Some(previous) = leaf.previous_linked {
                if self.next_linked(previous) != Some(*id) {
                    return Err(DocModelError::InvalidOperation(format!(
                        "asymmetric link {} <- {}",
                        id, previous
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_lines(lines: &[&str]) -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::with_empty_paragraph(EditorSettings::default());
        let node = tree.node_index()[0];
        let first = tree.lines_of(node).unwrap()[0];
        tree.line_content_mut(first).unwrap().insert_text(lines[0], 0).unwrap();
        for (i, text) in lines.iter().enumerate().skip(1) {
            tree.insert_line(node, i, LineContent::from_text(text)).unwrap();
        }
        (tree, node)
    }

    #[test]
    fn test_empty_tree_has_one_paragraph() {
        let tree = DocumentTree::with_empty_paragraph(EditorSettings::default());
        assert_eq!(tree.node_count(), 1);
        let node = tree.node_index()[0];
        assert_eq!(tree.lines_of(node).unwrap().len(), 1);
        assert_eq!(tree.node_length(node), 0);
        tree.validate().unwrap();
    }

    #[test]
    fn test_range_info_for_offset() {
        let (tree, node) = tree_with_lines(&["hello ", "world"]);
        let info = tree.range_info_for_offset(node, 8, false).unwrap();
        assert_eq!(info.line_index, 1);
        assert_eq!(info.line_offset, 2);
        assert_eq!(info.line_length, 5);
        assert!(!info.is_end_of_line);

        let end = tree.range_info_for_offset(node, 11, false).unwrap();
        assert!(end.is_end_of_line);
        assert!(tree.range_info_for_offset(node, 12, false).is_none());
    }

    #[test]
    fn test_offset_cache_is_invalidated() {
        let (mut tree, node) = tree_with_lines(&["ab", "cd"]);
        assert_eq!(tree.line_starts(node).unwrap(), &[0, 2]);
        let first = tree.lines_of(node).unwrap()[0];
        tree.line_content_mut(first).unwrap().insert_text("xyz", 0).unwrap();
        assert_eq!(tree.line_starts(node).unwrap(), &[0, 5]);
    }

    #[test]
    fn test_insert_text_resolves_line() {
        let (mut tree, node) = tree_with_lines(&["one ", "two"]);
        let info = tree.insert_text(node, 5, "X", false).unwrap();
        assert_eq!(info.line_index, 1);
        assert_eq!(tree.node_text(node), "one tXwo");
        assert!(tree.insert_text(node, 42, "X", false).is_err());
    }

    #[test]
    fn test_split_moves_tail_to_new_node() {
        let (mut tree, node) = tree_with_lines(&["one ", "two ", "three"]);
        let new = tree.split(node, 6).unwrap();
        assert_eq!(tree.node_text(node), "one tw");
        assert_eq!(tree.node_text(new), "o three");
        assert_eq!(tree.node_index(), &[node, new]);
        assert_eq!(tree.lines_of(new).unwrap().len(), 2);
        tree.validate().unwrap();
    }

    #[test]
    fn test_split_at_line_start_drops_empty_line() {
        let (mut tree, node) = tree_with_lines(&["one ", "two"]);
        let new = tree.split(node, 4).unwrap();
        assert_eq!(tree.lines_of(node).unwrap().len(), 1);
        assert_eq!(tree.node_text(new), "two");
    }

    #[test]
    fn test_split_at_end_detaches_linked_node() {
        let (mut tree, node) = tree_with_lines(&["one ", "two"]);
        let continuation = tree.split_at_line(node, 1).unwrap();
        assert_eq!(tree.next_linked(node), Some(continuation));

        let detached = tree.split(node, 4).unwrap();
        assert_eq!(detached, continuation);
        assert_eq!(tree.next_linked(node), None);
        assert_eq!(tree.previous_linked(continuation), None);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_chain_addressing() {
        let (mut tree, node) = tree_with_lines(&["aaa ", "bbb ", "ccc"]);
        let second = tree.split_at_line(node, 1).unwrap();
        let third = tree.split_at_line(second, 1).unwrap();
        assert_eq!(tree.chain(third), vec![node, second, third]);
        assert_eq!(tree.chain_head(third), node);
        assert_eq!(tree.linked_node_offset(third), 8);
        assert_eq!(tree.chain_length(second), 11);

        let info = tree.range_info_by_linked_nodes_offset(node, 9, false).unwrap();
        assert_eq!(info.node, third);
        assert_eq!(info.node_offset, 1);
        assert_eq!(info.chain_offset(), 9);

        let boundary = tree.range_info_by_linked_nodes_offset(node, 4, false).unwrap();
        assert_eq!(boundary.node, node);
        let boundary = tree.range_info_by_linked_nodes_offset(node, 4, true).unwrap();
        assert_eq!(boundary.node, second);
        tree.validate().unwrap();
    }

    #[test]
    fn test_link_twice_fails() {
        let (mut tree, node) = tree_with_lines(&["a ", "b"]);
        let other = tree.create_paragraph_after(Some(node)).unwrap();
        tree.link_nodes(node, other).unwrap();
        let third = tree.create_paragraph_after(Some(other)).unwrap();
        assert!(matches!(
            tree.link_nodes(node, third),
            Err(DocModelError::AlreadyLinked(_))
        ));
    }

    #[test]
    fn test_remove_middle_of_chain_reconnects() {
        let (mut tree, node) = tree_with_lines(&["a ", "b ", "c"]);
        let second = tree.split_at_line(node, 1).unwrap();
        let third = tree.split_at_line(second, 1).unwrap();
        tree.remove_node(second).unwrap();
        assert_eq!(tree.next_linked(node), Some(third));
        assert_eq!(tree.previous_linked(third), Some(node));
        tree.validate().unwrap();
    }

    #[test]
    fn test_merge_linked_concatenates_lines() {
        let (mut tree, node) = tree_with_lines(&["a ", "b ", "c"]);
        let second = tree.split_at_line(node, 1).unwrap();
        let removed = tree.merge_linked(node).unwrap();
        assert_eq!(removed, Some(second));
        assert_eq!(tree.node_index(), &[node]);
        assert_eq!(tree.lines_of(node).unwrap().len(), 3);
        assert_eq!(tree.node_text(node), "a b c");
        tree.validate().unwrap();
    }

    #[test]
    fn test_join_into_adopted_chain_takes_target_attributes() {
        let (mut tree, node) = tree_with_lines(&["a ", "b"]);
        let other = tree.create_paragraph_after(Some(node)).unwrap();
        let first = tree.lines_of(other).unwrap()[0];
        tree.line_content_mut(first).unwrap().insert_text("c ", 0).unwrap();
        tree.insert_line(other, 1, LineContent::from_text("d ")).unwrap();
        tree.insert_line(other, 2, LineContent::from_text("e")).unwrap();
        let second = tree.split_at_line(other, 1).unwrap();
        let third = tree.split_at_line(second, 1).unwrap();
        for id in [other, second, third] {
            tree.node_mut(id).unwrap().set_attribute("font-size", "24").unwrap();
        }

        let adopted = tree.join_into(node, other).unwrap();
        assert_eq!(adopted, vec![second, third]);
        assert_eq!(tree.chain(node), vec![node, second, third]);
        for id in tree.chain(node) {
            assert_eq!(tree.text_style(id).font_size, 16.0);
        }
        tree.validate().unwrap();
    }

    #[test]
    fn test_remove_range_drops_covered_lines() {
        let (mut tree, node) = tree_with_lines(&["one ", "two ", "three"]);
        let first = tree.remove_range(node, 2, 9).unwrap();
        assert_eq!(first, 0);
        assert_eq!(tree.node_text(node), "onhree");
        assert_eq!(tree.lines_of(node).unwrap().len(), 2);

        tree.remove_range(node, 0, 6).unwrap();
        assert_eq!(tree.lines_of(node).unwrap().len(), 1);
        assert_eq!(tree.node_length(node), 0);
        tree.validate().unwrap();
    }

    #[test]
    fn test_line_navigation_crosses_nodes() {
        let (mut tree, node) = tree_with_lines(&["a ", "b"]);
        let other = tree.create_paragraph_after(Some(node)).unwrap();
        let last_of_first = tree.lines_of(node).unwrap()[1];
        let first_of_other = tree.lines_of(other).unwrap()[0];
        assert_eq!(tree.line_after(last_of_first), Some(first_of_other));
        assert_eq!(tree.line_before(first_of_other), Some(last_of_first));
        assert_eq!(tree.line_after(first_of_other), None);
    }

    #[test]
    fn test_text_style_uses_node_attributes() {
        let (mut tree, node) = tree_with_lines(&["a"]);
        assert_eq!(tree.text_style(node).font_size, 16.0);
        tree.node_mut(node).unwrap().set_attribute("font-size", "24").unwrap();
        assert_eq!(tree.text_style(node).font_size, 24.0);
    }

    #[test]
    fn test_plain_text_joins_paragraphs() {
        let (mut tree, node) = tree_with_lines(&["a ", "b"]);
        tree.split_at_line(node, 1).unwrap();
        let last = tree.node_index().last().copied();
        let other = tree.create_paragraph_after(last).unwrap();
        tree.insert_text(other, 0, "c", false).unwrap();
        assert_eq!(tree.plain_text(), "a b\nc");
        assert_eq!(tree.flattened_text(), "a bc");
    }
}
