//! Selection state and line overlays
//!
//! A [`Selection`] is a [`Range`] plus the direction it was made in and the
//! column memory used by vertical caret movement. The overlay each line
//! paints is kept on the [`doc_model::Line`] itself; [`select_document`]
//! updates those overlays incrementally, touching only the nodes whose
//! selection state actually changed.

use crate::{EditError, Result};
use doc_model::{DocumentTree, NodeId, Range, RangeEndpoint};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// The current selection of a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    range: Range,
    /// Focus is before the anchor
    reversed: bool,
    /// Remembered caret x for Up/Down
    sticky_x: Option<f32>,
    /// The last horizontal move went to a line end
    snap_to_line_end: bool,
}

impl Selection {
    pub fn new(range: Range, reversed: bool) -> Self {
        Self {
            range,
            reversed,
            sticky_x: None,
            snap_to_line_end: false,
        }
    }

    /// Collapsed selection at a node offset
    pub fn caret_at(tree: &DocumentTree, node: NodeId, node_offset: usize, is_start_of_line: bool) -> Result<Self> {
        Ok(Self::new(Range::caret(tree, node, node_offset, is_start_of_line)?, false))
    }

    /// Collapsed selection at an endpoint
    pub fn from_endpoint(endpoint: RangeEndpoint) -> Self {
        Self::new(Range::from_endpoints(endpoint, endpoint), false)
    }

    /// The whole document
    pub fn select_all(tree: &DocumentTree) -> Result<Self> {
        let first = tree.first_leaf().ok_or(EditError::NoCaret)?;
        let last = tree.last_leaf().ok_or(EditError::NoCaret)?;
        let start = RangeEndpoint::resolve_in_node(tree, first, 0, true)?;
        let end = RangeEndpoint::resolve_in_node(tree, last, tree.node_length(last), false)?;
        Ok(Self::new(Range::from_endpoints(start, end), false))
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    /// The fixed end of the selection
    pub fn anchor(&self) -> &RangeEndpoint {
        if self.reversed {
            self.range.end()
        } else {
            self.range.start()
        }
    }

    /// The moving end of the selection, where the caret is drawn
    pub fn focus(&self) -> &RangeEndpoint {
        if self.reversed {
            self.range.start()
        } else {
            self.range.end()
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_collapsed()
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn sticky_x(&self) -> Option<f32> {
        self.sticky_x
    }

    pub fn set_sticky_x(&mut self, x: Option<f32>) {
        self.sticky_x = x;
    }

    pub fn snap_to_line_end(&self) -> bool {
        self.snap_to_line_end
    }

    pub fn set_snap_to_line_end(&mut self, snap: bool) {
        self.snap_to_line_end = snap;
    }

    /// Collapse to `endpoint`, forgetting column memory
    pub fn set_caret(&mut self, endpoint: RangeEndpoint) {
        self.range = Range::from_endpoints(endpoint, endpoint);
        self.reversed = false;
        self.sticky_x = None;
        self.snap_to_line_end = false;
    }

    /// Move the focus to `focus`, keeping the anchor
    pub fn extend_to(&mut self, tree: &DocumentTree, focus: RangeEndpoint) -> Result<()> {
        let anchor = *self.anchor();
        let order = tree
            .compare_positions((focus.node(), focus.node_offset), (anchor.node(), anchor.node_offset))
            .ok_or(EditError::NoCaret)?;
        if order == Ordering::Less {
            self.range = Range::from_endpoints(focus, anchor);
            self.reversed = true;
        } else {
            self.range = Range::from_endpoints(anchor, focus);
            self.reversed = false;
        }
        Ok(())
    }

    /// Collapse onto the start or end boundary
    pub fn collapse(&mut self, to_start: bool) {
        self.range.collapse(to_start);
        self.reversed = false;
    }
}

/// How a selection update changed the set of selected nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTransition {
    /// Same nodes, only the boundary offsets moved
    ReselectEnd,
    ExtendDown,
    ExtendUp,
    ShrinkFromTop,
    ShrinkFromBottom,
    /// No usable previous selection, or both ends moved
    Full,
    /// The new range is collapsed
    Cleared,
}

/// Update line overlays from `old` to `new`.
///
/// Only nodes entering or leaving the selection and the nodes holding a
/// boundary of either range are visited.
pub fn select_document(tree: &mut DocumentTree, old: Option<&Range>, new: &Range) -> Result<SelectionTransition> {
    let old_span = old.filter(|r| !r.is_collapsed()).and_then(|r| node_span(tree, r));

    if new.is_collapsed() {
        if let Some((first, last)) = old_span {
            for node in leaves_between(tree, first, last) {
                unselect_node(tree, node)?;
            }
        }
        debug!(transition = ?SelectionTransition::Cleared, "selection updated");
        return Ok(SelectionTransition::Cleared);
    }

    let (new_first, new_last) = node_span(tree, new).ok_or(EditError::NoCaret)?;
    let transition = match old_span {
        None => SelectionTransition::Full,
        Some((old_first, old_last)) => classify((old_first, old_last), (new_first, new_last)),
    };

    let mut to_select = BTreeSet::new();
    let mut to_unselect = BTreeSet::new();
    match old_span {
        Some((old_first, old_last)) if transition != SelectionTransition::Full => {
            let (lo, hi) = (old_first.min(new_first), old_last.max(new_last));
            for position in lo..=hi {
                let in_old = (old_first..=old_last).contains(&position);
                let in_new = (new_first..=new_last).contains(&position);
                if in_new && !in_old {
                    to_select.insert(position);
                } else if in_old && !in_new {
                    to_unselect.insert(position);
                }
            }
            for boundary in [new_first, new_last, old_first, old_last] {
                if (new_first..=new_last).contains(&boundary) {
                    to_select.insert(boundary);
                }
            }
        }
        _ => {
            if let Some((old_first, old_last)) = old_span {
                to_unselect.extend(old_first..=old_last);
            }
            to_select.extend(new_first..=new_last);
        }
    }

    for position in to_unselect.difference(&to_select) {
        if let Some(node) = leaf_at(tree, *position) {
            unselect_node(tree, node)?;
        }
    }
    for position in &to_select {
        if let Some(node) = leaf_at(tree, *position) {
            select_node(tree, node, new)?;
        }
    }

    debug!(
        transition = ?transition,
        selected = to_select.len(),
        unselected = to_unselect.len(),
        "selection updated"
    );
    Ok(transition)
}

/// Remove every line overlay
pub fn clear_overlays(tree: &mut DocumentTree) -> Result<()> {
    let nodes: Vec<NodeId> = tree.node_index().to_vec();
    for node in nodes {
        if tree.is_leaf(node) {
            unselect_node(tree, node)?;
        }
    }
    Ok(())
}

fn classify(old: (usize, usize), new: (usize, usize)) -> SelectionTransition {
    match (new.0.cmp(&old.0), new.1.cmp(&old.1)) {
        (Ordering::Equal, Ordering::Equal) => SelectionTransition::ReselectEnd,
        (Ordering::Equal, Ordering::Greater) => SelectionTransition::ExtendDown,
        (Ordering::Equal, Ordering::Less) => SelectionTransition::ShrinkFromBottom,
        (Ordering::Less, Ordering::Equal) => SelectionTransition::ExtendUp,
        (Ordering::Greater, Ordering::Equal) => SelectionTransition::ShrinkFromTop,
        _ => SelectionTransition::Full,
    }
}

/// Positions in the node index of the first and last node of a range
fn node_span(tree: &DocumentTree, range: &Range) -> Option<(usize, usize)> {
    Some((
        tree.node_position(range.start_node())?,
        tree.node_position(range.end_node())?,
    ))
}

fn leaf_at(tree: &DocumentTree, position: usize) -> Option<NodeId> {
    tree.node_index()
        .get(position)
        .copied()
        .filter(|n| tree.is_leaf(*n))
}

fn leaves_between(tree: &DocumentTree, first: usize, last: usize) -> Vec<NodeId> {
    (first..=last).filter_map(|p| leaf_at(tree, p)).collect()
}

fn unselect_node(tree: &mut DocumentTree, node: NodeId) -> Result<()> {
    let lines = tree.lines_of(node)?.to_vec();
    for line in lines {
        if let Some(l) = tree.line_mut(line) {
            l.unselect();
        }
    }
    Ok(())
}

/// Mark the part of `node` covered by `range` on each of its lines
fn select_node(tree: &mut DocumentTree, node: NodeId, range: &Range) -> Result<()> {
    let start = if range.start_node() == node {
        range.start().node_offset
    } else {
        0
    };
    let end = if range.end_node() == node {
        range.end().node_offset
    } else {
        tree.node_length(node)
    };
    let lines = tree.lines_of(node)?.to_vec();
    let starts = tree.line_starts(node)?.to_vec();

    for (line, line_start) in lines.into_iter().zip(starts) {
        let Some(l) = tree.line_mut(line) else {
            continue;
        };
        let line_end = line_start + l.len();
        let overlaps = if l.is_empty() {
            start <= line_start && line_start <= end
        } else {
            line_start < end && line_end > start
        };
        if overlaps {
            l.select(start.max(line_start) - line_start, end.min(line_end) - line_start);
        } else {
            l.unselect();
        }
    }
    Ok(())
}
