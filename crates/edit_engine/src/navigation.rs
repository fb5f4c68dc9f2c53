//! Caret movement
//!
//! Left/Right walk grapheme boundaries of the whole paragraph, so a move
//! crosses wrapped lines and linked continuations alike, and step into the
//! neighbouring paragraph at either end. Up/Down keep a remembered x
//! position and land on the closest column of the adjacent line, or on its
//! end when the last horizontal move went to a line end.

use crate::{EditError, Result, Selection};
use doc_model::{DocumentTree, NodeId, RangeEndpoint};
use layout_engine::{grapheme_offsets, LayoutView};

/// Direction for navigation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Left, up, towards the document start
    Backward,
    /// Right, down, towards the document end
    Forward,
}

/// Unit of movement for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementUnit {
    /// One grapheme cluster
    Character,
    /// The adjacent visual line
    Line,
    /// Home/End of the visual line
    LineBoundary,
    /// Start or end of the document
    DocumentBoundary,
}

/// Navigation options
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationOptions {
    /// Whether to extend the selection (Shift key)
    pub extend_selection: bool,
}

/// Result of a navigation operation
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// The new selection after navigation
    pub selection: Selection,
    /// Whether the focus moved
    pub moved: bool,
}

/// Computes caret movement over a laid out document
pub struct Navigator<'a> {
    view: &'a LayoutView<'a>,
}

impl<'a> Navigator<'a> {
    pub fn new(view: &'a LayoutView<'a>) -> Self {
        Self { view }
    }

    fn tree(&self) -> &'a DocumentTree {
        self.view.tree()
    }

    /// Navigate in the specified direction by the specified unit
    pub fn navigate(
        &self,
        selection: &Selection,
        direction: Direction,
        unit: MovementUnit,
        options: NavigationOptions,
    ) -> Result<NavigationResult> {
        // A plain Left/Right on a range only collapses it
        if !options.extend_selection && !selection.is_collapsed() && unit == MovementUnit::Character {
            let mut collapsed = *selection;
            collapsed.collapse(direction == Direction::Backward);
            collapsed.set_sticky_x(None);
            collapsed.set_snap_to_line_end(false);
            return Ok(NavigationResult {
                selection: collapsed,
                moved: true,
            });
        }

        let focus = *selection.focus();
        let mut sticky_x = None;
        let mut snap = false;
        let target = match unit {
            MovementUnit::Character => self.move_by_character(&focus, direction)?,
            MovementUnit::LineBoundary => {
                snap = direction == Direction::Forward;
                self.move_to_line_boundary(&focus, direction)?
            }
            MovementUnit::DocumentBoundary => self.move_to_document_boundary(direction)?,
            MovementUnit::Line => {
                let x = selection
                    .sticky_x()
                    .or_else(|| self.view.caret_rect(&focus.info).map(|r| r.x));
                sticky_x = x;
                snap = selection.snap_to_line_end();
                self.move_by_line(&focus, direction, x.unwrap_or(0.0), snap)?
            }
        };

        let moved = target != focus;
        let mut next = *selection;
        if options.extend_selection {
            next.extend_to(self.tree(), target)?;
        } else {
            next.set_caret(target);
        }
        next.set_sticky_x(sticky_x);
        next.set_snap_to_line_end(snap);
        Ok(NavigationResult { selection: next, moved })
    }

    /// Previous or next grapheme boundary of the paragraph
    pub fn move_by_character(&self, from: &RangeEndpoint, direction: Direction) -> Result<RangeEndpoint> {
        let tree = self.tree();
        let head = tree.chain_head(from.node());
        let offset = from.info.chain_offset();
        let boundaries = grapheme_offsets(&tree.paragraph_text(head));

        match direction {
            Direction::Forward => {
                if let Some(next) = boundaries.iter().copied().find(|b| *b > offset) {
                    return endpoint_in_chain(tree, head, next, true);
                }
                let last = tree.chain(head).last().copied().unwrap_or(head);
                match tree.next_leaf(last) {
                    Some(next) => Ok(RangeEndpoint::resolve_in_node(tree, next, 0, true)?),
                    None => Ok(*from),
                }
            }
            Direction::Backward => {
                if let Some(previous) = boundaries.iter().rev().copied().find(|b| *b < offset) {
                    return endpoint_in_chain(tree, head, previous, true);
                }
                match tree.previous_leaf(head) {
                    Some(previous) => {
                        let previous_head = tree.chain_head(previous);
                        let end = tree.chain_length(previous_head);
                        endpoint_in_chain(tree, previous_head, end, false)
                    }
                    None => Ok(*from),
                }
            }
        }
    }

    /// Start or end of the visual line
    pub fn move_to_line_boundary(&self, from: &RangeEndpoint, direction: Direction) -> Result<RangeEndpoint> {
        let info = &from.info;
        let line_start = info.node_offset - info.line_offset;
        let endpoint = match direction {
            Direction::Backward => RangeEndpoint::resolve_in_node(self.tree(), info.node, line_start, true)?,
            Direction::Forward => {
                RangeEndpoint::resolve_in_node(self.tree(), info.node, line_start + info.line_length, false)?
            }
        };
        Ok(endpoint)
    }

    pub fn move_to_document_boundary(&self, direction: Direction) -> Result<RangeEndpoint> {
        let tree = self.tree();
        let endpoint = match direction {
            Direction::Backward => {
                let first = tree.first_leaf().ok_or(EditError::NoCaret)?;
                RangeEndpoint::resolve_in_node(tree, first, 0, true)?
            }
            Direction::Forward => {
                let last = tree.last_leaf().ok_or(EditError::NoCaret)?;
                RangeEndpoint::resolve_in_node(tree, last, tree.node_length(last), false)?
            }
        };
        Ok(endpoint)
    }

    /// Closest column on the adjacent line. Without a line in that
    /// direction the caret goes to the start or end of the current one.
    pub fn move_by_line(&self, from: &RangeEndpoint, direction: Direction, x: f32, snap_to_end: bool) -> Result<RangeEndpoint> {
        let tree = self.tree();
        let adjacent = match direction {
            Direction::Backward => tree.line_before(from.line),
            Direction::Forward => tree.line_after(from.line),
        };
        let Some(line) = adjacent else {
            return self.move_to_line_boundary(from, direction);
        };

        let line_start = tree.line_start_offset(line).ok_or(EditError::NoCaret)?;
        let line_length = tree.line(line).map_or(0, |l| l.len());
        let column = if snap_to_end {
            line_length
        } else {
            self.view.closest_offset(line, x)
        };
        Ok(RangeEndpoint::resolve(tree, line, line_start + column, column == 0)?)
    }
}

/// Endpoint at a paragraph-wide offset of the chain starting at `head`
pub(crate) fn endpoint_in_chain(
    tree: &DocumentTree,
    head: NodeId,
    offset: usize,
    prefer_start_of_line: bool,
) -> Result<RangeEndpoint> {
    let info = tree
        .range_info_by_linked_nodes_offset(head, offset, prefer_start_of_line)
        .ok_or(EditError::NoCaret)?;
    Ok(RangeEndpoint::resolve_in_node(
        tree,
        info.node,
        info.node_offset,
        prefer_start_of_line,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{EditorSettings, LineContent};
    use layout_engine::Pagination;
    use text_engine::MonospaceMeasurer;

    struct Fixture {
        tree: DocumentTree,
        pagination: Pagination,
        measurer: MonospaceMeasurer,
        nodes: Vec<NodeId>,
    }

    impl Fixture {
        /// Paragraphs of pre-wrapped lines, 10px per char
        fn new(paragraphs: &[&[&str]]) -> Self {
            let mut settings = EditorSettings::default();
            settings.document.font_size = 10.0;
            settings.document.line_height = 2.0;
            let mut tree = DocumentTree::new(settings);
            let mut nodes = Vec::new();
            let mut previous = None;
            for lines in paragraphs {
                let node = tree.create_paragraph_after(previous).unwrap();
                let first = tree.lines_of(node).unwrap()[0];
                tree.line_content_mut(first).unwrap().insert_text(lines[0], 0).unwrap();
                for (i, text) in lines.iter().enumerate().skip(1) {
                    tree.insert_line(node, i, LineContent::from_text(text)).unwrap();
                }
                nodes.push(node);
                previous = Some(node);
            }
            let measurer = MonospaceMeasurer::new(1.0);
            let mut pagination = Pagination::new();
            pagination.paginate_all(&mut tree, &measurer).unwrap();
            Self {
                tree,
                pagination,
                measurer,
                nodes,
            }
        }

        fn view(&self) -> LayoutView<'_> {
            LayoutView::new(&self.tree, &self.pagination, &self.measurer)
        }

        fn caret(&self, node: usize, offset: usize, sol: bool) -> Selection {
            Selection::caret_at(&self.tree, self.nodes[node], offset, sol).unwrap()
        }
    }

    fn step(view: &LayoutView<'_>, selection: &Selection, direction: Direction, unit: MovementUnit) -> Selection {
        Navigator::new(view)
            .navigate(selection, direction, unit, NavigationOptions::default())
            .unwrap()
            .selection
    }

    #[test]
    fn test_right_at_node_end_enters_next_node() {
        let fixture = Fixture::new(&[&["abc"], &["def"]]);
        let view = fixture.view();
        let selection = step(&view, &fixture.caret(0, 3, false), Direction::Forward, MovementUnit::Character);
        assert_eq!(selection.focus().node(), fixture.nodes[1]);
        assert_eq!(selection.focus().node_offset, 0);
        assert_eq!(selection.focus().info.line_index, 0);
    }

    #[test]
    fn test_left_at_node_start_enters_previous_node_end() {
        let fixture = Fixture::new(&[&["abc"], &["def"]]);
        let view = fixture.view();
        let selection = step(&view, &fixture.caret(1, 0, true), Direction::Backward, MovementUnit::Character);
        assert_eq!(selection.focus().node(), fixture.nodes[0]);
        assert_eq!(selection.focus().node_offset, 3);
    }

    #[test]
    fn test_document_edges_stay_put() {
        let fixture = Fixture::new(&[&["abc"]]);
        let view = fixture.view();
        let start = fixture.caret(0, 0, true);
        let result = Navigator::new(&view)
            .navigate(&start, Direction::Backward, MovementUnit::Character, NavigationOptions::default())
            .unwrap();
        assert!(!result.moved);
        let end = step(&view, &fixture.caret(0, 3, false), Direction::Forward, MovementUnit::Character);
        assert_eq!(end.focus().node_offset, 3);
    }

    #[test]
    fn test_right_crosses_wrapped_line() {
        let fixture = Fixture::new(&[&["hello ", "world"]]);
        let view = fixture.view();
        let selection = step(&view, &fixture.caret(0, 5, false), Direction::Forward, MovementUnit::Character);
        assert_eq!(selection.focus().node_offset, 6);
        assert_eq!(selection.focus().info.line_index, 1);
    }

    #[test]
    fn test_right_steps_over_grapheme_cluster() {
        let fixture = Fixture::new(&[&["e\u{301}x"]]);
        let view = fixture.view();
        let selection = step(&view, &fixture.caret(0, 0, true), Direction::Forward, MovementUnit::Character);
        assert_eq!(selection.focus().node_offset, 2);
    }

    #[test]
    fn test_home_end() {
        let fixture = Fixture::new(&[&["hello ", "world"]]);
        let view = fixture.view();
        let end = step(&view, &fixture.caret(0, 7, false), Direction::Forward, MovementUnit::LineBoundary);
        assert_eq!(end.focus().node_offset, 11);
        assert!(end.snap_to_line_end());
        let home = step(&view, &end, Direction::Backward, MovementUnit::LineBoundary);
        assert_eq!(home.focus().node_offset, 6);
        assert_eq!(home.focus().info.line_index, 1);
    }

    #[test]
    fn test_down_keeps_column() {
        let fixture = Fixture::new(&[&["abcdef"], &["xy"], &["uvwxyz"]]);
        let view = fixture.view();
        let down = step(&view, &fixture.caret(0, 4, false), Direction::Forward, MovementUnit::Line);
        assert_eq!(down.focus().node(), fixture.nodes[1]);
        assert_eq!(down.focus().node_offset, 2);
        assert_eq!(down.sticky_x(), Some(90.0));

        let again = step(&view, &down, Direction::Forward, MovementUnit::Line);
        assert_eq!(again.focus().node(), fixture.nodes[2]);
        assert_eq!(again.focus().node_offset, 4);
    }

    #[test]
    fn test_up_on_first_line_goes_to_start() {
        let fixture = Fixture::new(&[&["abc"]]);
        let view = fixture.view();
        let up = step(&view, &fixture.caret(0, 2, false), Direction::Backward, MovementUnit::Line);
        assert_eq!(up.focus().node_offset, 0);
    }

    #[test]
    fn test_snap_to_line_end_survives_vertical_moves() {
        let fixture = Fixture::new(&[&["ab"], &["abcdef"]]);
        let view = fixture.view();
        let end = step(&view, &fixture.caret(0, 0, true), Direction::Forward, MovementUnit::LineBoundary);
        let down = step(&view, &end, Direction::Forward, MovementUnit::Line);
        assert_eq!(down.focus().node(), fixture.nodes[1]);
        assert_eq!(down.focus().node_offset, 6);
    }

    #[test]
    fn test_shift_extends_and_plain_move_collapses() {
        let fixture = Fixture::new(&[&["abcdef"]]);
        let view = fixture.view();
        let navigator = Navigator::new(&view);
        let extend = NavigationOptions { extend_selection: true };
        let mut selection = fixture.caret(0, 2, false);
        for _ in 0..2 {
            selection = navigator
                .navigate(&selection, Direction::Forward, MovementUnit::Character, extend)
                .unwrap()
                .selection;
        }
        assert_eq!(selection.range().start().node_offset, 2);
        assert_eq!(selection.range().end().node_offset, 4);

        let collapsed = step(&view, &selection, Direction::Backward, MovementUnit::Character);
        assert!(collapsed.is_collapsed());
        assert_eq!(collapsed.focus().node_offset, 2);
    }
}
