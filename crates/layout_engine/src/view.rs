//! Mapping between document positions and pixels
//!
//! [`LayoutView`] stacks the paginated document into absolute geometry and
//! answers the questions selection asks of it: where is the caret for a
//! line offset, which line and offset lies under a point.

use crate::{node_height, BlockBox, LayoutTree, LineBox, Page, PageBox, Pagination, Rect};
use doc_model::{DocumentTree, LineId, LineOffsetInfo, NodeId};
use text_engine::TextMeasurer;
use unicode_segmentation::UnicodeSegmentation;

/// Width of the painted caret
pub const CARET_WIDTH: f32 = 1.0;

/// Absolute geometry of the current document state
#[derive(Debug)]
pub struct LayoutView<'a> {
    tree: &'a DocumentTree,
    measurer: &'a dyn TextMeasurer,
    layout: LayoutTree,
}

impl<'a> LayoutView<'a> {
    pub fn new(tree: &'a DocumentTree, pagination: &Pagination, measurer: &'a dyn TextMeasurer) -> Self {
        let layout = build_layout(tree, pagination, measurer);
        Self {
            tree,
            measurer,
            layout,
        }
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    pub fn tree(&self) -> &'a DocumentTree {
        self.tree
    }

    pub fn into_layout(self) -> LayoutTree {
        self.layout
    }

    pub fn line_rect(&self, line: LineId) -> Option<Rect> {
        self.layout.line_rect(line)
    }

    /// Index of the page a line is on
    pub fn page_of_line(&self, line: LineId) -> Option<usize> {
        self.layout.line_placement(line).map(|p| p.page_index)
    }

    /// Absolute x of an in-line offset
    pub fn x_for_offset(&self, line: LineId, line_offset: usize) -> Option<f32> {
        let rect = self.line_rect(line)?;
        let l = self.tree.line(line)?;
        let style = self.tree.text_style(l.node());
        let advance = self.measurer.advance_to(l.content().raw(), line_offset, &style);
        Some(rect.x + advance)
    }

    /// Caret box for a resolved position
    pub fn caret_rect(&self, info: &LineOffsetInfo) -> Option<Rect> {
        let rect = self.line_rect(info.line)?;
        let x = self.x_for_offset(info.line, info.line_offset)?;
        Some(Rect::new(x, rect.y, CARET_WIDTH, rect.height))
    }

    /// Rectangle covering in-line offsets `[start, end)`
    pub fn range_rect(&self, line: LineId, start: usize, end: usize) -> Option<Rect> {
        let rect = self.line_rect(line)?;
        let left = self.x_for_offset(line, start)?;
        let right = self.x_for_offset(line, end)?;
        Some(Rect::new(left, rect.y, (right - left).max(0.0), rect.height))
    }

    /// Offset in `line` whose caret x is closest to `x`, only stopping on
    /// grapheme boundaries.
    pub fn closest_offset(&self, line: LineId, x: f32) -> usize {
        let Some(l) = self.tree.line(line) else {
            return 0;
        };
        let text = l.content().raw();
        let mut best = (0, f32::MAX);
        for offset in grapheme_offsets(text) {
            let Some(caret_x) = self.x_for_offset(line, offset) else {
                continue;
            };
            let distance = (caret_x - x).abs();
            if distance < best.1 {
                best = (offset, distance);
            }
        }
        best.0
    }

    /// Line and in-line offset under a point.
    ///
    /// A point between lines or pages resolves to the nearest line.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<(LineId, usize)> {
        let mut nearest: Option<(LineId, f32)> = None;
        for line in self.layout.lines() {
            // Lines span the full content width so clicks past the text land on them
            let rect = line.bounds;
            if rect.contains(x, y) {
                return Some((line.line_id, self.closest_offset(line.line_id, x)));
            }
            let distance = rect.distance_to(x, y);
            if nearest.map_or(true, |(_, d)| distance < d) {
                nearest = Some((line.line_id, distance));
            }
        }
        let (line, _) = nearest?;
        Some((line, self.closest_offset(line, x)))
    }

    /// Vertical extent of a node
    pub fn node_rect(&self, node: NodeId) -> Option<Rect> {
        self.layout
            .pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .find(|b| b.node_id == node)
            .map(|b| b.bounds)
    }
}

/// Char offsets of the grapheme boundaries of `text`, both ends included
pub fn grapheme_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut acc = 0;
    for grapheme in text.graphemes(true) {
        acc += grapheme.chars().count();
        offsets.push(acc);
    }
    offsets
}

fn build_layout(tree: &DocumentTree, pagination: &Pagination, measurer: &dyn TextMeasurer) -> LayoutTree {
    let settings = &tree.settings().page;
    let default_class = &tree.settings().document.paragraph_class;
    let mut layout = LayoutTree::new();

    for (index, page) in pagination.pages().iter().enumerate() {
        let content_area = Page::content_area(settings, index);
        let mut y = content_area.y;
        let mut blocks = Vec::new();

        for node in page.content().nodes() {
            let style = tree.text_style(*node);
            let height = node_height(tree, measurer, *node);
            let mut lines = Vec::new();
            let mut line_y = y;
            for line_id in tree.node(*node).map(|n| n.lines()).unwrap_or(&[]) {
                let Some(line) = tree.line(*line_id) else {
                    continue;
                };
                let line_height = line.content().height(measurer, &style);
                lines.push(LineBox {
                    line_id: *line_id,
                    bounds: Rect::new(content_area.x, line_y, content_area.width, line_height),
                    text_width: line.content().width(measurer, &style, true),
                });
                line_y += line_height;
            }
            let class = tree
                .node(*node)
                .and_then(|n| n.attributes().class.clone())
                .unwrap_or_else(|| default_class.clone());
            blocks.push(BlockBox {
                node_id: *node,
                class,
                bounds: Rect::new(content_area.x, y, content_area.width, height),
                lines,
            });
            y += height;
        }

        layout.add_page(PageBox {
            index,
            page_id: page.id(),
            bounds: Page::bounds(settings, index),
            header: Page::header_area(settings, index),
            content_area,
            footer: Page::footer_area(settings, index),
            blocks,
        });
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{EditorSettings, LineContent};
    use text_engine::MonospaceMeasurer;

    fn setup() -> (DocumentTree, Pagination, MonospaceMeasurer, NodeId) {
        let mut settings = EditorSettings::default();
        settings.document.font_size = 10.0;
        settings.document.line_height = 2.0;
        let measurer = MonospaceMeasurer::new(1.0);
        let mut tree = DocumentTree::with_empty_paragraph(settings);
        let node = tree.node_index()[0];
        tree.insert_text(node, 0, "hello ", false).unwrap();
        tree.insert_line(node, 1, LineContent::from_text("world")).unwrap();
        let mut pagination = Pagination::new();
        pagination.paginate_all(&mut tree, &measurer).unwrap();
        (tree, pagination, measurer, node)
    }

    #[test]
    fn test_line_rects_stack() {
        let (tree, pagination, measurer, node) = setup();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        let lines = tree.lines_of(node).unwrap();
        let first = view.line_rect(lines[0]).unwrap();
        let second = view.line_rect(lines[1]).unwrap();
        assert_eq!(first.x, 50.0);
        assert_eq!(first.y, 70.0);
        assert_eq!(first.height, 20.0);
        assert_eq!(second.y, 90.0);
        assert_eq!(view.layout().pages[0].blocks[0].class, "paragraph");
    }

    #[test]
    fn test_caret_rect() {
        let (tree, pagination, measurer, node) = setup();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        let info = tree.range_info_for_offset(node, 8, false).unwrap();
        let caret = view.caret_rect(&info).unwrap();
        assert_eq!(caret.x, 70.0);
        assert_eq!(caret.y, 90.0);
        assert_eq!(caret.height, 20.0);
    }

    #[test]
    fn test_hit_test_inside_and_between() {
        let (tree, pagination, measurer, node) = setup();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        let lines = tree.lines_of(node).unwrap();

        assert_eq!(view.hit_test(74.0, 75.0), Some((lines[0], 2)));
        assert_eq!(view.hit_test(500.0, 95.0), Some((lines[1], 5)));
        // Above the first page content
        assert_eq!(view.hit_test(51.0, 5.0), Some((lines[0], 0)));
    }

    #[test]
    fn test_grapheme_offsets() {
        assert_eq!(grapheme_offsets("ab"), vec![0, 1, 2]);
        assert_eq!(grapheme_offsets("e\u{301}x"), vec![0, 2, 3]);
        assert_eq!(grapheme_offsets(""), vec![0]);
    }
}
