//! Selection overlay
//!
//! Lines carry the char range of the selection that falls on them; this
//! module turns those ranges into highlight rectangles.

use crate::{Color, Rect, RenderItem};
use layout_engine::LayoutView;

/// Selection rendering configuration
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Selection highlight color
    pub color: Color,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            color: Color::rgba(51, 153, 255, 128),
        }
    }
}

/// Renders selection highlights
#[derive(Debug, Clone, Default)]
pub struct SelectionRenderer {
    config: SelectionConfig,
}

impl SelectionRenderer {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// One rectangle per selected line, in reading order
    pub fn rects(&self, view: &LayoutView<'_>) -> Vec<Rect> {
        let tree = view.tree();
        view.layout()
            .lines()
            .filter_map(|line_box| {
                let selection = tree.line(line_box.line_id)?.selection()?;
                if selection.is_empty() {
                    return None;
                }
                view.range_rect(line_box.line_id, selection.start, selection.end)
                    .map(Rect::from)
            })
            .collect()
    }

    pub fn render(&self, view: &LayoutView<'_>) -> Option<RenderItem> {
        let rects = self.rects(view);
        if rects.is_empty() {
            return None;
        }
        Some(RenderItem::Selection {
            rects,
            color: self.config.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{DocumentTree, EditorSettings, LineContent};
    use layout_engine::Pagination;
    use text_engine::MonospaceMeasurer;

    #[test]
    fn test_rects_follow_line_selection() {
        let mut settings = EditorSettings::default();
        settings.document.font_size = 10.0;
        settings.document.line_height = 2.0;
        let measurer = MonospaceMeasurer::new(1.0);
        let mut tree = DocumentTree::with_empty_paragraph(settings);
        let node = tree.node_index()[0];
        tree.insert_text(node, 0, "hello ", false).unwrap();
        tree.insert_line(node, 1, LineContent::from_text("world")).unwrap();
        let lines = tree.lines_of(node).unwrap().to_vec();
        tree.line_mut(lines[0]).unwrap().select(2, 6);
        tree.line_mut(lines[1]).unwrap().select(0, 3);

        let mut pagination = Pagination::new();
        pagination.paginate_all(&mut tree, &measurer).unwrap();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        let renderer = SelectionRenderer::default();

        let rects = renderer.rects(&view);
        assert_eq!(rects, vec![Rect::new(70.0, 70.0, 40.0, 20.0), Rect::new(50.0, 90.0, 30.0, 20.0)]);
        assert!(matches!(renderer.render(&view), Some(RenderItem::Selection { .. })));
    }

    #[test]
    fn test_no_selection_no_item() {
        let settings = EditorSettings::default();
        let measurer = MonospaceMeasurer::new(0.5);
        let mut tree = DocumentTree::with_empty_paragraph(settings);
        let mut pagination = Pagination::new();
        pagination.paginate_all(&mut tree, &measurer).unwrap();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        assert!(SelectionRenderer::default().render(&view).is_none());
    }
}
