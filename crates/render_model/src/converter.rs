//! Convert layout tree to render model

use crate::{Color, GlyphRun, PageRender, Rect, RenderError, RenderItem, RenderModel, Result};
use doc_model::{AnnotationKind, LineId};
use layout_engine::{BlockBox, LayoutView, LineBox};
use std::ops::Range;

/// Configuration for render conversion
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Background color for pages
    pub page_background: Color,
    pub page_border: Color,
    /// Default text color
    pub text_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_background: Color::WHITE,
            page_border: Color::rgb(200, 200, 200),
            text_color: Color::BLACK,
        }
    }
}

/// Converts layout tree to render model
#[derive(Debug, Default)]
pub struct RenderConverter {
    config: RenderConfig,
}

impl RenderConverter {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Convert every page
    pub fn convert(&self, view: &LayoutView<'_>) -> Result<RenderModel> {
        self.convert_pages(view, 0..view.layout().page_count())
    }

    /// Convert the pages in `pages`, typically the viewport's visible range
    pub fn convert_pages(&self, view: &LayoutView<'_>, pages: Range<usize>) -> Result<RenderModel> {
        let mut model = RenderModel::new();
        let layout = view.layout();
        if pages.end > layout.page_count() {
            return Err(RenderError::InvalidLayout(format!(
                "page range {:?} exceeds {} pages",
                pages,
                layout.page_count()
            )));
        }

        for page in &layout.pages[pages] {
            let mut page_render = PageRender {
                page_index: page.index as u32,
                width: page.bounds.width as f64,
                height: page.bounds.height as f64,
                items: Vec::new(),
            };
            page_render.items.push(RenderItem::Rectangle {
                bounds: Rect::from(page.bounds),
                fill: Some(self.config.page_background),
                stroke: Some(self.config.page_border),
                stroke_width: 1.0,
            });
            for block in &page.blocks {
                for line in &block.lines {
                    self.convert_line(view, block, line, &mut page_render.items)?;
                }
            }
            model.add_page(page_render);
        }
        Ok(model)
    }

    /// Emit one glyph run per stretch of the line with uniform annotations
    fn convert_line(
        &self,
        view: &LayoutView<'_>,
        block: &BlockBox,
        line_box: &LineBox,
        items: &mut Vec<RenderItem>,
    ) -> Result<()> {
        let tree = view.tree();
        let line = tree
            .line(line_box.line_id)
            .ok_or(RenderError::MissingLine(line_box.line_id))?;
        if line.is_empty() {
            return Ok(());
        }
        let style = tree.text_style(line.node());
        let chars: Vec<char> = line.text().chars().collect();
        let annotations = line.content().annotations();

        let mut bounds = vec![0, chars.len()];
        for annotation in annotations {
            bounds.push(annotation.start.min(chars.len()));
            bounds.push(annotation.end.min(chars.len()));
        }
        bounds.sort_unstable();
        bounds.dedup();

        for pair in bounds.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let covering: Vec<&AnnotationKind> = annotations
                .iter()
                .filter(|a| a.start <= start && a.end >= end)
                .map(|a| &a.kind)
                .collect();
            let class = covering
                .iter()
                .find_map(|kind| match kind {
                    AnnotationKind::Class(class) => Some(class.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| block.class.clone());
            let x = x_for(view, line_box.line_id, start)?;
            items.push(RenderItem::GlyphRun(GlyphRun {
                text: chars[start..end].iter().collect(),
                font_family: style.font_family.clone().unwrap_or_default(),
                font_size: style.font_size as f64,
                class,
                bold: covering.contains(&&AnnotationKind::Bold),
                italic: covering.contains(&&AnnotationKind::Italic),
                underline: covering.contains(&&AnnotationKind::Underline),
                color: self.config.text_color,
                x,
                y: line_box.bounds.y as f64,
            }));
        }
        Ok(())
    }
}

fn x_for(view: &LayoutView<'_>, line: LineId, offset: usize) -> Result<f64> {
    view.x_for_offset(line, offset)
        .map(|x| x as f64)
        .ok_or(RenderError::MissingLine(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Annotation, DocumentTree, EditorSettings};
    use layout_engine::Pagination;
    use text_engine::MonospaceMeasurer;

    fn setup() -> (DocumentTree, Pagination, MonospaceMeasurer) {
        let mut settings = EditorSettings::default();
        settings.document.font_size = 10.0;
        let measurer = MonospaceMeasurer::new(1.0);
        let mut tree = DocumentTree::with_empty_paragraph(settings);
        let node = tree.node_index()[0];
        tree.insert_text(node, 0, "plain bold", false).unwrap();
        let line = tree.lines_of(node).unwrap()[0];
        tree.line_content_mut(line)
            .unwrap()
            .add_annotation(Annotation::new(6, 10, AnnotationKind::Bold))
            .unwrap();
        let mut pagination = Pagination::new();
        pagination.paginate_all(&mut tree, &measurer).unwrap();
        (tree, pagination, measurer)
    }

    #[test]
    fn test_convert_splits_runs_on_annotations() {
        let (tree, pagination, measurer) = setup();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        let model = RenderConverter::default().convert(&view).unwrap();

        assert_eq!(model.pages.len(), 1);
        let runs: Vec<&GlyphRun> = model.glyph_runs().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "plain ");
        assert!(!runs[0].bold);
        assert_eq!(runs[1].text, "bold");
        assert!(runs[1].bold);
        assert_eq!(runs[1].x, 50.0 + 60.0);
        assert_eq!(runs[0].class, "paragraph");
    }

    #[test]
    fn test_page_range_out_of_bounds() {
        let (tree, pagination, measurer) = setup();
        let view = LayoutView::new(&tree, &pagination, &measurer);
        let result = RenderConverter::default().convert_pages(&view, 0..3);
        assert!(matches!(result, Err(RenderError::InvalidLayout(_))));
    }
}
