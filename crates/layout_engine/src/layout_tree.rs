//! Layout tree structure
//!
//! Absolute geometry of the paginated document. Pages are stacked top to
//! bottom with a fixed gap, nodes stack inside a page's content area and
//! lines stack inside a node.

use doc_model::{LineId, NodeId, PageId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point in layout coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in layout coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Euclidean distance from a point to the nearest edge, zero inside
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = (self.x - x).max(0.0).max(x - self.right());
        let dy = (self.y - y).max(0.0).max(y - self.bottom());
        (dx * dx + dy * dy).sqrt()
    }
}

/// A page in the layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBox {
    /// Page index (0-based)
    pub index: usize,
    pub page_id: PageId,
    /// Full page bounds
    pub bounds: Rect,
    pub header: Rect,
    /// Content area (excluding margins, header and footer)
    pub content_area: Rect,
    pub footer: Rect,
    pub blocks: Vec<BlockBox>,
}

impl PageBox {
    /// Height used by the blocks on this page
    pub fn used_height(&self) -> f32 {
        self.blocks.iter().map(|b| b.bounds.height).sum()
    }
}

/// A node placed on a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockBox {
    pub node_id: NodeId,
    /// CSS class the node is rendered with
    pub class: String,
    pub bounds: Rect,
    pub lines: Vec<LineBox>,
}

/// A line of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineBox {
    pub line_id: LineId,
    pub bounds: Rect,
    /// Width of the printable text
    pub text_width: f32,
}

/// Where a line ended up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePlacement {
    pub page_index: usize,
    pub node_id: NodeId,
    pub bounds: Rect,
}

/// The complete layout of the document
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    pub pages: Vec<PageBox>,
    placements: HashMap<LineId, LinePlacement>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, page: PageBox) {
        for block in &page.blocks {
            for line in &block.lines {
                self.placements.insert(
                    line.line_id,
                    LinePlacement {
                        page_index: page.index,
                        node_id: block.node_id,
                        bounds: line.bounds,
                    },
                );
            }
        }
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&PageBox> {
        self.pages.get(index)
    }

    pub fn line_placement(&self, line: LineId) -> Option<&LinePlacement> {
        self.placements.get(&line)
    }

    pub fn line_rect(&self, line: LineId) -> Option<Rect> {
        self.placements.get(&line).map(|p| p.bounds)
    }

    /// Every line in reading order
    pub fn lines(&self) -> impl Iterator<Item = &LineBox> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .flat_map(|b| b.lines.iter())
    }

    /// Total height of the stacked pages
    pub fn document_height(&self) -> f32 {
        self.pages.last().map(|p| p.bounds.bottom()).unwrap_or(0.0)
    }
}
