//! Render item types

use serde::{Deserialize, Serialize};

/// A rectangle in render coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

impl From<layout_engine::Rect> for Rect {
    fn from(r: layout_engine::Rect) -> Self {
        Self {
            x: r.x as f64,
            y: r.y as f64,
            width: r.width as f64,
            height: r.height as f64,
        }
    }
}

/// Color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// One line of text to paint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphRun {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    /// CSS class of the owning node
    pub class: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
    /// Position (top-left of the line box)
    pub x: f64,
    pub y: f64,
}

/// Render item types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderItem {
    /// A glyph run (text)
    GlyphRun(GlyphRun),
    /// A filled rectangle
    Rectangle {
        bounds: Rect,
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f64,
    },
    /// The caret (cursor)
    Caret {
        x: f64,
        y: f64,
        height: f64,
        color: Color,
    },
    /// Selection highlight
    Selection { rects: Vec<Rect>, color: Color },
}

/// A rendered page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRender {
    pub page_index: u32,
    pub width: f64,
    pub height: f64,
    pub items: Vec<RenderItem>,
}

/// The complete render model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderModel {
    pub pages: Vec<PageRender>,
    /// Caret and selection, painted above every page
    pub overlay: Vec<RenderItem>,
}

impl RenderModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, page: PageRender) {
        self.pages.push(page);
    }

    /// Every glyph run in paint order
    pub fn glyph_runs(&self) -> impl Iterator<Item = &GlyphRun> {
        self.pages.iter().flat_map(|p| p.items.iter()).filter_map(|item| match item {
            RenderItem::GlyphRun(run) => Some(run),
            _ => None,
        })
    }
}
