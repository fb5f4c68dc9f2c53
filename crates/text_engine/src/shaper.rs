//! Text shaping using rustybuzz
//!
//! Shaping converts a sequence of Unicode codepoints into positioned glyphs.
//! The advances of the shaped glyphs are what a proportional font actually
//! occupies on a line, so [`ShapingMeasurer`] is the measurer to use whenever
//! real font data is available.

use crate::{calculate_line_height, FontId, FontMetrics, Result, TextError, TextExtent, TextMeasurer, TextStyle};
use std::collections::HashMap;
use std::sync::Arc;

/// A shaped glyph with position information
#[derive(Debug, Clone)]
pub struct ShapedGlyph {
    /// Glyph ID in the font
    pub glyph_id: u16,
    /// Horizontal advance in font units
    pub x_advance: i32,
    /// Cluster index (byte offset in the original text)
    pub cluster: u32,
    /// Character this glyph represents (for fallback when no font)
    pub character: Option<char>,
}

impl ShapedGlyph {
    /// Get the advance width scaled to a specific font size
    pub fn advance_width(&self, font_size: f32, units_per_em: u16) -> f32 {
        self.x_advance as f32 * font_size / units_per_em as f32
    }
}

/// A run of shaped glyphs with associated metrics
#[derive(Debug, Clone)]
pub struct ShapedRun {
    /// The shaped glyphs
    pub glyphs: Vec<ShapedGlyph>,
    /// Total width of the run in pixels
    pub width: f32,
    /// Font size used for shaping
    pub font_size: f32,
    /// Units per em of the font used
    pub units_per_em: u16,
    /// Metrics of the face (or the defaults) used for shaping
    pub metrics: FontMetrics,
}

impl ShapedRun {
    /// Get the x position at a specific byte offset
    pub fn x_at_offset(&self, byte_offset: usize) -> f32 {
        self.glyphs
            .iter()
            .take_while(|g| (g.cluster as usize) < byte_offset)
            .map(|g| g.advance_width(self.font_size, self.units_per_em))
            .sum()
    }
}

/// Text shaper using rustybuzz
///
/// Font data is kept per [`FontId`]; a face is parsed from the bytes for every
/// shaping call so no self-referential storage is needed.
#[derive(Debug, Default)]
pub struct TextShaper {
    fonts: HashMap<FontId, Arc<Vec<u8>>>,
    default_metrics: FontMetrics,
}

impl TextShaper {
    /// Create a new text shaper
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a font from data
    pub fn load_font(&mut self, font_id: FontId, data: Vec<u8>) -> Result<()> {
        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return Err(TextError::InvalidFontData(format!(
                "Failed to parse font for family {}",
                font_id.family
            )));
        }
        tracing::debug!(family = %font_id.family, bytes = data.len(), "font loaded");
        self.fonts.insert(font_id, Arc::new(data));
        Ok(())
    }

    /// Check if a font is loaded
    pub fn has_font(&self, font_id: &FontId) -> bool {
        self.fonts.contains_key(font_id)
    }

    /// Shape a text string with a specific font, falling back to estimated
    /// advances when the font is not loaded
    pub fn shape_with_font(
        &self,
        text: &str,
        font_size: f32,
        font_id: Option<&FontId>,
    ) -> Result<ShapedRun> {
        match font_id.and_then(|id| self.fonts.get(id)) {
            Some(data) => {
                let face = rustybuzz::Face::from_slice(data, 0)
                    .ok_or_else(|| TextError::ShapingFailed("font data became unreadable".into()))?;
                Ok(self.shape_with_face(text, font_size, &face))
            }
            None => Ok(self.shape_fallback(text, font_size)),
        }
    }

    /// Shape text in the family and size of `style`
    pub fn shape_styled(&self, text: &str, style: &TextStyle) -> Result<ShapedRun> {
        let font_id = style.font_family.as_deref().map(FontId::new);
        self.shape_with_font(text, style.font_size, font_id.as_ref())
    }

    fn shape_with_face(&self, text: &str, font_size: f32, face: &rustybuzz::Face<'_>) -> ShapedRun {
        let units_per_em = face.units_per_em() as u16;
        let scale = font_size / units_per_em as f32;

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let output = rustybuzz::shape(face, &[], buffer);

        let mut glyphs = Vec::with_capacity(output.len());
        let mut total_advance = 0i32;
        for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
            glyphs.push(ShapedGlyph {
                glyph_id: info.glyph_id as u16,
                x_advance: pos.x_advance,
                cluster: info.cluster,
                character: None,
            });
            total_advance += pos.x_advance;
        }

        ShapedRun {
            glyphs,
            width: total_advance as f32 * scale,
            font_size,
            units_per_em,
            metrics: FontMetrics {
                units_per_em,
                ascender: face.ascender(),
                descender: face.descender(),
                line_gap: face.line_gap(),
            },
        }
    }

    /// Fallback shaping when no font is available
    fn shape_fallback(&self, text: &str, font_size: f32) -> ShapedRun {
        let units_per_em = self.default_metrics.units_per_em;
        let scale = font_size / units_per_em as f32;

        let mut glyphs = Vec::new();
        let mut total_advance = 0i32;
        for (byte_offset, ch) in text.char_indices() {
            let advance = estimate_char_width(ch, units_per_em);
            glyphs.push(ShapedGlyph {
                glyph_id: ch as u16,
                x_advance: advance,
                cluster: byte_offset as u32,
                character: Some(ch),
            });
            total_advance += advance;
        }

        ShapedRun {
            glyphs,
            width: total_advance as f32 * scale,
            font_size,
            units_per_em,
            metrics: self.default_metrics.clone(),
        }
    }
}

/// Estimate character width based on Unicode properties
fn estimate_char_width(ch: char, units_per_em: u16) -> i32 {
    let em = units_per_em as i32;

    match ch {
        ' ' | 'i' | 'l' | 'j' | 't' | 'f' | 'r' | '!' | '|' | '\'' | '`' | '.' | ',' | ':' | ';' => {
            em * 30 / 100
        }
        'I' | '1' => em * 35 / 100,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => em * 90 / 100,
        'A'..='Z' => em * 70 / 100,
        'a'..='z' => em * 55 / 100,
        '0'..='9' => em * 60 / 100,
        '\u{4E00}'..='\u{9FFF}' | '\u{3000}'..='\u{303F}' => em,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{00AD}' => 0,
        '\u{00A0}' => em * 30 / 100,
        _ => em * 60 / 100,
    }
}

/// Measurer backed by [`TextShaper`]
#[derive(Debug, Default)]
pub struct ShapingMeasurer {
    shaper: TextShaper,
}

impl ShapingMeasurer {
    pub fn new(shaper: TextShaper) -> Self {
        Self { shaper }
    }

    pub fn shaper(&self) -> &TextShaper {
        &self.shaper
    }

    pub fn shaper_mut(&mut self) -> &mut TextShaper {
        &mut self.shaper
    }
}

impl TextMeasurer for ShapingMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextExtent {
        let shaped = self
            .shaper
            .shape_styled(text, style)
            .unwrap_or_else(|e| {
                tracing::warn!("Shaping failed, estimating advances: {}", e);
                self.shaper.shape_fallback(text, style.font_size)
            });
        TextExtent {
            width: shaped.width,
            height: calculate_line_height(&shaped.metrics, style.font_size, style.line_height),
        }
    }

    fn advance_to(&self, text: &str, offset: usize, style: &TextStyle) -> f32 {
        let byte_offset = text
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        match self.shaper.shape_styled(text, style) {
            Ok(run) => run.x_at_offset(byte_offset),
            Err(_) => self.measure(&text[..byte_offset], style).width,
        }
    }
}
