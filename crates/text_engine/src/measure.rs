//! The text measurement port
//!
//! Layout asks two questions of rendered text: how wide is this run of
//! characters, and how tall is a line holding it. [`TextMeasurer`] answers
//! both. The browser-backed implementation lives with the host; this crate
//! ships a deterministic monospace measurer and a shaping measurer.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Zero-width space substituted for empty content so that measurement of an
/// empty line still yields a line-height tall box.
pub const PLACEHOLDER: char = '\u{200B}';

/// Style inputs that affect measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font family, `None` for the measurer's default
    pub font_family: Option<String>,
    /// Font size in pixels
    pub font_size: f32,
    /// Line height as a multiple of the font size
    pub line_height: f32,
}

impl TextStyle {
    pub fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            font_family: None,
            font_size,
            line_height,
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new(16.0, 1.5)
    }
}

/// Measured size of a run of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Measurement capability consumed by the layout core
pub trait TextMeasurer: std::fmt::Debug + Send + Sync {
    /// Measure the rendered extent of `text` in the given style.
    fn measure(&self, text: &str, style: &TextStyle) -> TextExtent;

    /// Horizontal advance from the start of `text` to the char `offset`.
    fn advance_to(&self, text: &str, offset: usize, style: &TextStyle) -> f32 {
        let end = text
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        self.measure(&text[..end], style).width
    }

    /// Height of a line holding `text`; empty text is measured through the
    /// placeholder so the box is never degenerate.
    fn line_height(&self, text: &str, style: &TextStyle) -> f32 {
        if text.is_empty() {
            let mut buf = [0u8; 4];
            self.measure(PLACEHOLDER.encode_utf8(&mut buf), style).height
        } else {
            self.measure(text, style).height
        }
    }
}

/// Fixed advance per grapheme, useful for headless hosts and tests.
///
/// Every grapheme cluster advances `font_size * advance_em` pixels except the
/// placeholder, which is zero-width. Line height is `font_size * line_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    advance_em: f32,
}

impl MonospaceMeasurer {
    pub fn new(advance_em: f32) -> Self {
        Self { advance_em }
    }

    /// Pixel advance of one character at the given font size
    pub fn char_width(&self, font_size: f32) -> f32 {
        font_size * self.advance_em
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextExtent {
        let clusters = text
            .graphemes(true)
            .filter(|g| !g.starts_with(PLACEHOLDER))
            .count();
        TextExtent {
            width: clusters as f32 * self.char_width(style.font_size),
            height: style.font_size * style.line_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_width() {
        let measurer = MonospaceMeasurer::new(1.0);
        let style = TextStyle::new(10.0, 1.0);
        assert_eq!(measurer.measure("hello", &style).width, 50.0);
        assert_eq!(measurer.measure("hello", &style).height, 10.0);
        assert_eq!(measurer.measure("", &style).width, 0.0);
    }

    #[test]
    fn test_placeholder_is_zero_width() {
        let measurer = MonospaceMeasurer::new(1.0);
        let style = TextStyle::new(10.0, 1.2);
        let extent = measurer.measure("\u{200B}", &style);
        assert_eq!(extent.width, 0.0);
        assert!((extent.height - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_line_height_uses_placeholder() {
        let measurer = MonospaceMeasurer::new(1.0);
        let style = TextStyle::new(10.0, 2.0);
        assert_eq!(measurer.line_height("", &style), 20.0);
    }

    #[test]
    fn test_advance_to() {
        let measurer = MonospaceMeasurer::new(1.0);
        let style = TextStyle::new(10.0, 1.0);
        assert_eq!(measurer.advance_to("hello", 0, &style), 0.0);
        assert_eq!(measurer.advance_to("hello", 2, &style), 20.0);
        assert_eq!(measurer.advance_to("hello", 9, &style), 50.0);
    }

    #[test]
    fn test_combining_marks_share_an_advance() {
        let measurer = MonospaceMeasurer::new(1.0);
        let style = TextStyle::new(10.0, 1.0);
        assert_eq!(measurer.measure("e\u{301}", &style).width, 10.0);
    }

    mod props {
        use super::*;
        use crate::ShapingMeasurer;
        use proptest::prelude::*;

        fn check_advances(measurer: &dyn TextMeasurer, text: &str, size: f32) -> Result<(), TestCaseError> {
            let style = TextStyle::new(size, 1.0);
            let count = text.chars().count();
            let mut previous = 0.0;
            for offset in 0..=count {
                let advance = measurer.advance_to(text, offset, &style);
                prop_assert!(advance >= previous, "advance fell at {}", offset);
                previous = advance;
            }
            let full = measurer.measure(text, &style).width;
            prop_assert!((previous - full).abs() < 0.01);
            prop_assert_eq!(measurer.advance_to(text, count + 5, &style), previous);
            Ok(())
        }

        proptest! {
            #[test]
            fn test_advances_grow_to_full_width(text in "[a-zA-Z0-9 .,\u{a0}]{0,30}", size in 6.0f32..40.0) {
                check_advances(&MonospaceMeasurer::new(0.6), &text, size)?;
                check_advances(&ShapingMeasurer::default(), &text, size)?;
            }

            #[test]
            fn test_width_is_additive_for_monospace(a in "[a-z ]{0,20}", b in "[a-z ]{0,20}") {
                let measurer = MonospaceMeasurer::new(1.0);
                let style = TextStyle::new(10.0, 1.0);
                let joined = format!("{}{}", a, b);
                let sum = measurer.measure(&a, &style).width + measurer.measure(&b, &style).width;
                prop_assert!((measurer.measure(&joined, &style).width - sum).abs() < 0.001);
            }
        }
    }
}
