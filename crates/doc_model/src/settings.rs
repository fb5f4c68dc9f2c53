//! Page and document settings
//!
//! Settings are plain structs owned by the document tree of one editing
//! session and handed by reference to layout. They load from JSON; missing
//! fields take their defaults and a malformed file falls back to defaults.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry of a page in pixels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageSettings {
    /// Page width
    pub width: f32,
    /// Page height
    pub height: f32,
    /// Top margin
    pub margin_top: f32,
    /// Bottom margin
    pub margin_bottom: f32,
    /// Left margin
    pub margin_left: f32,
    /// Right margin
    pub margin_right: f32,
    /// Height of the header band above the content region
    pub header_height: f32,
    /// Height of the footer band below the content region
    pub footer_height: f32,
    /// Vertical gap between two stacked pages
    pub page_gap: f32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 800.0,
            margin_top: 40.0,
            margin_bottom: 40.0,
            margin_left: 50.0,
            margin_right: 50.0,
            header_height: 30.0,
            footer_height: 30.0,
            page_gap: 20.0,
        }
    }
}

impl PageSettings {
    /// Usable line width: page width minus left/right margins
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Usable content height: page height minus margins, header and footer
    pub fn max_content_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom - self.header_height - self.footer_height
    }

    /// Distance between the tops of two consecutive pages
    pub fn stride(&self) -> f32 {
        self.height + self.page_gap
    }

    /// Offset of the content region from the page top
    pub fn content_top(&self) -> f32 {
        self.margin_top + self.header_height
    }
}

/// Document-wide defaults for paragraphs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentSettings {
    /// Default font family, `None` for the measurer's default
    pub font_family: Option<String>,
    /// Default font size in pixels
    pub font_size: f32,
    /// Default line height as a multiple of the font size
    pub line_height: f32,
    /// CSS class given to new paragraphs
    pub paragraph_class: String,
    /// Overflow beyond `factor * content_width` is wrapped word by word,
    /// smaller overflow character by character
    pub wrap_threshold_factor: f32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 16.0,
            line_height: 1.5,
            paragraph_class: "paragraph".to_string(),
            wrap_threshold_factor: 2.0,
        }
    }
}

/// Settings of one editing session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub page: PageSettings,
    pub document: DocumentSettings,
}

impl EditorSettings {
    /// Parse settings from JSON, using defaults when the input is malformed
    pub fn from_json_str(content: &str) -> Self {
        match serde_json::from_str::<EditorSettings>(content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse editor settings, using defaults: {}", e);
                EditorSettings::default()
            }
        }
    }

    /// Load settings from a JSON file, or return defaults if it doesn't exist
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return EditorSettings::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json_str(&content),
            Err(e) => {
                tracing::warn!("Failed to read editor settings {:?}, using defaults: {}", path, e);
                EditorSettings::default()
            }
        }
    }

    /// Serialize settings as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_geometry() {
        let page = PageSettings::default();
        assert_eq!(page.content_width(), 500.0);
        assert_eq!(page.max_content_height(), 660.0);
        assert_eq!(page.stride(), 820.0);
        assert_eq!(page.content_top(), 70.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = EditorSettings::from_json_str(r#"{"page": {"width": 400.0}}"#);
        assert_eq!(settings.page.width, 400.0);
        assert_eq!(settings.page.height, 800.0);
        assert_eq!(settings.document.font_size, 16.0);
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let settings = EditorSettings::from_json_str("{not json");
        assert_eq!(settings, EditorSettings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = EditorSettings::default();
        settings.document.font_size = 12.0;
        let json = settings.to_json().unwrap();
        assert_eq!(EditorSettings::from_json_str(&json), settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = EditorSettings::load(Path::new("/definitely/not/here.json"));
        assert_eq!(settings, EditorSettings::default());
    }
}
