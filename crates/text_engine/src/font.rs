//! Font identifiers and metrics

/// Loaded font face, keyed by family name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontId {
    pub family: String,
}

impl FontId {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
        }
    }
}

/// Vertical metrics in font units, enough to size a line box
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    /// Positive
    pub ascender: i16,
    /// Negative
    pub descender: i16,
    pub line_gap: i16,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            line_gap: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_font_id_keys_by_family() {
        let mut loaded = HashSet::new();
        loaded.insert(FontId::new("Serif"));
        assert!(loaded.contains(&FontId::new(String::from("Serif"))));
        assert!(!loaded.contains(&FontId::new("Sans")));
    }
}
