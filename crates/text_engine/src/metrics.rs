//! Line box sizing from font metrics

use crate::FontMetrics;

/// Calculate line height from font metrics and font size
pub fn calculate_line_height(metrics: &FontMetrics, font_size: f32, line_spacing: f32) -> f32 {
    let em = font_size;
    let ascender = metrics.ascender as f32 / metrics.units_per_em as f32 * em;
    let descender = metrics.descender.abs() as f32 / metrics.units_per_em as f32 * em;
    let line_gap = metrics.line_gap as f32 / metrics.units_per_em as f32 * em;

    (ascender + descender + line_gap).max(em) * line_spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_height_never_below_em() {
        let metrics = FontMetrics {
            units_per_em: 1000,
            ascender: 400,
            descender: -100,
            line_gap: 0,
        };
        assert_eq!(calculate_line_height(&metrics, 10.0, 1.0), 10.0);
        assert_eq!(calculate_line_height(&metrics, 10.0, 1.5), 15.0);
    }

    #[test]
    fn test_default_metrics_line_height() {
        let metrics = FontMetrics::default();
        let height = calculate_line_height(&metrics, 20.0, 1.0);
        assert!((height - 20.0).abs() < 0.001);
    }
}
