//! Caret layer
//!
//! The caret is positioned from a collapsed range through the layout view
//! and blinks on a cooperative timer advanced by [`CaretLayer::tick`].
//! Moving or showing the caret restarts the blink phase so it stays solid
//! while the user types.

use crate::{Color, Rect, RenderItem};
use doc_model::Range;
use layout_engine::LayoutView;
use std::time::Duration;

/// Caret rendering configuration
#[derive(Debug, Clone)]
pub struct CaretConfig {
    pub color: Color,
    /// Caret width in pixels
    pub width: f64,
    /// Length of each visible and hidden phase
    pub blink_interval: Duration,
}

impl Default for CaretConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
            blink_interval: Duration::from_millis(530),
        }
    }
}

/// Running blink timer
#[derive(Debug, Clone, Copy, Default)]
struct BlinkTimer {
    elapsed: Duration,
}

/// The painted caret
#[derive(Debug, Clone, Default)]
pub struct CaretLayer {
    config: CaretConfig,
    rect: Option<Rect>,
    visible: bool,
    blink: Option<BlinkTimer>,
}

impl CaretLayer {
    pub fn new(config: CaretConfig) -> Self {
        Self {
            config,
            rect: None,
            visible: false,
            blink: None,
        }
    }

    /// Place the caret for a range; a non-collapsed range hides it
    pub fn sync(&mut self, range: &Range, view: &LayoutView<'_>) -> Option<Rect> {
        if !range.is_collapsed() {
            self.hide();
            return None;
        }
        match view.caret_rect(range.end_info()) {
            Some(rect) => {
                let rect = Rect::new(rect.x as f64, rect.y as f64, self.config.width, rect.height as f64);
                self.show(rect);
                Some(rect)
            }
            None => {
                tracing::trace!(line = %range.end_info().line, "caret line is not laid out");
                self.hide();
                None
            }
        }
    }

    /// Show the caret at `rect` and restart blinking
    pub fn show(&mut self, rect: Rect) {
        self.rect = Some(rect);
        self.visible = true;
        self.blink = Some(BlinkTimer::default());
    }

    /// Hide the caret and cancel the blink timer
    pub fn hide(&mut self) {
        self.visible = false;
        if self.blink.take().is_some() {
            tracing::trace!("caret blink cancelled");
        }
    }

    /// Advance the blink timer. Returns whether visibility flipped.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let Some(timer) = self.blink.as_mut() else {
            return false;
        };
        let interval = self.config.blink_interval;
        if interval.is_zero() {
            return false;
        }
        timer.elapsed += elapsed;
        let phase = timer.elapsed.as_nanos() / interval.as_nanos();
        let visible = phase % 2 == 0;
        let flipped = visible != self.visible;
        self.visible = visible;
        flipped
    }

    pub fn is_visible(&self) -> bool {
        self.visible && self.rect.is_some()
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn render(&self) -> Option<RenderItem> {
        if !self.visible {
            return None;
        }
        let rect = self.rect?;
        Some(RenderItem::Caret {
            x: rect.x,
            y: rect.y,
            height: rect.height,
            color: self.config.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown() -> CaretLayer {
        let mut caret = CaretLayer::new(CaretConfig::default());
        caret.show(Rect::new(10.0, 20.0, 1.0, 16.0));
        caret
    }

    #[test]
    fn test_blink_phases() {
        let mut caret = shown();
        assert!(caret.is_visible());
        assert!(!caret.tick(Duration::from_millis(500)));
        assert!(caret.tick(Duration::from_millis(40)));
        assert!(!caret.is_visible());
        assert!(caret.render().is_none());
        assert!(caret.tick(Duration::from_millis(530)));
        assert!(caret.is_visible());
    }

    #[test]
    fn test_show_restarts_phase() {
        let mut caret = shown();
        caret.tick(Duration::from_millis(600));
        assert!(!caret.is_visible());
        caret.show(Rect::new(30.0, 20.0, 1.0, 16.0));
        assert!(caret.is_visible());
        assert!(!caret.tick(Duration::from_millis(100)));
    }

    #[test]
    fn test_hide_cancels_timer() {
        let mut caret = shown();
        caret.hide();
        assert!(!caret.is_blinking());
        assert!(!caret.tick(Duration::from_secs(5)));
        assert!(!caret.is_visible());
    }

    #[test]
    fn test_render_item() {
        let caret = shown();
        match caret.render() {
            Some(RenderItem::Caret { x, y, height, .. }) => {
                assert_eq!((x, y, height), (10.0, 20.0, 16.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
