//! Viewport management
//!
//! Tracks the vertical scroll position over the stack of pages, keeps the
//! caret in view with a short eased scroll animation and drives drag
//! auto-scroll while the pointer is held near the top or bottom edge.
//! Both effects are time slices advanced by [`Viewport::tick`] and can be
//! cancelled at any point.

use crate::Rect;
use layout_engine::LayoutTree;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

/// Viewport behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Distance kept between the caret and the viewport edges
    pub caret_margin: f64,
    /// Duration of a scroll-into-view animation
    pub scroll_duration_ms: u64,
    /// Height of the band at each edge that triggers drag auto-scroll
    pub auto_scroll_zone: f64,
    /// Auto-scroll speed at the very edge, in pixels per second
    pub max_auto_scroll_speed: f64,
    /// Pages rendered above and below the visible ones
    pub buffer_pages: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            caret_margin: 40.0,
            scroll_duration_ms: 200,
            auto_scroll_zone: 30.0,
            max_auto_scroll_speed: 900.0,
            buffer_pages: 1,
        }
    }
}

/// An in-flight eased scroll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub elapsed: Duration,
}

impl ScrollAnimation {
    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Current position with cubic ease-out
    pub fn value(&self) -> f64 {
        let t = 1.0 - (1.0 - self.progress()).powi(3);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// The visible window onto the stacked pages
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    config: ViewportConfig,
    scroll_y: f64,
    visible_width: f64,
    visible_height: f64,
    document_height: f64,
    animation: Option<ScrollAnimation>,
    /// Signed auto-scroll velocity in pixels per second
    auto_scroll: Option<f64>,
}

impl Viewport {
    pub fn new(config: ViewportConfig, visible_width: f64, visible_height: f64) -> Self {
        Self {
            config,
            visible_width,
            visible_height,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn top(&self) -> f64 {
        self.scroll_y
    }

    pub fn bottom(&self) -> f64 {
        self.scroll_y + self.visible_height
    }

    pub fn visible_width(&self) -> f64 {
        self.visible_width
    }

    pub fn visible_height(&self) -> f64 {
        self.visible_height
    }

    pub fn resize(&mut self, visible_width: f64, visible_height: f64) {
        self.visible_width = visible_width;
        self.visible_height = visible_height;
        self.clamp();
    }

    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = height;
        self.clamp();
    }

    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.visible_height).max(0.0)
    }

    /// Jump to `y`, cancelling any animation
    pub fn scroll_to(&mut self, y: f64) {
        self.animation = None;
        self.scroll_y = y.clamp(0.0, self.max_scroll());
    }

    /// Start an eased scroll towards `y`, replacing any running one
    pub fn animate_to(&mut self, y: f64) {
        let to = y.clamp(0.0, self.max_scroll());
        if (to - self.scroll_y).abs() < f64::EPSILON {
            self.animation = None;
            return;
        }
        tracing::trace!(from = self.scroll_y, to, "scroll animation started");
        self.animation = Some(ScrollAnimation {
            from: self.scroll_y,
            to,
            duration: Duration::from_millis(self.config.scroll_duration_ms),
            elapsed: Duration::ZERO,
        });
    }

    pub fn cancel_animation(&mut self) {
        if self.animation.take().is_some() {
            tracing::trace!("scroll animation cancelled");
        }
    }

    pub fn animation(&self) -> Option<&ScrollAnimation> {
        self.animation.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Animate so that `rect` (document coordinates) sits inside the
    /// viewport with the caret margin. Returns whether a scroll started.
    pub fn scroll_into_view(&mut self, rect: Rect) -> bool {
        let margin = self.config.caret_margin.min(self.visible_height / 2.0);
        let target = if rect.y < self.top() + margin {
            rect.y - margin
        } else if rect.bottom() > self.bottom() - margin {
            rect.bottom() + margin - self.visible_height
        } else {
            return false;
        };
        self.animate_to(target);
        self.is_animating()
    }

    /// Update drag auto-scroll for a pointer at viewport-relative `y`.
    /// Returns whether auto-scroll is running afterwards.
    pub fn update_auto_scroll(&mut self, pointer_y: f64) -> bool {
        let zone = self.config.auto_scroll_zone;
        let speed = self.config.max_auto_scroll_speed;
        let velocity = if pointer_y < zone {
            -speed * ((zone - pointer_y) / zone).min(1.0)
        } else if pointer_y > self.visible_height - zone {
            speed * ((pointer_y - (self.visible_height - zone)) / zone).min(1.0)
        } else {
            0.0
        };
        if velocity == 0.0 {
            self.stop_auto_scroll();
            return false;
        }
        if self.auto_scroll.is_none() {
            tracing::trace!(velocity, "auto-scroll started");
        }
        self.animation = None;
        self.auto_scroll = Some(velocity);
        true
    }

    pub fn stop_auto_scroll(&mut self) {
        if self.auto_scroll.take().is_some() {
            tracing::trace!("auto-scroll stopped");
        }
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.is_some()
    }

    /// Advance animation and auto-scroll by `elapsed`.
    /// Returns whether the scroll position changed.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let before = self.scroll_y;

        if let Some(animation) = self.animation.as_mut() {
            animation.elapsed += elapsed;
            self.scroll_y = animation.value();
            if animation.is_finished() {
                self.animation = None;
            }
        }
        if let Some(velocity) = self.auto_scroll {
            self.scroll_y += velocity * elapsed.as_secs_f64();
        }
        self.clamp();
        (self.scroll_y - before).abs() > f64::EPSILON
    }

    fn clamp(&mut self) {
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_scroll());
    }

    /// Pages intersecting the viewport, widened by the buffer
    pub fn visible_page_range(&self, layout: &LayoutTree) -> Range<usize> {
        let mut first = None;
        let mut last = 0;
        for (i, page) in layout.pages.iter().enumerate() {
            let bounds = Rect::from(page.bounds);
            if bounds.bottom() > self.top() && bounds.y < self.bottom() {
                first.get_or_insert(i);
                last = i;
            }
        }
        let Some(first) = first else {
            return 0..0;
        };
        let start = first.saturating_sub(self.config.buffer_pages);
        let end = (last + 1 + self.config.buffer_pages).min(layout.page_count());
        start..end
    }

    /// Share of a page inside the viewport, 0.0 to 1.0
    pub fn page_visibility_ratio(&self, layout: &LayoutTree, index: usize) -> f64 {
        let Some(page) = layout.page(index) else {
            return 0.0;
        };
        let bounds = Rect::from(page.bounds);
        if bounds.bottom() <= self.top() || bounds.y >= self.bottom() || bounds.height <= 0.0 {
            return 0.0;
        }
        let visible = bounds.bottom().min(self.bottom()) - bounds.y.max(self.top());
        (visible / bounds.height).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::PageId;
    use layout_engine::PageBox;
    use proptest::prelude::*;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(ViewportConfig::default(), 600.0, 800.0);
        viewport.set_document_height(5000.0);
        viewport
    }

    fn layout(pages: usize) -> LayoutTree {
        let mut layout = LayoutTree::new();
        for index in 0..pages {
            let bounds = layout_engine::Rect::new(0.0, index as f32 * 820.0, 600.0, 800.0);
            layout.add_page(PageBox {
                index,
                page_id: PageId::new(),
                bounds,
                header: bounds,
                content_area: bounds,
                footer: bounds,
                blocks: Vec::new(),
            });
        }
        layout
    }

    #[test]
    fn test_scroll_clamped() {
        let mut viewport = viewport();
        viewport.scroll_to(-50.0);
        assert_eq!(viewport.scroll_y(), 0.0);
        viewport.scroll_to(10_000.0);
        assert_eq!(viewport.scroll_y(), 4200.0);
    }

    #[test]
    fn test_scroll_into_view_animates() {
        let mut viewport = viewport();
        assert!(!viewport.scroll_into_view(Rect::new(50.0, 300.0, 1.0, 20.0)));

        assert!(viewport.scroll_into_view(Rect::new(50.0, 1000.0, 1.0, 20.0)));
        let target = 1000.0 + 20.0 + 40.0 - 800.0;
        assert_eq!(viewport.animation().map(|a| a.to), Some(target));

        assert!(viewport.tick(Duration::from_millis(100)));
        assert!(viewport.scroll_y() > 0.0 && viewport.scroll_y() < target);
        viewport.tick(Duration::from_millis(150));
        assert_eq!(viewport.scroll_y(), target);
        assert!(!viewport.is_animating());
    }

    #[test]
    fn test_cancel_animation_keeps_position() {
        let mut viewport = viewport();
        viewport.animate_to(400.0);
        viewport.tick(Duration::from_millis(50));
        let y = viewport.scroll_y();
        viewport.cancel_animation();
        assert!(!viewport.tick(Duration::from_millis(200)));
        assert_eq!(viewport.scroll_y(), y);
    }

    #[test]
    fn test_auto_scroll_near_edges() {
        let mut viewport = viewport();
        assert!(!viewport.update_auto_scroll(400.0));
        assert!(viewport.update_auto_scroll(800.0));
        assert!(viewport.tick(Duration::from_millis(100)));
        assert!((viewport.scroll_y() - 90.0).abs() < 1e-6);

        viewport.stop_auto_scroll();
        assert!(!viewport.tick(Duration::from_millis(100)));

        assert!(viewport.update_auto_scroll(15.0));
        viewport.tick(Duration::from_millis(100));
        assert!((viewport.scroll_y() - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_visible_page_range() {
        let mut viewport = viewport();
        let layout = layout(5);
        viewport.scroll_to(850.0);
        // Pages 1 and 2 intersect 850..1650, one buffer page each side
        assert_eq!(viewport.visible_page_range(&layout), 0..4);
        assert!((viewport.page_visibility_ratio(&layout, 1) - 0.9625).abs() < 1e-6);
        assert_eq!(viewport.page_visibility_ratio(&layout, 4), 0.0);
    }

    proptest! {
        #[test]
        fn test_scroll_stays_in_bounds(target in -2000.0f64..8000.0, ms in 0u64..500) {
            let mut viewport = viewport();
            viewport.animate_to(target);
            viewport.tick(Duration::from_millis(ms));
            prop_assert!(viewport.scroll_y() >= 0.0);
            prop_assert!(viewport.scroll_y() <= viewport.max_scroll());
        }
    }
}
