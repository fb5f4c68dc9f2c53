//! Scope timers for the edit pipeline

use std::time::{Duration, Instant};

/// Pipeline stage a timing belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerCategory {
    /// Whole input event, from dispatch to caret sync
    Input,
    /// Line wrapping
    Normalize,
    /// Overflow, filling and coalescing
    Paginate,
    /// Range re-derivation and overlay updates
    Selection,
    /// Layout view and paint items
    Render,
    General,
}

impl TimerCategory {
    pub const ALL: [TimerCategory; 6] = [
        TimerCategory::Input,
        TimerCategory::Normalize,
        TimerCategory::Paginate,
        TimerCategory::Selection,
        TimerCategory::Render,
        TimerCategory::General,
    ];
}

/// Measures from creation to drop and records into the global metrics.
///
/// ```rust
/// use perf::{PerfTimer, TimerCategory};
///
/// fn paginate() {
///     let _timer = PerfTimer::with_category("repaginate", TimerCategory::Paginate);
/// }
/// ```
pub struct PerfTimer {
    name: &'static str,
    start: Instant,
    category: TimerCategory,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self::with_category(name, TimerCategory::General)
    }

    #[inline]
    pub fn with_category(name: &'static str, category: TimerCategory) -> Self {
        Self {
            name,
            start: Instant::now(),
            category,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn category(&self) -> TimerCategory {
        self.category
    }

    /// Stop without recording, returning the elapsed milliseconds
    #[inline]
    pub fn stop(self) -> f64 {
        let elapsed = self.elapsed_ms();
        std::mem::forget(self);
        elapsed
    }
}

#[cfg(feature = "telemetry")]
impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        tracing::trace!(
            target: "perf",
            name = self.name,
            category = ?self.category,
            elapsed_ms,
            "timer completed"
        );
        if let Ok(mut metrics) = crate::global_metrics().lock() {
            metrics.record(self.name, self.category, elapsed_ms);
        }
    }
}

/// Time the rest of the enclosing scope.
///
/// ```rust
/// use perf::{time_scope, TimerCategory};
///
/// fn normalize() {
///     time_scope!("normalize", TimerCategory::Normalize);
/// }
/// ```
#[macro_export]
macro_rules! time_scope {
    ($name:expr) => {
        let _timer = $crate::PerfTimer::new($name);
    };
    ($name:expr, $category:expr) => {
        let _timer = $crate::PerfTimer::with_category($name, $category);
    };
}
