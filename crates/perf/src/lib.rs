//! Pipeline timing
//!
//! Scope timers for the stages an input event runs through (normalize,
//! paginate, selection, render) and the metrics they aggregate into.
//!
//! # Feature Flags
//!
//! - `telemetry` (default): timers record into [`global_metrics`] on drop
//!
//! # Example
//!
//! ```rust
//! use perf::{time_scope, global_summary, TimerCategory};
//!
//! fn repaginate() {
//!     time_scope!("repaginate", TimerCategory::Paginate);
//! }
//!
//! repaginate();
//! let summary = global_summary();
//! ```

mod metrics;
mod timing;

pub use metrics::*;
pub use timing::*;

/// Serialize the current global summary as JSON
pub fn summary_json() -> Option<String> {
    global_summary().and_then(|summary| serde_json::to_string_pretty(&summary).ok())
}
