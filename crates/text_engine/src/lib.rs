//! Text Engine - Text measurement, shaping and font metrics
//!
//! The layout core never touches fonts or rendered elements directly. Every
//! wrap decision, caret position and page height goes through the
//! [`TextMeasurer`] port defined here.
//!
//! # Modules
//!
//! - `measure`: The measurement port and a deterministic monospace measurer
//! - `shaper`: Text shaping using rustybuzz, exposed as a measurer
//! - `font`: Font identifiers and metrics
//! - `metrics`: Line height and baseline calculations

mod measure;
mod shaper;
mod font;
mod metrics;
mod error;

pub use measure::*;
pub use shaper::*;
pub use font::*;
pub use metrics::*;
pub use error::*;
