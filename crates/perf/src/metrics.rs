//! Aggregated timings per pipeline stage

use crate::timing::TimerCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock};

static GLOBAL_METRICS: OnceLock<Mutex<PerfMetrics>> = OnceLock::new();

/// Process-wide metrics that [`crate::PerfTimer`] records into
pub fn global_metrics() -> &'static Mutex<PerfMetrics> {
    GLOBAL_METRICS.get_or_init(|| Mutex::new(PerfMetrics::new()))
}

pub fn reset_global_metrics() {
    if let Ok(mut metrics) = global_metrics().lock() {
        metrics.reset();
    }
}

/// Snapshot of the global metrics summary
pub fn global_summary() -> Option<PerfSummary> {
    global_metrics().lock().ok().map(|m| m.summary())
}

/// Timing samples keyed by category and by timer name
#[derive(Debug, Clone)]
pub struct PerfMetrics {
    by_category: HashMap<TimerCategory, Vec<f64>>,
    by_name: HashMap<String, Vec<f64>>,
    /// Samples kept per key, oldest dropped first
    max_samples: usize,
    enabled: bool,
}

impl PerfMetrics {
    pub fn new() -> Self {
        Self {
            by_category: HashMap::new(),
            by_name: HashMap::new(),
            max_samples: 1000,
            enabled: true,
        }
    }

    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples = max.max(1);
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, name: &str, category: TimerCategory, duration_ms: f64) {
        if !self.enabled {
            return;
        }
        let max = self.max_samples;
        push_bounded(self.by_category.entry(category).or_default(), duration_ms, max);
        push_bounded(self.by_name.entry(name.to_string()).or_default(), duration_ms, max);
    }

    pub fn samples(&self, category: TimerCategory) -> &[f64] {
        self.by_category.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn samples_named(&self, name: &str) -> &[f64] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summary(&self) -> PerfSummary {
        PerfSummary {
            categories: TimerCategory::ALL
                .iter()
                .filter(|c| self.by_category.contains_key(c))
                .map(|c| (*c, TimingStats::from_samples(self.samples(*c))))
                .collect(),
            timers: self
                .by_name
                .iter()
                .map(|(name, samples)| (name.clone(), TimingStats::from_samples(samples)))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        self.by_category.clear();
        self.by_name.clear();
    }
}

impl Default for PerfMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(samples: &mut Vec<f64>, value: f64, max: usize) {
    if samples.len() >= max {
        samples.remove(0);
    }
    samples.push(value);
}

/// Statistics per category and per timer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfSummary {
    pub categories: BTreeMap<TimerCategory, TimingStats>,
    pub timers: BTreeMap<String, TimingStats>,
}

/// Statistical summary of timing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub total_ms: f64,
}

impl TimingStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let mut sorted: Vec<f64> = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total_ms: f64 = samples.iter().sum();
        let median_ms = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            count,
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            mean_ms: total_ms / count as f64,
            median_ms,
            p95_ms: percentile(&sorted, 95.0),
            total_ms,
        }
    }
}

/// Linear-interpolated percentile of sorted samples
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = (p / 100.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (rank.ceil() as usize).min(len - 1);
            let fraction = rank - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}
