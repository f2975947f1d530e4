//! Per-phase timing for voxel queries.
//!
//! Timing is only collected when the `profiling` feature is enabled.
//! Without the feature, the timer and collector compile to no-ops.

use serde::{Deserialize, Serialize};
#[cfg(feature = "profiling")]
use std::time::Instant;

/// Timing breakdown for a single query call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryTiming {
    /// Wall time of the whole call
    pub total_ms: f64,
    /// Input validation and batch partitioning
    pub partition_ms: f64,
    /// Resolve-and-claim pass over all points, including mask assembly
    pub sample_ms: f64,
}

/// Timer that can be enabled/disabled at compile time.
#[cfg(feature = "profiling")]
pub struct Timer {
    start: Instant,
}

#[cfg(feature = "profiling")]
impl Timer {
    #[inline]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(feature = "profiling")]
impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// No-op timer when profiling is disabled.
#[cfg(not(feature = "profiling"))]
#[derive(Default)]
pub struct Timer;

#[cfg(not(feature = "profiling"))]
impl Timer {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub fn elapsed_ms(&self) -> f64 {
        0.0
    }
}

/// Collector for timing data during one query.
#[cfg(feature = "profiling")]
#[derive(Debug, Default)]
pub struct TimingCollector {
    query_start: Option<Instant>,
    timing: QueryTiming,
}

#[cfg(feature = "profiling")]
impl TimingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_query(&mut self) {
        self.query_start = Some(Instant::now());
        self.timing = QueryTiming::default();
    }

    pub fn record_phase(&mut self, phase: &str, duration_ms: f64) {
        match phase {
            "partition" => self.timing.partition_ms += duration_ms,
            "sample" => self.timing.sample_ms += duration_ms,
            _ => {}
        }
    }

    pub fn finish(&mut self) -> QueryTiming {
        self.timing.total_ms = self
            .query_start
            .map(|s| s.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        std::mem::take(&mut self.timing)
    }
}

/// No-op collector when profiling is disabled.
#[cfg(not(feature = "profiling"))]
#[derive(Debug, Default)]
pub struct TimingCollector;

#[cfg(not(feature = "profiling"))]
impl TimingCollector {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub fn start_query(&mut self) {}

    #[inline(always)]
    pub fn record_phase(&mut self, _phase: &str, _duration_ms: f64) {}

    #[inline(always)]
    pub fn finish(&mut self) -> QueryTiming {
        QueryTiming::default()
    }
}

/// Time a block and record it under `$phase`.
///
/// ```ignore
/// let layout = time_phase!(collector, "partition", { validate(...) })?;
/// ```
#[macro_export]
macro_rules! time_phase {
    ($collector:expr, $phase:expr, $block:expr) => {{
        #[cfg(feature = "profiling")]
        let _timer = $crate::timing::Timer::new();

        let result = $block;

        #[cfg(feature = "profiling")]
        $collector.record_phase($phase, _timer.elapsed_ms());

        result
    }};
}
