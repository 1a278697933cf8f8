//! Per-operation performance instrumentation.
//!
//! [`PerformanceTracker::track`] times a closure and folds the outcome into
//! a named [`OperationMetric`]. The closure runs outside the lock; only the
//! counter update is serialized.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Aggregated counters for one named operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetric {
    /// Operation name.
    pub name: String,

    /// Total calls; always `success_count + error_count`.
    pub count: u64,

    /// Calls that returned `Ok`.
    pub success_count: u64,

    /// Calls that returned `Err`.
    pub error_count: u64,

    /// Sum of all call durations.
    pub total_duration: Duration,

    /// Fastest call.
    pub min_duration: Duration,

    /// Slowest call.
    pub max_duration: Duration,
}

impl OperationMetric {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: 0,
            success_count: 0,
            error_count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::ZERO,
            max_duration: Duration::ZERO,
        }
    }

    fn record(&mut self, elapsed: Duration, success: bool) {
        if self.count == 0 || elapsed < self.min_duration {
            self.min_duration = elapsed;
        }
        if elapsed > self.max_duration {
            self.max_duration = elapsed;
        }
        self.count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        self.total_duration = self.total_duration.saturating_add(elapsed);
    }

    /// Mean call duration, zero before the first call.
    pub fn average_duration(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let count = u32::try_from(self.count).unwrap_or(u32::MAX);
        self.total_duration / count
    }

    /// Fraction of calls that failed, zero before the first call.
    pub fn error_rate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.error_count as f64 / self.count as f64
    }
}

/// Point-in-time copy of every metric, ordered by name.
pub type MetricsSnapshot = BTreeMap<String, OperationMetric>;

/// Thread-safe registry of operation metrics.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    metrics: RwLock<HashMap<String, OperationMetric>>,
}

impl PerformanceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, recording its duration and outcome under `name`.
    ///
    /// The result of `f` is returned untouched.
    pub fn track<T, E, F>(&self, name: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let started = Instant::now();
        let result = f();
        self.record(name, started.elapsed(), result.is_ok());
        result
    }

    /// Fold one observation into `name`'s metric, creating it on first use.
    pub fn record(&self, name: &str, elapsed: Duration, success: bool) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        match metrics.get_mut(name) {
            Some(metric) => metric.record(elapsed, success),
            None => {
                let mut metric = OperationMetric::new(name);
                metric.record(elapsed, success);
                metrics.insert(name.to_string(), metric);
            }
        }
    }

    /// Copy of a single metric.
    pub fn metric(&self, name: &str) -> Option<OperationMetric> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Consistent copy of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect()
    }
}
