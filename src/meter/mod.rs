//! Operation metering.

pub mod performance;

pub use performance::{MetricsSnapshot, OperationMetric, PerformanceTracker};
