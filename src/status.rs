//! Operational status payload.

use crate::cache::CacheStats;
use crate::meter::MetricsSnapshot;
use crate::state::ValidationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the [`StatusReport`] layout.
pub const STATUS_SCHEMA_VERSION: &str = "1.0";

/// Aggregated view of cache, metrics and validation state, for an
/// operational status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Validation cache statistics.
    pub cache: CacheStats,

    /// Per-operation metrics.
    pub metrics: MetricsSnapshot,

    /// Most recent validation outcome.
    pub validation: ValidationState,

    /// When the report was assembled.
    pub timestamp: DateTime<Utc>,

    /// [`STATUS_SCHEMA_VERSION`] at the time of writing.
    pub schema_version: String,
}

impl StatusReport {
    /// Serialize the report to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
