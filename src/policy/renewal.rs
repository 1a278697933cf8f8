//! Renewal urgency policy.
//!
//! Classifies how much lifetime a license has left:
//! - `Expired`: expiry is in the past
//! - `Warning`: expiry falls within the warning window (inclusive)
//! - `Active`: anything later

use crate::config::DEFAULT_RENEWAL_WARNING_WINDOW;
use crate::protocol::models::ValidationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How urgently a license needs renewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalUrgency {
    /// Already past its expiry date.
    Expired,
    /// Expiring within the warning window.
    Warning,
    /// Comfortably within its term.
    Active,
}

/// Renewal signal for a valid license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalAdvisory {
    /// Urgency bucket.
    pub urgency: RenewalUrgency,

    /// `true` unless the license is `Active`.
    pub needs_renewal: bool,

    /// Whole days until expiry; negative once expired.
    pub days_remaining: i64,
}

/// Maps license expiry dates to renewal urgency.
#[derive(Debug, Clone, Copy)]
pub struct RenewalEvaluator {
    warning_window: chrono::Duration,
}

impl Default for RenewalEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_RENEWAL_WARNING_WINDOW)
    }
}

impl RenewalEvaluator {
    /// Create an evaluator flagging licenses within `warning_window` of expiry.
    pub fn new(warning_window: Duration) -> Self {
        Self {
            warning_window: chrono::Duration::from_std(warning_window)
                .unwrap_or_else(|_| chrono::Duration::days(365_000)),
        }
    }

    /// Bucket `expiry` relative to `now`.
    pub fn classify(&self, expiry: DateTime<Utc>, now: DateTime<Utc>) -> RenewalUrgency {
        if expiry < now {
            return RenewalUrgency::Expired;
        }
        match now.checked_add_signed(self.warning_window) {
            Some(horizon) if expiry > horizon => RenewalUrgency::Active,
            _ => RenewalUrgency::Warning,
        }
    }

    /// Renewal advisory for a validation outcome.
    ///
    /// Returns `None` when the license is not valid: renewing a denied
    /// license is meaningless.
    pub fn evaluate(
        &self,
        result: &ValidationResult,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<RenewalAdvisory> {
        if !result.is_valid {
            return None;
        }

        let urgency = self.classify(expiry, now);
        Some(RenewalAdvisory {
            urgency,
            needs_renewal: urgency != RenewalUrgency::Active,
            days_remaining: (expiry - now).num_days(),
        })
    }
}
