//! Current validation status of the active license.
//!
//! Unlike [`ValidationCache`](crate::cache::ValidationCache), which keeps
//! one entry per key, the tracker holds a single snapshot: whatever the
//! most recent validation attempt concluded, success or failure.

use crate::clock::Clock;
use crate::errors::{ErrorKind, LicensewardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of the most recent validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    /// Whether the last attempt confirmed a valid license.
    pub is_valid: bool,

    /// Error message of the last attempt, if it failed.
    pub error: Option<String>,

    /// Classification of that error.
    pub error_kind: Option<ErrorKind>,

    /// When the last attempt finished; `None` before the first one.
    pub checked_at: Option<DateTime<Utc>>,
}

impl ValidationState {
    fn unchecked() -> Self {
        Self {
            is_valid: false,
            error: None,
            error_kind: None,
            checked_at: None,
        }
    }

    /// Whether the last attempt failed without a definitive verdict.
    pub fn is_unknown(&self) -> bool {
        self.error_kind == Some(ErrorKind::Transient)
    }
}

/// Holder of the single current [`ValidationState`].
pub struct ValidationStateTracker {
    state: RwLock<ValidationState>,
    clock: Arc<dyn Clock>,
}

impl ValidationStateTracker {
    /// Create a tracker that has not seen any validation yet.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(ValidationState::unchecked()),
            clock,
        }
    }

    /// Replace the snapshot with the outcome of a validation attempt.
    pub fn set_state(&self, is_valid: bool, error: Option<&LicensewardError>) {
        let next = ValidationState {
            is_valid,
            error: error.map(ToString::to_string),
            error_kind: error.map(LicensewardError::kind),
            checked_at: Some(self.clock.now_utc()),
        };
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Copy of the current snapshot.
    pub fn get_state(&self) -> ValidationState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
