//! License Manager - the main public API for Licenseward.
//!
//! The `LicenseManager` ties the pieces together:
//! - Cached validation with the remote authority as fallback
//! - Current validation state for status readers
//! - Per-operation metrics for every authority and store call
//! - Renewal advisories for the stored license
//!
//! Authority and store calls never run under a cache, state or metric lock;
//! their outcome is applied afterwards.

use crate::cache::key::log_id;
use crate::cache::{hash_license_key, SweepHandle, ValidationCache};
use crate::client::RemoteAuthority;
use crate::clock::{Clock, SystemClock};
use crate::config::LicensewardConfig;
use crate::errors::ErrorKind;
use crate::meter::PerformanceTracker;
use crate::policy::renewal::{RenewalAdvisory, RenewalEvaluator};
use crate::protocol::models::{
    require_email, require_license_key, LicenseDuration, LicenseSnapshot, LicenseStatus,
    ValidationResult,
};
use crate::state::{ValidationState, ValidationStateTracker};
use crate::status::{StatusReport, STATUS_SCHEMA_VERSION};
use crate::store::LicenseStore;
use crate::LicensewardError;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Result of a successful license validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// The positive verdict.
    pub result: ValidationResult,

    /// Whether this result came from cache.
    pub from_cache: bool,
}

/// Renewal check of the stored license.
#[derive(Debug, Clone)]
pub struct RenewalReport {
    /// The stored license record.
    pub license: LicenseSnapshot,

    /// Validation of its key.
    pub validation: ValidationOutcome,

    /// Renewal advisory; `None` only for an invalid license.
    pub advisory: Option<RenewalAdvisory>,
}

/// Main license manager for Licenseward.
///
/// Create one instance per license context and share it (e.g. in an `Arc`)
/// between request handlers and background checks.
pub struct LicenseManager {
    config: LicensewardConfig,
    clock: Arc<dyn Clock>,
    authority: Arc<dyn RemoteAuthority>,
    store: Arc<dyn LicenseStore>,
    cache: Arc<ValidationCache>,
    state: ValidationStateTracker,
    metrics: PerformanceTracker,
    renewal: RenewalEvaluator,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl LicenseManager {
    /// Create a new license manager with the given configuration.
    ///
    /// Uses the system clock for time operations.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration validation fails.
    pub fn new(
        config: LicensewardConfig,
        authority: Arc<dyn RemoteAuthority>,
        store: Arc<dyn LicenseStore>,
    ) -> Result<Self, LicensewardError> {
        config.validate()?;
        Ok(Self::with_clock(config, authority, store, Arc::new(SystemClock)))
    }

    /// Create a license manager with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: LicensewardConfig,
        authority: Arc<dyn RemoteAuthority>,
        store: Arc<dyn LicenseStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LicensewardError> {
        config.validate()?;
        Ok(Self::with_clock(config, authority, store, clock))
    }

    fn with_clock(
        config: LicensewardConfig,
        authority: Arc<dyn RemoteAuthority>,
        store: Arc<dyn LicenseStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(ValidationCache::new(
            config.cache_ttl,
            config.cache_max_size,
            Arc::clone(&clock),
        ));
        let state = ValidationStateTracker::new(Arc::clone(&clock));
        let renewal = RenewalEvaluator::new(config.renewal_warning_window);

        Self {
            config,
            clock,
            authority,
            store,
            cache,
            state,
            metrics: PerformanceTracker::new(),
            renewal,
            sweeper: Mutex::new(None),
        }
    }

    /// Validate a license key.
    ///
    /// This performs:
    /// 1. Serve a live cached verdict if one exists
    /// 2. Otherwise ask the remote authority
    /// 3. Cache definitive verdicts, positive or negative
    /// 4. Record the outcome as the current validation state
    ///
    /// # Errors
    /// - `MissingLicense` - No license key provided
    /// - `InvalidLicense` / `LicenseRevoked` - Authority denied the license
    /// - `AuthorityTransport` / `AuthorityUnavailable` - Verdict unknown;
    ///   nothing is cached
    pub fn validate_key(&self, license_key: &str) -> Result<ValidationOutcome, LicensewardError> {
        self.metrics.track("validate", || {
            let license_key = require_license_key(license_key)?;
            let key_hash = hash_license_key(license_key);

            match self.cache.get(&key_hash) {
                Some(cached) => self.apply_cached(cached),
                None => self.validate_remote(license_key, &key_hash),
            }
        })
    }

    /// Validate a license key against the authority, skipping the cache lookup.
    ///
    /// A transient failure leaves any cached verdict for the key in place.
    pub fn refresh_key(&self, license_key: &str) -> Result<ValidationOutcome, LicensewardError> {
        self.metrics.track("refresh", || {
            let license_key = require_license_key(license_key)?;
            let key_hash = hash_license_key(license_key);
            self.validate_remote(license_key, &key_hash)
        })
    }

    /// Last known live verdict for a key, without contacting the authority
    /// or counting as a cache lookup.
    pub fn cached_result(
        &self,
        license_key: &str,
    ) -> Result<Option<ValidationResult>, LicensewardError> {
        let license_key = require_license_key(license_key)?;
        let now = self.clock.now_utc();
        Ok(self
            .cache
            .entry(&hash_license_key(license_key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    fn apply_cached(&self, cached: ValidationResult) -> Result<ValidationOutcome, LicensewardError> {
        match cached.into_verdict() {
            Ok(result) => {
                self.state.set_state(true, None);
                Ok(ValidationOutcome {
                    result,
                    from_cache: true,
                })
            }
            Err(e) => {
                self.state.set_state(false, Some(&e));
                Err(e)
            }
        }
    }

    fn validate_remote(
        &self,
        license_key: &str,
        key_hash: &str,
    ) -> Result<ValidationOutcome, LicensewardError> {
        // A revoke or extend that lands while the authority call is in flight
        // wins over its verdict.
        let generation = self.cache.generation();
        let verdict = self
            .authority
            .validate(license_key)
            .and_then(ValidationResult::into_verdict);

        match verdict {
            Ok(result) => {
                self.cache.set_if_current(key_hash, result.clone(), generation);
                self.state.set_state(true, None);
                tracing::info!(action = "validate", key = log_id(key_hash), "License validated");
                Ok(ValidationOutcome {
                    result,
                    from_cache: false,
                })
            }
            Err(e) if e.kind() == ErrorKind::Validation => {
                let denied = ValidationResult::from_denial(&e, self.clock.now_utc());
                self.cache.set_if_current(key_hash, denied, generation);
                self.state.set_state(false, Some(&e));
                tracing::info!(
                    action = "validate",
                    key = log_id(key_hash),
                    error = %e,
                    "License denied by authority"
                );
                Err(e)
            }
            Err(e) => {
                self.state.set_state(false, Some(&e));
                tracing::warn!(
                    action = "validate",
                    key = log_id(key_hash),
                    error = %e,
                    transient = e.is_transient(),
                    "License validation failed without a verdict"
                );
                Err(e)
            }
        }
    }

    /// Activate a license for a user and persist the issued record.
    ///
    /// # Errors
    /// - `MissingLicense` / `InvalidEmail` - Bad input, nothing is attempted
    /// - Any authority error
    /// - Persistence errors from saving the record
    pub fn activate(
        &self,
        license_key: &str,
        user_email: &str,
    ) -> Result<LicenseSnapshot, LicensewardError> {
        self.metrics.track("activate", || {
            let license_key = require_license_key(license_key)?;
            let user_email = require_email(user_email)?;

            let mut snapshot = self.authority.activate(license_key, user_email)?;
            snapshot.last_checked = Some(self.clock.now_utc());
            self.store.save(&snapshot)?;

            let key_hash = hash_license_key(license_key);
            self.cache.invalidate(&key_hash);
            tracing::info!(action = "activate", key = log_id(&key_hash), "License activated");
            Ok(snapshot)
        })
    }

    /// Revoke a license.
    ///
    /// Drops the cached verdict so a stale positive cannot be served, and
    /// marks the stored record revoked if it holds this key.
    pub fn revoke(&self, license_key: &str) -> Result<(), LicensewardError> {
        self.metrics.track("revoke", || {
            let license_key = require_license_key(license_key)?;
            self.authority.revoke(license_key)?;

            let key_hash = hash_license_key(license_key);
            self.cache.invalidate(&key_hash);
            self.update_stored(license_key, |snapshot| {
                snapshot.status = LicenseStatus::Revoked;
            })?;
            tracing::info!(action = "revoke", key = log_id(&key_hash), "License revoked");
            Ok(())
        })
    }

    /// Extend a license by a duration such as `"30d"`, `"6m"` or `"1y"`.
    ///
    /// Returns the new expiry date and updates the stored record if it
    /// holds this key.
    pub fn extend(
        &self,
        license_key: &str,
        duration: &str,
    ) -> Result<DateTime<Utc>, LicensewardError> {
        self.metrics.track("extend", || {
            let license_key = require_license_key(license_key)?;
            let duration: LicenseDuration = duration.parse()?;

            let expiry = self.authority.extend(license_key, duration)?;

            let key_hash = hash_license_key(license_key);
            self.cache.invalidate(&key_hash);
            let now = self.clock.now_utc();
            self.update_stored(license_key, |snapshot| {
                snapshot.expiry_date = expiry;
                if snapshot.status == LicenseStatus::Expired && expiry >= now {
                    snapshot.status = LicenseStatus::Active;
                }
            })?;
            tracing::info!(
                action = "extend",
                key = log_id(&key_hash),
                duration = %duration,
                expiry = %expiry,
                "License extended"
            );
            Ok(expiry)
        })
    }

    /// Issue a new license key for a user.
    pub fn generate(&self, user_email: &str, duration: &str) -> Result<String, LicensewardError> {
        self.metrics.track("generate", || {
            let user_email = require_email(user_email)?;
            let duration: LicenseDuration = duration.parse()?;

            let license_key = self.authority.generate(user_email, duration)?;
            tracing::info!(action = "generate", duration = %duration, "License generated");
            Ok(license_key)
        })
    }

    /// Load the stored license record.
    pub fn load_license(&self) -> Result<LicenseSnapshot, LicensewardError> {
        self.metrics.track("load", || self.store.load())
    }

    /// Persist a license record.
    pub fn save_license(&self, snapshot: &LicenseSnapshot) -> Result<(), LicensewardError> {
        self.metrics.track("save", || {
            require_license_key(&snapshot.license_key)?;
            self.store.save(snapshot)
        })
    }

    /// Validate the stored license and assess whether it needs renewal.
    ///
    /// A transient validation failure is returned as-is; no renewal bucket
    /// is reported for an unknown verdict.
    pub fn check_renewal(&self) -> Result<RenewalReport, LicensewardError> {
        self.metrics.track("check_renewal", || {
            let license = self.load_license()?;
            let validation = self.validate_key(&license.license_key)?;
            let advisory = self.evaluate_renewal(&validation.result, license.expiry_date);

            if let Some(advisory) = advisory.as_ref().filter(|a| a.needs_renewal) {
                tracing::warn!(
                    action = "renewal",
                    urgency = ?advisory.urgency,
                    days_remaining = advisory.days_remaining,
                    "License needs renewal"
                );
            }

            Ok(RenewalReport {
                license,
                validation,
                advisory,
            })
        })
    }

    /// Renewal advisory for a verdict and expiry date, as of now.
    pub fn evaluate_renewal(
        &self,
        result: &ValidationResult,
        expiry: DateTime<Utc>,
    ) -> Option<RenewalAdvisory> {
        self.renewal.evaluate(result, expiry, self.clock.now_utc())
    }

    /// Most recent validation outcome. Never blocks on the network.
    pub fn validation_state(&self) -> ValidationState {
        self.state.get_state()
    }

    /// Assemble the operational status report.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            cache: self.cache.stats(),
            metrics: self.metrics.snapshot(),
            validation: self.state.get_state(),
            timestamp: self.clock.now_utc(),
            schema_version: STATUS_SCHEMA_VERSION.to_string(),
        }
    }

    /// Start the background cache sweep on the current Tokio runtime.
    ///
    /// Does nothing if a sweep is already running.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn start_sweeper(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.as_ref().is_some_and(SweepHandle::is_running) {
            return;
        }
        *sweeper = Some(SweepHandle::spawn(
            Arc::clone(&self.cache),
            self.config.sweep_interval,
        ));
    }

    /// Stop the background sweep, if running. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }

    /// The validation cache.
    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// The operation metrics.
    pub fn metrics(&self) -> &PerformanceTracker {
        &self.metrics
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LicensewardConfig {
        &self.config
    }

    fn update_stored<F>(&self, license_key: &str, update: F) -> Result<bool, LicensewardError>
    where
        F: FnOnce(&mut LicenseSnapshot),
    {
        match self.store.load() {
            Ok(mut snapshot) if snapshot.license_key == license_key => {
                update(&mut snapshot);
                self.store.save(&snapshot)?;
                Ok(true)
            }
            Ok(_) | Err(LicensewardError::LicenseNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
