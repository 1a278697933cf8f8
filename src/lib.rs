//! # Licenseward
//!
//! **Local license state for licensed Rust applications.**
//!
//! Licenseward sits between your application and a remote license
//! authority. It keeps recent validation verdicts in a concurrent TTL cache,
//! tracks the current validation status, meters every authority call and
//! tells you when the license is due for renewal.
//!
//! ## Features
//!
//! - **Validation cache**: TTL entries, oldest-first eviction at capacity,
//!   background expiry sweep with idempotent shutdown
//! - **Denial vs. outage**: confirmed denials are cached, transient
//!   authority failures never evict or overwrite a cached verdict
//! - **Current state**: one snapshot of the latest validation, readable
//!   without touching the network
//! - **Metrics**: count/success/error/duration per operation
//! - **Renewal policy**: `Expired` / `Warning` / `Active` buckets with a
//!   30-day default warning window
//!
//! ## Quickstart
//!
//! ```no_run
//! use licenseward::{FileLicenseStore, LicenseManager, LicensewardConfig, RemoteAuthority};
//! use std::sync::Arc;
//!
//! fn run(authority: Arc<dyn RemoteAuthority>) -> Result<(), licenseward::LicensewardError> {
//!     let config = LicensewardConfig::new("myapp", "myapp-pro");
//!     let store = Arc::new(FileLicenseStore::new(config.cache_namespace)?);
//!     let manager = LicenseManager::new(config, authority, store)?;
//!
//!     let outcome = manager.validate_key("LICENSE-KEY-HERE")?;
//!     println!("License valid! (cached: {})", outcome.from_cache);
//!
//!     let report = manager.check_renewal()?;
//!     if let Some(advisory) = report.advisory.filter(|a| a.needs_renewal) {
//!         println!("Renew within {} days", advisory.days_remaining);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Every component owns its own lock and no lock is held across an
//! authority or store call. The background sweep needs a Tokio runtime; see
//! [`LicenseManager::start_sweeper`].

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Cache layer
pub mod cache;

// Metering layer
pub mod meter;

// Policy layer
pub mod policy;

// State and persistence
pub mod state;
pub mod store;

// Status payload
pub mod status;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use cache::{CacheStats, SweepHandle, ValidationCache};
pub use client::RemoteAuthority;
pub use clock::{Clock, SystemClock};
pub use config::LicensewardConfig;
pub use errors::{ErrorKind, LicensewardError};
pub use manager::{LicenseManager, RenewalReport, ValidationOutcome};
pub use meter::{MetricsSnapshot, OperationMetric, PerformanceTracker};
pub use policy::renewal::{RenewalAdvisory, RenewalEvaluator, RenewalUrgency};
pub use protocol::models::{LicenseDuration, LicenseSnapshot, LicenseStatus, ValidationResult};
pub use state::{ValidationState, ValidationStateTracker};
pub use status::{StatusReport, STATUS_SCHEMA_VERSION};
pub use store::{FileLicenseStore, LicenseStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
