//! Contract for the remote license authority.
//!
//! The authority is the system of record for licenses. Implementations own
//! transport, retries and protocol details; they report outcomes through
//! [`LicensewardError`] so callers can tell a denial from an outage:
//! - `InvalidLicense` / `LicenseRevoked`: definitive verdict
//! - `AuthorityTransport` / `AuthorityUnavailable`: verdict unknown

use crate::protocol::models::{LicenseDuration, LicenseSnapshot, ValidationResult};
use crate::LicensewardError;
use chrono::{DateTime, Utc};

/// Remote license authority.
pub trait RemoteAuthority: Send + Sync {
    /// Validate a license key.
    ///
    /// A denial may be reported either as `Ok` with `is_valid == false` or
    /// as a `Validation`-kind error.
    fn validate(&self, license_key: &str) -> Result<ValidationResult, LicensewardError>;

    /// Activate a license for a user and return the issued record.
    fn activate(
        &self,
        license_key: &str,
        user_email: &str,
    ) -> Result<LicenseSnapshot, LicensewardError>;

    /// Revoke a license.
    fn revoke(&self, license_key: &str) -> Result<(), LicensewardError>;

    /// Extend a license by `duration` and return the new expiry date.
    fn extend(
        &self,
        license_key: &str,
        duration: LicenseDuration,
    ) -> Result<DateTime<Utc>, LicensewardError>;

    /// Issue a new license key.
    fn generate(
        &self,
        user_email: &str,
        duration: LicenseDuration,
    ) -> Result<String, LicensewardError>;
}
