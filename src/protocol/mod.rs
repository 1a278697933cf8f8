//! Data exchanged with the license authority and the local store.

pub mod models;

pub use models::{
    require_email, require_license_key, LicenseDuration, LicenseSnapshot, LicenseStatus,
    ValidationResult,
};
