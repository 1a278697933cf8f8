//! Licenseward error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while validating or managing a license.
#[derive(Debug, Error)]
pub enum LicensewardError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No license key provided.
    #[error("No license key provided")]
    MissingLicense,

    /// Email address is empty or malformed.
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    /// License duration is empty or malformed.
    #[error("Invalid license duration: {0:?}")]
    InvalidDuration(String),

    /// The authority confirmed the license is not valid.
    #[error("Invalid license: {reason}")]
    InvalidLicense {
        /// Verdict detail reported by the authority.
        reason: String,
    },

    /// The authority confirmed the license was revoked.
    #[error("License has been revoked")]
    LicenseRevoked,

    /// The authority could not be reached.
    #[error("License authority transport error: {0}")]
    AuthorityTransport(String),

    /// The authority answered without a definitive verdict.
    #[error("License authority unavailable: {0}")]
    AuthorityUnavailable(String),

    /// No license record has been persisted yet.
    #[error("No stored license found")]
    LicenseNotFound,

    /// The persisted license record could not be decoded.
    #[error("Stored license is corrupt: {0}")]
    LicenseCorrupt(String),

    /// Reading or writing the persisted license record failed.
    #[error("License store I/O error: {0}")]
    PersistenceIO(String),
}

/// Coarse classification of a [`LicensewardError`].
///
/// Downstream logic keys off this rather than individual variants: a
/// `Transient` failure means "unknown", a `Validation` failure means
/// "denied".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Confirmed invalid or revoked credential.
    Validation,
    /// Authority unreachable or indecisive.
    Transient,
    /// Malformed caller input, rejected before any side effect.
    Input,
    /// Local load/save failure.
    Persistence,
    /// Invalid configuration.
    Config,
}

impl LicensewardError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLicense { .. } | Self::LicenseRevoked => ErrorKind::Validation,
            Self::AuthorityTransport(_) | Self::AuthorityUnavailable(_) => ErrorKind::Transient,
            Self::MissingLicense | Self::InvalidEmail(_) | Self::InvalidDuration(_) => {
                ErrorKind::Input
            }
            Self::LicenseNotFound | Self::LicenseCorrupt(_) | Self::PersistenceIO(_) => {
                ErrorKind::Persistence
            }
            Self::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Whether the failure leaves the license verdict unknown.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
