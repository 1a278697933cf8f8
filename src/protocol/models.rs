//! Validation results and the persisted license record.

use crate::LicensewardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single license validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the license is valid.
    pub is_valid: bool,

    /// Verdict detail when the license is not valid.
    pub error: Option<String>,

    /// When the verdict was produced.
    pub checked_at: DateTime<Utc>,

    /// The denial was a revocation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub revoked: bool,
}

impl ValidationResult {
    /// A positive verdict.
    pub fn valid(checked_at: DateTime<Utc>) -> Self {
        Self {
            is_valid: true,
            error: None,
            checked_at,
            revoked: false,
        }
    }

    /// A negative verdict with its reason.
    pub fn invalid(reason: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.into()),
            checked_at,
            revoked: false,
        }
    }

    /// A negative verdict recording that the license was revoked.
    pub fn revoked(checked_at: DateTime<Utc>) -> Self {
        Self {
            revoked: true,
            ..Self::invalid(LicensewardError::LicenseRevoked.to_string(), checked_at)
        }
    }

    /// The negative verdict matching a denial error, so that
    /// [`into_verdict`](Self::into_verdict) rebuilds the same variant.
    pub fn from_denial(error: &LicensewardError, checked_at: DateTime<Utc>) -> Self {
        match error {
            LicensewardError::LicenseRevoked => Self::revoked(checked_at),
            LicensewardError::InvalidLicense { reason } => Self::invalid(reason.clone(), checked_at),
            other => Self::invalid(other.to_string(), checked_at),
        }
    }

    /// Convert a negative verdict into the matching error.
    ///
    /// Returns `Ok(self)` for a valid result.
    pub fn into_verdict(self) -> Result<Self, LicensewardError> {
        if self.is_valid {
            return Ok(self);
        }
        if self.revoked {
            return Err(LicensewardError::LicenseRevoked);
        }
        Err(LicensewardError::InvalidLicense {
            reason: self.error.unwrap_or_else(|| "license is not valid".to_string()),
        })
    }
}

/// Lifecycle status of the persisted license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Activated and within its term.
    Active,
    /// Past its expiry date.
    Expired,
    /// Revoked by the authority.
    Revoked,
}

/// Locally persisted license record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSnapshot {
    /// The license key.
    pub license_key: String,

    /// Email the license was issued to.
    pub user_email: String,

    /// When the license stops being valid.
    pub expiry_date: DateTime<Utc>,

    /// When the license was issued.
    pub issued_date: DateTime<Utc>,

    /// License term as issued (e.g. "1y").
    pub duration: String,

    /// Lifecycle status.
    pub status: LicenseStatus,

    /// Last time the license was validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: i64 = 365;

/// Longest accepted term: 100 years.
pub const MAX_DURATION_DAYS: i64 = 100 * DAYS_PER_YEAR;

/// License term such as `30d`, `6m` or `1y`.
///
/// Months count as 30 days and years as 365 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseDuration {
    /// A number of days.
    Days(u32),
    /// A number of 30-day months.
    Months(u32),
    /// A number of 365-day years.
    Years(u32),
}

impl LicenseDuration {
    /// Total length in days.
    pub fn days(&self) -> i64 {
        match *self {
            Self::Days(n) => i64::from(n),
            Self::Months(n) => i64::from(n) * DAYS_PER_MONTH,
            Self::Years(n) => i64::from(n) * DAYS_PER_YEAR,
        }
    }

    /// Length as a chrono duration, saturating for values built past
    /// [`MAX_DURATION_DAYS`] without going through `FromStr`.
    pub fn as_chrono(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.days()).unwrap_or(chrono::Duration::MAX)
    }
}

impl FromStr for LicenseDuration {
    type Err = LicensewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || LicensewardError::InvalidDuration(s.to_string());

        if trimmed.len() < 2 || !trimmed.is_ascii() {
            return Err(invalid());
        }
        let (count, unit) = trimmed.split_at(trimmed.len() - 1);
        let count: u32 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        let duration = match unit {
            "d" | "D" => Self::Days(count),
            "m" | "M" => Self::Months(count),
            "y" | "Y" => Self::Years(count),
            _ => return Err(invalid()),
        };
        if duration.days() > MAX_DURATION_DAYS {
            return Err(invalid());
        }
        Ok(duration)
    }
}

impl fmt::Display for LicenseDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{}d", n),
            Self::Months(n) => write!(f, "{}m", n),
            Self::Years(n) => write!(f, "{}y", n),
        }
    }
}

/// Reject an empty license key.
pub fn require_license_key(license_key: &str) -> Result<&str, LicensewardError> {
    let trimmed = license_key.trim();
    if trimmed.is_empty() {
        return Err(LicensewardError::MissingLicense);
    }
    Ok(trimmed)
}

/// Reject an empty or obviously malformed email address.
pub fn require_email(email: &str) -> Result<&str, LicensewardError> {
    let trimmed = email.trim();
    let well_formed = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(LicensewardError::InvalidEmail(email.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_result_passes_verdict() {
        let result = ValidationResult::valid(at());
        assert!(result.clone().into_verdict().is_ok());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_invalid_result_becomes_error() {
        let result = ValidationResult::invalid("EXPIRED", at());
        let err = result.into_verdict().unwrap_err();
        assert!(matches!(err, LicensewardError::InvalidLicense { reason } if reason == "EXPIRED"));
    }

    #[test]
    fn test_parse_durations() {
        assert_eq!("30d".parse::<LicenseDuration>().unwrap(), LicenseDuration::Days(30));
        assert_eq!("6m".parse::<LicenseDuration>().unwrap().days(), 180);
        assert_eq!("1y".parse::<LicenseDuration>().unwrap().days(), 365);
        assert_eq!(" 2Y ".parse::<LicenseDuration>().unwrap(), LicenseDuration::Years(2));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        for bad in ["", "d", "0d", "-1d", "12", "1w", "1.5y", "ten d"] {
            assert!(
                matches!(bad.parse::<LicenseDuration>(), Err(LicensewardError::InvalidDuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range() {
        assert_eq!("100y".parse::<LicenseDuration>().unwrap().days(), MAX_DURATION_DAYS);
        assert_eq!("36500d".parse::<LicenseDuration>().unwrap().days(), MAX_DURATION_DAYS);
        for bad in ["101y", "36501d", "1217m", "4294967295y", "4294967295m", "4294967296d"] {
            assert!(
                matches!(bad.parse::<LicenseDuration>(), Err(LicensewardError::InvalidDuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_as_chrono_saturates() {
        assert_eq!(LicenseDuration::Years(u32::MAX).as_chrono(), chrono::Duration::MAX);
        assert_eq!(LicenseDuration::Days(7).as_chrono(), chrono::Duration::days(7));
    }

    #[test]
    fn test_revoked_result_keeps_variant() {
        let result = ValidationResult::from_denial(&LicensewardError::LicenseRevoked, at());
        assert!(!result.is_valid);
        assert!(result.revoked);
        assert!(matches!(result.into_verdict(), Err(LicensewardError::LicenseRevoked)));

        let suspended = LicensewardError::InvalidLicense {
            reason: "SUSPENDED".to_string(),
        };
        let result = ValidationResult::from_denial(&suspended, at());
        assert!(!result.revoked);
        assert!(matches!(result.into_verdict(), Err(LicensewardError::InvalidLicense { reason }) if reason == "SUSPENDED"));
    }

    #[test]
    fn test_result_json_omits_revoked_when_false() {
        let json = serde_json::to_value(ValidationResult::valid(at())).unwrap();
        assert!(json.get("revoked").is_none());

        let json = serde_json::to_value(ValidationResult::revoked(at())).unwrap();
        assert_eq!(json["revoked"], true);
    }

    #[test]
    fn test_duration_display_matches_parse() {
        assert_eq!(LicenseDuration::Months(6).to_string(), "6m");
    }

    #[test]
    fn test_require_license_key() {
        assert!(matches!(require_license_key(""), Err(LicensewardError::MissingLicense)));
        assert!(matches!(require_license_key("   "), Err(LicensewardError::MissingLicense)));
        assert_eq!(require_license_key(" KEY-1 ").unwrap(), "KEY-1");
    }

    #[test]
    fn test_require_email() {
        assert_eq!(require_email("dev@example.com").unwrap(), "dev@example.com");
        for bad in ["", "dev", "@example.com", "dev@", "dev@example", "dev@.com", "d v@example.com"] {
            assert!(
                matches!(require_email(bad), Err(LicensewardError::InvalidEmail(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = LicenseSnapshot {
            license_key: "KEY-1".to_string(),
            user_email: "dev@example.com".to_string(),
            expiry_date: at() + chrono::Duration::days(365),
            issued_date: at(),
            duration: "1y".to_string(),
            status: LicenseStatus::Active,
            last_checked: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json.get("last_checked").is_none());

        let back: LicenseSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}
