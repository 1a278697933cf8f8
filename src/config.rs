//! Licenseward configuration.

use std::time::Duration;

/// Default lifetime of a cached validation result (10 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Default maximum number of cached validation results.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1000;

/// Default period of the background expiry sweep (5 minutes).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default window before expiry in which renewal is advised (30 days).
pub const DEFAULT_RENEWAL_WARNING_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration for local license state management.
#[derive(Debug, Clone)]
pub struct LicensewardConfig {
    /// Application name (e.g., "shimmy", "crabcamera")
    pub app_name: &'static str,

    /// Namespace for the persisted license record.
    /// Each product should use a unique namespace to avoid collisions.
    pub cache_namespace: &'static str,

    /// How long a cached validation result is served before it expires.
    pub cache_ttl: Duration,

    /// Maximum number of cached validation results.
    /// Zero disables caching entirely.
    pub cache_max_size: usize,

    /// Period of the background sweep that drops expired cache entries.
    pub sweep_interval: Duration,

    /// Licenses expiring within this window are flagged for renewal.
    pub renewal_warning_window: Duration,
}

impl LicensewardConfig {
    /// Create a configuration with default cache and renewal settings.
    pub fn new(app_name: &'static str, cache_namespace: &'static str) -> Self {
        Self {
            app_name,
            cache_namespace,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            renewal_warning_window: DEFAULT_RENEWAL_WARNING_WINDOW,
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::LicensewardError> {
        if self.app_name.is_empty() {
            return Err(crate::LicensewardError::ConfigError(
                "app_name cannot be empty".to_string(),
            ));
        }
        if self.cache_namespace.is_empty() {
            return Err(crate::LicensewardError::ConfigError(
                "cache_namespace cannot be empty".to_string(),
            ));
        }
        if self.cache_ttl.is_zero() {
            return Err(crate::LicensewardError::ConfigError(
                "cache_ttl must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(crate::LicensewardError::ConfigError(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        if self.renewal_warning_window.is_zero() {
            return Err(crate::LicensewardError::ConfigError(
                "renewal_warning_window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LicensewardError;

    #[test]
    fn test_defaults_are_valid() {
        let config = LicensewardConfig::new("test-app", "test-ns");
        assert!(config.validate().is_ok());
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.renewal_warning_window.as_secs(), 30 * 86400);
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let config = LicensewardConfig::new("test-app", "");
        assert!(matches!(
            config.validate(),
            Err(LicensewardError::ConfigError(msg)) if msg.contains("cache_namespace")
        ));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = LicensewardConfig::new("test-app", "test-ns");
        config.cache_ttl = Duration::ZERO;
        assert!(matches!(config.validate(), Err(LicensewardError::ConfigError(_))));
    }

    #[test]
    fn test_zero_capacity_allowed() {
        let mut config = LicensewardConfig::new("test-app", "test-ns");
        config.cache_max_size = 0;
        assert!(config.validate().is_ok());
    }
}
