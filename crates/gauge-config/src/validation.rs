//! Configuration validation logic.
//!
//! Runs after the hierarchy is merged, so rules see the effective values.

use crate::errors::ConfigError;
use crate::types::GaugeConfig;

/// Poll intervals a fixed-mode user may choose, in seconds.
pub const ALLOWED_FIXED_INTERVALS: [u64; 4] = [60, 180, 300, 600];

/// Longest history window, in days, for retention and listing.
pub const MAX_HISTORY_DAYS: u64 = 36_500;

/// Validate a GaugeConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - Fixed interval must be one of [`ALLOWED_FIXED_INTERVALS`]
/// - Thresholds must lie in 0–100 with warning below critical
/// - Timeouts must be non-zero and the request timeout may not exceed the
///   resource timeout
/// - Base URL must be http(s)
/// - History retention must lie in 1..=[`MAX_HISTORY_DAYS`]
pub fn validate_config(config: &GaugeConfig) -> Result<(), ConfigError> {
    let fixed = config.refresh.fixed_interval_secs();
    if !ALLOWED_FIXED_INTERVALS.contains(&fixed) {
        let allowed: Vec<String> = ALLOWED_FIXED_INTERVALS
            .iter()
            .map(|s| s.to_string())
            .collect();
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "Invalid fixed_interval_secs {}. Valid options: {}",
                fixed,
                allowed.join(", ")
            ),
        });
    }

    let warning = config.display.warning_threshold();
    let critical = config.display.critical_threshold();
    for (name, value) in [("warning_threshold", warning), ("critical_threshold", critical)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("{} must be between 0 and 100, got {}", name, value),
            });
        }
    }
    if warning >= critical {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "warning_threshold ({}) must be below critical_threshold ({})",
                warning, critical
            ),
        });
    }

    let request = config.api.request_timeout_secs();
    let resource = config.api.resource_timeout_secs();
    if request == 0 || resource == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "API timeouts must be greater than zero".to_string(),
        });
    }
    if request > resource {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "request_timeout_secs ({}) cannot exceed resource_timeout_secs ({})",
                request, resource
            ),
        });
    }

    let base_url = config.api.base_url();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(ConfigError::InvalidConfiguration {
            message: format!("base_url must start with http:// or https://, got '{}'", base_url),
        });
    }

    let retention = config.history.retention_days();
    if !(1..=MAX_HISTORY_DAYS).contains(&retention) {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "retention_days must be between 1 and {}, got {}",
                MAX_HISTORY_DAYS, retention
            ),
        });
    }

    Ok(())
}
