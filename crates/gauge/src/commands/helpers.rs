use std::fmt::Display;

use clap::ArgMatches;
use tracing::warn;

use gauge_config::{GaugeConfig, UsageMetric};
use gauge_core::usage::{CredentialStore, UsageClient, UsageError};
use gauge_core::{GaugePaths, UsageLevel};

use crate::color;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub fn load_config_with_warning() -> GaugeConfig {
    match GaugeConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{} Could not load config: {}. Using defaults.",
                color::warning("Warning:"),
                e
            );
            eprintln!(
                "{}",
                color::hint("Tip: Check ~/.gauge/config.toml and ./.gauge/config.toml.")
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            GaugeConfig::default()
        }
    }
}

/// `--metric` if given, otherwise the configured display metric.
pub fn resolve_metric(matches: &ArgMatches, config: &GaugeConfig) -> UsageMetric {
    matches
        .get_one::<UsageMetric>("metric")
        .copied()
        .unwrap_or_else(|| config.display.metric())
}

/// Build a usage client reading credentials from the standard locations.
pub fn build_client(config: &GaugeConfig) -> Result<UsageClient, Box<dyn std::error::Error>> {
    let paths = GaugePaths::resolve()?;
    let client = UsageClient::new(&config.api, CredentialStore::new(&paths))?;
    Ok(client)
}

pub fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Print `{"error": ..., "code": ...}` to stdout and return a boxed error for
/// the handler to propagate.
pub fn print_json_error(error: &dyn Display, code: &str) -> Box<dyn std::error::Error> {
    let message = error.to_string();
    let body = serde_json::json!({ "error": message, "code": code });
    println!("{}", body);
    message.into()
}

/// Extra line for errors the user can fix themselves.
pub fn usage_error_hint(error: &UsageError) -> Option<&'static str> {
    match error {
        UsageError::Credentials(_) => Some(
            "Sign in with Claude Code first, or set GAUGE_OAUTH_TOKEN to an OAuth access token.",
        ),
        UsageError::Unauthorized { .. } => {
            Some("The OAuth token was rejected. Sign in to Claude Code again.")
        }
        UsageError::RateLimited { .. } => Some("Rate limited by the API. Try again later."),
        _ => None,
    }
}

pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}

pub fn colored_percentage(percentage: f64, config: &GaugeConfig) -> String {
    let level = UsageLevel::from_percentage(percentage, &(&config.display).into());
    color::level(&format_percentage(percentage), level)
}

/// Compact remaining time: `2d 4h`, `3h 12m`, `45m`, `<1m`.
pub fn format_remaining(remaining: chrono::Duration) -> String {
    let minutes = remaining.num_minutes();
    if minutes < 1 {
        return "<1m".to_string();
    }
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

pub fn format_interval(interval: std::time::Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::seconds(30)), "<1m");
        assert_eq!(format_remaining(Duration::seconds(-5)), "<1m");
        assert_eq!(format_remaining(Duration::minutes(45)), "45m");
        assert_eq!(format_remaining(Duration::minutes(192)), "3h 12m");
        assert_eq!(format_remaining(Duration::hours(52)), "2d 4h");
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(std::time::Duration::from_secs(60)), "1m");
        assert_eq!(format_interval(std::time::Duration::from_secs(180)), "3m");
        assert_eq!(format_interval(std::time::Duration::from_secs(5)), "5s");
        assert_eq!(format_interval(std::time::Duration::from_secs(90)), "90s");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(37.0), "37.0%");
        assert_eq!(format_percentage(12.34), "12.3%");
    }

    #[test]
    fn test_usage_error_hint() {
        let creds = UsageError::Credentials(gauge_core::usage::CredentialsError::Expired);
        assert!(usage_error_hint(&creds).is_some());
        assert!(usage_error_hint(&UsageError::Timeout { secs: 30 }).is_none());
    }
}
