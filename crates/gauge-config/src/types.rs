//! Configuration types for `config.toml`.
//!
//! Every field is optional so user and project files can be layered with
//! [`GaugeConfig::merge`]. Accessor methods resolve missing values to the
//! built-in defaults in [`crate::defaults`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// How the poll interval is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// The adaptive controller picks the interval from observed activity.
    #[default]
    Smart,
    /// A constant user-chosen interval; the adaptive controller is bypassed.
    Fixed,
}

impl RefreshMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshMode::Smart => "smart",
            RefreshMode::Fixed => "fixed",
        }
    }
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which usage window drives the headline percentage and the refresh controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageMetric {
    #[default]
    FiveHour,
    SevenDay,
    SevenDayOpus,
    SevenDaySonnet,
    /// The highest utilization among all windows present in the response.
    Highest,
}

impl UsageMetric {
    pub const ALL: [UsageMetric; 5] = [
        UsageMetric::FiveHour,
        UsageMetric::SevenDay,
        UsageMetric::SevenDayOpus,
        UsageMetric::SevenDaySonnet,
        UsageMetric::Highest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageMetric::FiveHour => "five_hour",
            UsageMetric::SevenDay => "seven_day",
            UsageMetric::SevenDayOpus => "seven_day_opus",
            UsageMetric::SevenDaySonnet => "seven_day_sonnet",
            UsageMetric::Highest => "highest",
        }
    }
}

impl fmt::Display for UsageMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UsageMetric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = UsageMetric::ALL.iter().map(|m| m.as_str()).collect();
                format!("Unknown metric '{}'. Valid options: {}", s, valid.join(", "))
            })
    }
}

/// `[refresh]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RefreshMode>,

    /// Interval used in fixed mode. Must be one of
    /// [`crate::ALLOWED_FIXED_INTERVALS`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_interval_secs: Option<u64>,

    /// Manual refreshes closer together than this only reset the controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_manual_interval_secs: Option<u64>,
}

impl RefreshConfig {
    pub fn mode(&self) -> RefreshMode {
        self.mode.unwrap_or_default()
    }

    pub fn fixed_interval_secs(&self) -> u64 {
        self.fixed_interval_secs
            .unwrap_or(defaults::FIXED_INTERVAL_SECS)
    }

    pub fn min_manual_interval_secs(&self) -> u64 {
        self.min_manual_interval_secs
            .unwrap_or(defaults::MIN_MANUAL_INTERVAL_SECS)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            mode: override_config.mode.or(base.mode),
            fixed_interval_secs: override_config
                .fixed_interval_secs
                .or(base.fixed_interval_secs),
            min_manual_interval_secs: override_config
                .min_manual_interval_secs
                .or(base.min_manual_interval_secs),
        }
    }
}

/// `[api]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Per-request timeout handed to the HTTP client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Overall deadline for one fetch, credentials lookup included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(defaults::API_BASE_URL)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(defaults::USER_AGENT)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS)
    }

    pub fn resource_timeout_secs(&self) -> u64 {
        self.resource_timeout_secs
            .unwrap_or(defaults::RESOURCE_TIMEOUT_SECS)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            base_url: override_config
                .base_url
                .clone()
                .or(base.base_url.clone()),
            user_agent: override_config
                .user_agent
                .clone()
                .or(base.user_agent.clone()),
            request_timeout_secs: override_config
                .request_timeout_secs
                .or(base.request_timeout_secs),
            resource_timeout_secs: override_config
                .resource_timeout_secs
                .or(base.resource_timeout_secs),
        }
    }
}

/// `[display]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<UsageMetric>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_threshold: Option<f64>,
}

impl DisplayConfig {
    pub fn metric(&self) -> UsageMetric {
        self.metric.unwrap_or_default()
    }

    pub fn warning_threshold(&self) -> f64 {
        self.warning_threshold
            .unwrap_or(defaults::WARNING_THRESHOLD)
    }

    pub fn critical_threshold(&self) -> f64 {
        self.critical_threshold
            .unwrap_or(defaults::CRITICAL_THRESHOLD)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            metric: override_config.metric.or(base.metric),
            warning_threshold: override_config
                .warning_threshold
                .or(base.warning_threshold),
            critical_threshold: override_config
                .critical_threshold
                .or(base.critical_threshold),
        }
    }
}

/// `[history]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u64>,
}

impl HistoryConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn retention_days(&self) -> u64 {
        self.retention_days
            .unwrap_or(defaults::HISTORY_RETENTION_DAYS)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            enabled: override_config.enabled.or(base.enabled),
            retention_days: override_config.retention_days.or(base.retention_days),
        }
    }
}

/// Top-level `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    pub refresh: RefreshConfig,
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub history: HistoryConfig,
}

impl GaugeConfig {
    /// Layer `override_config` on top of `base`, field by field.
    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            refresh: RefreshConfig::merge(&base.refresh, &override_config.refresh),
            api: ApiConfig::merge(&base.api, &override_config.api),
            display: DisplayConfig::merge(&base.display, &override_config.display),
            history: HistoryConfig::merge(&base.history, &override_config.history),
        }
    }

    /// A copy with every optional field filled in, for display.
    pub fn resolved(&self) -> Self {
        Self {
            refresh: RefreshConfig {
                mode: Some(self.refresh.mode()),
                fixed_interval_secs: Some(self.refresh.fixed_interval_secs()),
                min_manual_interval_secs: Some(self.refresh.min_manual_interval_secs()),
            },
            api: ApiConfig {
                base_url: Some(self.api.base_url().to_string()),
                user_agent: Some(self.api.user_agent().to_string()),
                request_timeout_secs: Some(self.api.request_timeout_secs()),
                resource_timeout_secs: Some(self.api.resource_timeout_secs()),
            },
            display: DisplayConfig {
                metric: Some(self.display.metric()),
                warning_threshold: Some(self.display.warning_threshold()),
                critical_threshold: Some(self.display.critical_threshold()),
            },
            history: HistoryConfig {
                enabled: Some(self.history.enabled()),
                retention_days: Some(self.history.retention_days()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let config = GaugeConfig::default();
        assert_eq!(config.refresh.mode(), RefreshMode::Smart);
        assert_eq!(config.refresh.fixed_interval_secs(), 300);
        assert_eq!(config.api.base_url(), "https://api.anthropic.com");
        assert_eq!(config.api.request_timeout_secs(), 30);
        assert_eq!(config.api.resource_timeout_secs(), 60);
        assert_eq!(config.display.metric(), UsageMetric::FiveHour);
        assert!(!config.history.enabled());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: GaugeConfig = toml::from_str(
            r#"
            [refresh]
            mode = "fixed"
            fixed_interval_secs = 600

            [display]
            metric = "seven_day"
            "#,
        )
        .unwrap();

        assert_eq!(config.refresh.mode(), RefreshMode::Fixed);
        assert_eq!(config.refresh.fixed_interval_secs(), 600);
        assert_eq!(config.display.metric(), UsageMetric::SevenDay);
        assert_eq!(config.api.user_agent(), "claude-code/2.0.31");
    }

    #[test]
    fn test_merge_override_wins_only_when_set() {
        let base: GaugeConfig = toml::from_str(
            r#"
            [refresh]
            mode = "fixed"
            fixed_interval_secs = 180
            [history]
            enabled = true
            "#,
        )
        .unwrap();
        let project: GaugeConfig = toml::from_str(
            r#"
            [refresh]
            fixed_interval_secs = 60
            "#,
        )
        .unwrap();

        let merged = GaugeConfig::merge(&base, &project);
        assert_eq!(merged.refresh.mode(), RefreshMode::Fixed);
        assert_eq!(merged.refresh.fixed_interval_secs(), 60);
        assert!(merged.history.enabled());
    }

    #[test]
    fn test_resolved_fills_every_field() {
        let resolved = GaugeConfig::default().resolved();
        assert_eq!(resolved.refresh.mode, Some(RefreshMode::Smart));
        assert_eq!(resolved.api.resource_timeout_secs, Some(60));
        assert_eq!(resolved.display.critical_threshold, Some(90.0));
        assert_eq!(resolved.history.retention_days, Some(30));

        // Resolved output round-trips through TOML
        let rendered = toml::to_string_pretty(&resolved).unwrap();
        assert!(rendered.contains("mode = \"smart\""));
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("highest".parse::<UsageMetric>(), Ok(UsageMetric::Highest));
        assert_eq!(
            "seven_day_opus".parse::<UsageMetric>(),
            Ok(UsageMetric::SevenDayOpus)
        );
        let err = "daily".parse::<UsageMetric>().unwrap_err();
        assert!(err.contains("five_hour"));
    }
}
