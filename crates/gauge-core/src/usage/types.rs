use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gauge_config::{DisplayConfig, UsageMetric};
use serde::{Deserialize, Serialize};

/// One rolling usage window (5-hour, 7-day, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Utilization percentage as reported, nominally 0-100.
    pub utilization: f64,
    pub resets_at: Option<DateTime<Utc>>,
}

impl UsageWindow {
    /// Utilization clamped into 0-100 for display.
    pub fn percentage(&self) -> f64 {
        if self.utilization.is_finite() {
            self.utilization.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Time left until the window resets; `None` when unknown or already past.
    pub fn time_until_reset(&self, now: DateTime<Utc>) -> Option<ChronoDuration> {
        let resets_at = self.resets_at?;
        let remaining = resets_at - now;
        (remaining > ChronoDuration::zero()).then_some(remaining)
    }
}

/// Usage limits returned by one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub five_hour: Option<UsageWindow>,
    pub seven_day: Option<UsageWindow>,
    pub seven_day_opus: Option<UsageWindow>,
    pub seven_day_sonnet: Option<UsageWindow>,
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn window(&self, metric: UsageMetric) -> Option<&UsageWindow> {
        match metric {
            UsageMetric::FiveHour => self.five_hour.as_ref(),
            UsageMetric::SevenDay => self.seven_day.as_ref(),
            UsageMetric::SevenDayOpus => self.seven_day_opus.as_ref(),
            UsageMetric::SevenDaySonnet => self.seven_day_sonnet.as_ref(),
            UsageMetric::Highest => self
                .windows()
                .into_iter()
                .map(|(_, w)| w)
                .max_by(|a, b| a.percentage().total_cmp(&b.percentage())),
        }
    }

    /// Percentage for `metric`, or `None` if the API omitted that window.
    pub fn percentage(&self, metric: UsageMetric) -> Option<f64> {
        self.window(metric).map(UsageWindow::percentage)
    }

    /// Present windows with their metric, in display order.
    pub fn windows(&self) -> Vec<(UsageMetric, &UsageWindow)> {
        [
            (UsageMetric::FiveHour, self.five_hour.as_ref()),
            (UsageMetric::SevenDay, self.seven_day.as_ref()),
            (UsageMetric::SevenDayOpus, self.seven_day_opus.as_ref()),
            (UsageMetric::SevenDaySonnet, self.seven_day_sonnet.as_ref()),
        ]
        .into_iter()
        .filter_map(|(metric, window)| window.map(|w| (metric, w)))
        .collect()
    }
}

/// Severity tier for a percentage, used to color output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    pub fn from_percentage(percentage: f64, thresholds: &LevelThresholds) -> Self {
        if percentage >= thresholds.critical {
            UsageLevel::Critical
        } else if percentage >= thresholds.warning {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    pub warning: f64,
    pub critical: f64,
}

impl From<&DisplayConfig> for LevelThresholds {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            warning: config.warning_threshold(),
            critical: config.critical_threshold(),
        }
    }
}

/// API response format (snake_case from API).
#[derive(Debug, Clone, Deserialize)]
pub struct UsageApiResponse {
    pub five_hour: Option<UsageWindowApi>,
    pub seven_day: Option<UsageWindowApi>,
    #[serde(default)]
    pub seven_day_opus: Option<UsageWindowApi>,
    #[serde(default)]
    pub seven_day_sonnet: Option<UsageWindowApi>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageWindowApi {
    pub utilization: f64,
    pub resets_at: Option<String>,
}

impl From<UsageWindowApi> for UsageWindow {
    fn from(api: UsageWindowApi) -> Self {
        // Unparseable reset times degrade to "unknown" rather than failing the fetch
        let resets_at = api
            .resets_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Self {
            utilization: api.utilization,
            resets_at,
        }
    }
}

impl UsageSnapshot {
    pub fn from_api(api: UsageApiResponse, fetched_at: DateTime<Utc>) -> Self {
        Self {
            five_hour: api.five_hour.map(Into::into),
            seven_day: api.seven_day.map(Into::into),
            seven_day_opus: api.seven_day_opus.map(Into::into),
            seven_day_sonnet: api.seven_day_sonnet.map(Into::into),
            fetched_at,
        }
    }
}
