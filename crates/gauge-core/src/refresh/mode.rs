use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Polling-rate tier chosen by the adaptive controller.
///
/// Tiers are ordered from most to least frequent polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringMode {
    #[default]
    Active,
    IdleShort,
    IdleMedium,
    IdleLong,
}

impl MonitoringMode {
    pub const ALL: [MonitoringMode; 4] = [
        MonitoringMode::Active,
        MonitoringMode::IdleShort,
        MonitoringMode::IdleMedium,
        MonitoringMode::IdleLong,
    ];

    /// Poll interval for this tier, in seconds.
    pub const fn interval_secs(self) -> u64 {
        match self {
            MonitoringMode::Active => 60,
            MonitoringMode::IdleShort => 180,
            MonitoringMode::IdleMedium => 300,
            MonitoringMode::IdleLong => 600,
        }
    }

    pub const fn interval(self) -> Duration {
        Duration::from_secs(self.interval_secs())
    }

    /// The next longer tier, or `None` from the terminal `IdleLong`.
    pub const fn next(self) -> Option<MonitoringMode> {
        match self {
            MonitoringMode::Active => Some(MonitoringMode::IdleShort),
            MonitoringMode::IdleShort => Some(MonitoringMode::IdleMedium),
            MonitoringMode::IdleMedium => Some(MonitoringMode::IdleLong),
            MonitoringMode::IdleLong => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonitoringMode::Active => "active",
            MonitoringMode::IdleShort => "idle_short",
            MonitoringMode::IdleMedium => "idle_medium",
            MonitoringMode::IdleLong => "idle_long",
        }
    }
}

impl fmt::Display for MonitoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
