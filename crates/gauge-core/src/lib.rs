//! gauge-core: Core library for adaptive Claude usage polling
//!
//! Fetches usage from the Claude OAuth usage endpoint and decides how often to
//! ask again. Used by the `gauge` CLI.
//!
//! # Main Entry Points
//!
//! - [`refresh`] - Adaptive controller and smart/fixed refresh policy
//! - [`scheduler`] - Poll loop that drives fetches from the policy
//! - [`usage`] - Credentials, HTTP client, and usage types
//! - [`history`] - Daily usage history on disk

pub mod errors;
pub mod events;
pub mod history;
pub mod logging;
pub mod refresh;
pub mod scheduler;
pub mod usage;

pub use gauge_config::ConfigError;
pub use gauge_config::{
    ApiConfig, DisplayConfig, GaugeConfig, HistoryConfig, RefreshConfig, RefreshMode, UsageMetric,
};
pub use gauge_paths::GaugePaths;

pub use errors::{GaugeError, GaugeResult};
pub use history::{HistoryError, UsageRecord};
pub use refresh::{AdaptiveRefreshController, MonitoringMode, RefreshPolicy};
pub use scheduler::{PollScheduler, SchedulerCommand, SchedulerConfig, SchedulerEvent};
pub use usage::{
    CredentialStore, LevelThresholds, UsageClient, UsageError, UsageLevel, UsageSnapshot,
    UsageSource, UsageWindow,
};

// Re-export logging initialization
pub use logging::init_logging;
