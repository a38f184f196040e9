//! # gauge-config
//!
//! TOML configuration types, loading, and validation for gauge.
//!
//! Single source of truth for `GaugeConfig` and the `RefreshMode` /
//! `UsageMetric` enums shared by the core and the CLI.

mod defaults;
mod loading;
mod validation;

pub mod errors;
pub mod types;

// Public API re-exports
pub use errors::ConfigError;
pub use loading::{CONFIG_ENV_VAR, load_hierarchy_from};
pub use types::{
    ApiConfig, DisplayConfig, GaugeConfig, HistoryConfig, RefreshConfig, RefreshMode, UsageMetric,
};
pub use validation::{ALLOWED_FIXED_INTERVALS, MAX_HISTORY_DAYS, validate_config};

impl GaugeConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
