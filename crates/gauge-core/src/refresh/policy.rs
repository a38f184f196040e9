use std::time::Duration;

use gauge_config::{RefreshConfig, RefreshMode};
use tracing::info;

use super::controller::AdaptiveRefreshController;
use super::mode::MonitoringMode;

/// Chooses the poll interval from the user's refresh preference.
///
/// In `Smart` mode the adaptive controller decides; in `Fixed` mode the
/// controller is bypassed and the configured interval is used as-is. Every
/// method returning `bool` reports whether the caller must re-arm its timer.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    preference: RefreshMode,
    fixed_interval: Duration,
    controller: AdaptiveRefreshController,
}

impl RefreshPolicy {
    pub fn new(preference: RefreshMode, fixed_interval_secs: u64) -> Self {
        Self::with_controller(
            preference,
            fixed_interval_secs,
            AdaptiveRefreshController::new(),
        )
    }

    pub fn with_controller(
        preference: RefreshMode,
        fixed_interval_secs: u64,
        controller: AdaptiveRefreshController,
    ) -> Self {
        Self {
            preference,
            fixed_interval: Duration::from_secs(fixed_interval_secs),
            controller,
        }
    }

    pub fn from_config(config: &RefreshConfig) -> Self {
        Self::new(config.mode(), config.fixed_interval_secs())
    }

    pub fn preference(&self) -> RefreshMode {
        self.preference
    }

    pub fn controller(&self) -> &AdaptiveRefreshController {
        &self.controller
    }

    /// Current adaptive tier, `None` while in fixed mode.
    pub fn mode(&self) -> Option<MonitoringMode> {
        match self.preference {
            RefreshMode::Smart => Some(self.controller.mode()),
            RefreshMode::Fixed => None,
        }
    }

    pub fn current_interval(&self) -> Duration {
        match self.preference {
            RefreshMode::Smart => self.controller.interval(),
            RefreshMode::Fixed => self.fixed_interval,
        }
    }

    /// Feed a successful observation. Fixed mode ignores it.
    pub fn on_observation(&mut self, value: f64) -> bool {
        match self.preference {
            RefreshMode::Smart => self.controller.observe(value).mode_changed,
            RefreshMode::Fixed => false,
        }
    }

    /// User asked for fresh data. Smart mode drops back to `Active`.
    pub fn on_manual_refresh(&mut self) -> bool {
        match self.preference {
            RefreshMode::Smart => {
                let before = self.controller.mode();
                self.controller.force_active();
                before != MonitoringMode::Active
            }
            RefreshMode::Fixed => false,
        }
    }

    /// Switch preference. Adaptive state is discarded either way and the timer
    /// always needs re-arming.
    pub fn set_preference(
        &mut self,
        preference: RefreshMode,
        fixed_interval_secs: Option<u64>,
    ) -> bool {
        info!(
            event = "core.refresh.preference_changed",
            from = %self.preference,
            to = %preference,
            fixed_interval_secs = ?fixed_interval_secs,
        );
        self.preference = preference;
        if let Some(secs) = fixed_interval_secs {
            self.fixed_interval = Duration::from_secs(secs);
        }
        self.controller.reset();
        true
    }
}
