//! Adaptive refresh controller.
//!
//! Watches successive usage percentages and backs the poll interval off
//! through the [`MonitoringMode`] tiers while the value stays flat. Any change
//! snaps it straight back to `Active`.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::mode::MonitoringMode;

/// Two observations closer than this are treated as unchanged.
pub const CHANGE_EPSILON: f64 = 0.01;

/// Consecutive unchanged observations needed to leave each non-terminal tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EscalationThresholds {
    pub active: u32,
    pub idle_short: u32,
    pub idle_medium: u32,
}

impl EscalationThresholds {
    pub const DEFAULT: EscalationThresholds = EscalationThresholds {
        active: 3,
        idle_short: 6,
        idle_medium: 12,
    };

    /// Streak length required to leave `mode`; `None` for the terminal tier.
    pub fn for_mode(&self, mode: MonitoringMode) -> Option<u32> {
        match mode {
            MonitoringMode::Active => Some(self.active),
            MonitoringMode::IdleShort => Some(self.idle_short),
            MonitoringMode::IdleMedium => Some(self.idle_medium),
            MonitoringMode::IdleLong => None,
        }
    }
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Mutable controller state. Process-lifetime only, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonitoringState {
    pub current_mode: MonitoringMode,
    /// Unchanged observations seen since the last mode change.
    pub unchanged_count: u32,
    pub last_observed_value: Option<f64>,
}

/// Result of feeding one value to [`AdaptiveRefreshController::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub mode: MonitoringMode,
    pub interval: Duration,
    /// The caller must re-arm its timer when this is set.
    pub mode_changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveRefreshController {
    state: MonitoringState,
    thresholds: EscalationThresholds,
}

impl AdaptiveRefreshController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller with a substitute escalation table.
    pub fn with_thresholds(thresholds: EscalationThresholds) -> Self {
        Self {
            state: MonitoringState::default(),
            thresholds,
        }
    }

    pub fn state(&self) -> &MonitoringState {
        &self.state
    }

    pub fn thresholds(&self) -> &EscalationThresholds {
        &self.thresholds
    }

    pub fn mode(&self) -> MonitoringMode {
        self.state.current_mode
    }

    pub fn interval(&self) -> Duration {
        self.state.current_mode.interval()
    }

    /// Feed the latest usage percentage and get the interval for the next poll.
    ///
    /// The first value only establishes a baseline. Non-finite values are
    /// ignored and leave the state untouched.
    pub fn observe(&mut self, value: f64) -> Observation {
        let previous = self.state.current_mode;

        if !value.is_finite() {
            debug!(event = "core.refresh.non_finite_ignored", value = value);
            return self.observation(false);
        }

        let Some(last) = self.state.last_observed_value else {
            self.state.last_observed_value = Some(value);
            debug!(event = "core.refresh.baseline_set", value = value);
            return self.observation(false);
        };

        if (value - last).abs() > CHANGE_EPSILON {
            self.state.current_mode = MonitoringMode::Active;
            self.state.unchanged_count = 0;
        } else {
            self.state.unchanged_count = self.state.unchanged_count.saturating_add(1);
            if let Some(threshold) = self.thresholds.for_mode(previous)
                && self.state.unchanged_count >= threshold
                && let Some(next) = previous.next()
            {
                self.state.current_mode = next;
                self.state.unchanged_count = 0;
            }
        }

        self.state.last_observed_value = Some(value);

        let mode_changed = self.state.current_mode != previous;
        if mode_changed {
            info!(
                event = "core.refresh.mode_changed",
                from = %previous,
                to = %self.state.current_mode,
                interval_secs = self.state.current_mode.interval_secs(),
            );
        }
        self.observation(mode_changed)
    }

    /// Jump to `Active` after user interaction. Keeps the last observed value.
    pub fn force_active(&mut self) -> Duration {
        if self.state.current_mode != MonitoringMode::Active {
            info!(
                event = "core.refresh.forced_active",
                from = %self.state.current_mode,
            );
        }
        self.state.current_mode = MonitoringMode::Active;
        self.state.unchanged_count = 0;
        self.interval()
    }

    /// Forget everything, including the baseline value.
    pub fn reset(&mut self) {
        debug!(event = "core.refresh.reset");
        self.state = MonitoringState::default();
    }

    fn observation(&self, mode_changed: bool) -> Observation {
        Observation {
            mode: self.state.current_mode,
            interval: self.interval(),
            mode_changed,
        }
    }
}
