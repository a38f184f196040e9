//! Poll scheduler.
//!
//! Owns the refresh policy and a single timer. Each tick fetches usage, feeds
//! the percentage to the policy, and re-arms the timer with whatever interval
//! the policy now reports. All access to the adaptive controller happens on
//! this one task; other parties talk to it through [`SchedulerCommand`]s and
//! listen to [`SchedulerEvent`]s.

pub mod shutdown;

use std::time::Duration;

use gauge_config::{RefreshConfig, RefreshMode, UsageMetric};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::GaugeError;
use crate::refresh::{MonitoringMode, RefreshPolicy};
use crate::usage::{UsageSnapshot, UsageSource};

/// Requests sent to a running scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    /// User wants fresh data now.
    RefreshNow,
    /// Switch between smart and fixed refresh.
    SetPreference {
        mode: RefreshMode,
        fixed_interval_secs: Option<u64>,
    },
    Shutdown,
}

/// Notifications emitted by a running scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    Updated {
        snapshot: UsageSnapshot,
        /// Value of the configured metric, if the response carried it.
        percentage: Option<f64>,
        interval: Duration,
        mode: Option<MonitoringMode>,
    },
    /// The timer was re-armed with a new interval.
    Rescheduled {
        interval: Duration,
        mode: Option<MonitoringMode>,
    },
    FetchFailed {
        message: String,
        code: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    /// Events went out; `rescheduled` is set when a `Rescheduled` was among them.
    Delivered { rescheduled: bool },
    /// The event receiver is gone.
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub metric: UsageMetric,
    /// Manual refreshes closer than this to the previous fetch skip the fetch.
    pub min_manual_interval: Duration,
}

impl SchedulerConfig {
    pub fn new(metric: UsageMetric, refresh: &RefreshConfig) -> Self {
        Self {
            metric,
            min_manual_interval: Duration::from_secs(refresh.min_manual_interval_secs()),
        }
    }
}

pub struct PollScheduler<S> {
    source: S,
    policy: RefreshPolicy,
    config: SchedulerConfig,
    last_fetch: Option<Instant>,
}

impl<S: UsageSource> PollScheduler<S> {
    pub fn new(source: S, policy: RefreshPolicy, config: SchedulerConfig) -> Self {
        Self {
            source,
            policy,
            config,
            last_fetch: None,
        }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Run until shutdown. Fetches immediately, then on every timer expiry.
    ///
    /// Exits when the token is cancelled, a `Shutdown` command arrives, the
    /// command channel closes, or nobody is listening for events any more.
    /// Returns the final policy so callers can inspect it.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SchedulerCommand>,
        events: mpsc::Sender<SchedulerEvent>,
        shutdown: CancellationToken,
    ) -> RefreshPolicy {
        info!(
            event = "core.scheduler.started",
            preference = %self.policy.preference(),
            interval_secs = self.policy.current_interval().as_secs(),
        );

        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(event = "core.scheduler.cancelled");
                    break;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    if self.tick(&events).await == TickOutcome::Closed {
                        break;
                    }
                    deadline = Instant::now() + self.policy.current_interval();
                }
                command = commands.recv() => match command {
                    None | Some(SchedulerCommand::Shutdown) => break,
                    Some(SchedulerCommand::RefreshNow) => {
                        let rearm = self.policy.on_manual_refresh();
                        if self.within_manual_debounce() {
                            debug!(event = "core.scheduler.manual_refresh_debounced");
                            if rearm {
                                deadline = self.last_fetch.unwrap_or_else(Instant::now)
                                    + self.policy.current_interval();
                                if !self.emit_rescheduled(&events).await {
                                    break;
                                }
                            }
                            continue;
                        }
                        info!(event = "core.scheduler.manual_refresh");
                        let TickOutcome::Delivered { rescheduled } = self.tick(&events).await else {
                            break;
                        };
                        deadline = Instant::now() + self.policy.current_interval();
                        if rearm && !rescheduled && !self.emit_rescheduled(&events).await {
                            break;
                        }
                    }
                    Some(SchedulerCommand::SetPreference { mode, fixed_interval_secs }) => {
                        self.policy.set_preference(mode, fixed_interval_secs);
                        deadline = Instant::now() + self.policy.current_interval();
                        if !self.emit_rescheduled(&events).await {
                            break;
                        }
                    }
                },
            }
        }

        info!(event = "core.scheduler.stopped");
        self.policy
    }

    /// One fetch-and-update cycle.
    async fn tick(&mut self, events: &mpsc::Sender<SchedulerEvent>) -> TickOutcome {
        let result = self.source.fetch().await;
        self.last_fetch = Some(Instant::now());

        match result {
            Ok(snapshot) => {
                let percentage = snapshot.percentage(self.config.metric);
                let rearm = match percentage {
                    Some(value) => self.policy.on_observation(value),
                    None => {
                        debug!(
                            event = "core.scheduler.metric_missing",
                            metric = %self.config.metric
                        );
                        false
                    }
                };

                let updated = SchedulerEvent::Updated {
                    snapshot,
                    percentage,
                    interval: self.policy.current_interval(),
                    mode: self.policy.mode(),
                };
                if events.send(updated).await.is_err() {
                    return TickOutcome::Closed;
                }
                if rearm && !self.emit_rescheduled(events).await {
                    return TickOutcome::Closed;
                }
                TickOutcome::Delivered { rescheduled: rearm }
            }
            Err(e) => {
                // Failed fetches never reach the controller.
                warn!(
                    event = "core.scheduler.fetch_failed",
                    error = %e,
                    code = e.error_code()
                );
                let failed = SchedulerEvent::FetchFailed {
                    message: e.to_string(),
                    code: e.error_code(),
                };
                if events.send(failed).await.is_err() {
                    return TickOutcome::Closed;
                }
                TickOutcome::Delivered { rescheduled: false }
            }
        }
    }

    async fn emit_rescheduled(&self, events: &mpsc::Sender<SchedulerEvent>) -> bool {
        let interval = self.policy.current_interval();
        info!(
            event = "core.scheduler.rescheduled",
            interval_secs = interval.as_secs(),
            mode = ?self.policy.mode(),
        );
        events
            .send(SchedulerEvent::Rescheduled {
                interval,
                mode: self.policy.mode(),
            })
            .await
            .is_ok()
    }

    fn within_manual_debounce(&self) -> bool {
        self.last_fetch
            .is_some_and(|at| at.elapsed() < self.config.min_manual_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{UsageError, UsageWindow};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results; repeats the last one when the script runs out.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<f64, ()>>>,
        last: Mutex<Result<f64, ()>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<f64, ()>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(Ok(0.0)),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl UsageSource for &ScriptedSource {
        async fn fetch(&self) -> Result<UsageSnapshot, UsageError> {
            self.calls.lock().unwrap().push(Instant::now());
            let next = {
                let mut script = self.script.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                if let Some(next) = script.pop_front() {
                    *last = next;
                }
                *last
            };
            match next {
                Ok(value) => Ok(UsageSnapshot {
                    five_hour: Some(UsageWindow {
                        utilization: value,
                        resets_at: None,
                    }),
                    seven_day: None,
                    seven_day_opus: None,
                    seven_day_sonnet: None,
                    fetched_at: chrono::Utc::now(),
                }),
                Err(()) => Err(UsageError::Network {
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            metric: UsageMetric::FiveHour,
            min_manual_interval: Duration::from_secs(5),
        }
    }

    fn gaps(calls: &[Instant]) -> Vec<u64> {
        calls
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_secs())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_backs_off_while_flat() {
        let source = ScriptedSource::new(vec![Ok(50.0)]);
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        let stop = shutdown.clone();
        let handle = async move { scheduler.run(cmd_rx, ev_tx, shutdown).await };
        let driver = async move {
            let mut rescheduled = Vec::new();
            while let Some(event) = ev_rx.recv().await {
                if let SchedulerEvent::Rescheduled { interval, mode } = event {
                    rescheduled.push((interval.as_secs(), mode));
                    if rescheduled.len() == 2 {
                        stop.cancel();
                        break;
                    }
                }
            }
            rescheduled
        };

        let (policy, rescheduled) = tokio::join!(handle, driver);
        assert_eq!(
            rescheduled,
            vec![
                (180, Some(MonitoringMode::IdleShort)),
                (300, Some(MonitoringMode::IdleMedium)),
            ]
        );
        assert_eq!(policy.mode(), Some(MonitoringMode::IdleMedium));

        // Baseline + 3 unchanged at 60s, then 6 unchanged at 180s
        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(gaps(&calls), vec![60, 60, 60, 180, 180, 180, 180, 180, 180]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_snaps_back_to_active() {
        let source = ScriptedSource::new(vec![Ok(10.0), Ok(10.0), Ok(10.0), Ok(10.0), Ok(30.0)]);
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        let driver = async move {
            let mut modes = Vec::new();
            while let Some(event) = ev_rx.recv().await {
                if let SchedulerEvent::Rescheduled { mode, .. } = event {
                    modes.push(mode);
                    if modes.len() == 2 {
                        stop.cancel();
                        break;
                    }
                }
            }
            modes
        };

        let (_, modes) = tokio::join!(scheduler.run(cmd_rx, ev_tx, shutdown), driver);
        assert_eq!(
            modes,
            vec![Some(MonitoringMode::IdleShort), Some(MonitoringMode::Active)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_leaves_controller_untouched() {
        let source = ScriptedSource::new(vec![Ok(40.0), Err(()), Err(()), Err(()), Err(())]);
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        let driver = async move {
            let mut failures = 0;
            while let Some(event) = ev_rx.recv().await {
                match event {
                    SchedulerEvent::FetchFailed { code, .. } => {
                        assert_eq!(code, "USAGE_NETWORK_ERROR");
                        failures += 1;
                        if failures == 4 {
                            stop.cancel();
                            break;
                        }
                    }
                    SchedulerEvent::Rescheduled { .. } => panic!("failures must not reschedule"),
                    SchedulerEvent::Updated { .. } => {}
                }
            }
            failures
        };

        let (policy, failures) = tokio::join!(scheduler.run(cmd_rx, ev_tx, shutdown), driver);
        assert_eq!(failures, 4);
        let state = policy.controller().state();
        assert_eq!(state.current_mode, MonitoringMode::Active);
        assert_eq!(state.unchanged_count, 0);
        assert_eq!(state.last_observed_value, Some(40.0));

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(gaps(&calls), vec![60, 60, 60, 60]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_mode_polls_at_constant_interval() {
        let source = ScriptedSource::new(vec![Ok(5.0)]);
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Fixed, 180),
            config(),
        );
        let driver = async move {
            let mut updates = 0;
            while let Some(event) = ev_rx.recv().await {
                match event {
                    SchedulerEvent::Updated { mode, interval, .. } => {
                        assert_eq!(mode, None);
                        assert_eq!(interval, Duration::from_secs(180));
                        updates += 1;
                        if updates == 6 {
                            stop.cancel();
                            break;
                        }
                    }
                    other => panic!("unexpected event {other:?}"),
                }
            }
        };

        tokio::join!(scheduler.run(cmd_rx, ev_tx, shutdown), driver);
        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(gaps(&calls), vec![180; 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_fetches_and_forces_active() {
        let source = ScriptedSource::new(vec![Ok(70.0)]);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        let driver = async move {
            // Wait until the scheduler has backed off to IdleShort
            while let Some(event) = ev_rx.recv().await {
                if let SchedulerEvent::Rescheduled { .. } = event {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_secs(30)).await;
            cmd_tx.send(SchedulerCommand::RefreshNow).await.unwrap();

            let mut seen = Vec::new();
            while let Some(event) = ev_rx.recv().await {
                match event {
                    SchedulerEvent::Updated { mode, .. } => seen.push(("updated", mode)),
                    SchedulerEvent::Rescheduled { interval, mode } => {
                        assert_eq!(interval, Duration::from_secs(60));
                        seen.push(("rescheduled", mode));
                        cmd_tx.send(SchedulerCommand::Shutdown).await.unwrap();
                    }
                    SchedulerEvent::FetchFailed { .. } => panic!("unexpected failure"),
                }
            }
            seen
        };

        let (_, seen) = tokio::join!(scheduler.run(cmd_rx, ev_tx, shutdown), driver);
        // Manual fetch observed after force_active: same value, so one unchanged
        // observation in Active, then the drop out of IdleShort is announced.
        assert_eq!(
            seen,
            vec![
                ("updated", Some(MonitoringMode::Active)),
                ("rescheduled", Some(MonitoringMode::Active)),
            ]
        );

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(gaps(&calls), vec![60, 60, 60, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_is_debounced() {
        let source = ScriptedSource::new(vec![Ok(1.0)]);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        let driver = async move {
            // First fetch happens immediately at start
            ev_rx.recv().await;
            cmd_tx.send(SchedulerCommand::RefreshNow).await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            cmd_tx.send(SchedulerCommand::Shutdown).await.unwrap();
            while ev_rx.recv().await.is_some() {}
        };

        tokio::join!(scheduler.run(cmd_rx, ev_tx, shutdown), driver);
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_preference_resets_and_rearms() {
        let source = ScriptedSource::new(vec![Ok(3.0)]);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        let driver = async move {
            ev_rx.recv().await;
            cmd_tx
                .send(SchedulerCommand::SetPreference {
                    mode: RefreshMode::Fixed,
                    fixed_interval_secs: Some(600),
                })
                .await
                .unwrap();

            let mut rescheduled = None;
            while let Some(event) = ev_rx.recv().await {
                if let SchedulerEvent::Rescheduled { interval, mode } = event {
                    rescheduled = Some((interval, mode));
                    cmd_tx.send(SchedulerCommand::Shutdown).await.unwrap();
                }
            }
            rescheduled
        };

        let (policy, rescheduled) = tokio::join!(scheduler.run(cmd_rx, ev_tx, shutdown), driver);
        assert_eq!(rescheduled, Some((Duration::from_secs(600), None)));
        assert_eq!(policy.preference(), RefreshMode::Fixed);
        assert_eq!(policy.controller().state().last_observed_value, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_event_receiver_dropped() {
        let source = ScriptedSource::new(vec![Ok(1.0)]);
        let (_cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, ev_rx) = mpsc::channel(64);
        drop(ev_rx);

        let scheduler = PollScheduler::new(
            &source,
            RefreshPolicy::new(RefreshMode::Smart, 300),
            config(),
        );
        scheduler.run(cmd_rx, ev_tx, CancellationToken::new()).await;
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }
}
