use chrono::Local;
use clap::ArgMatches;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use gauge_config::{ALLOWED_FIXED_INTERVALS, GaugeConfig, RefreshMode, UsageMetric};
use gauge_core::history::{self, UsageRecord};
use gauge_core::scheduler::shutdown::wait_for_shutdown_signal;
use gauge_core::{
    MonitoringMode, PollScheduler, RefreshPolicy, SchedulerCommand, SchedulerConfig,
    SchedulerEvent, UsageClient, UsageSnapshot, events,
};

use super::helpers::{
    build_client, build_runtime, colored_percentage, format_interval, load_config_with_warning,
    print_json_error, resolve_metric,
};
use crate::color;

/// One line of `watch --json` output.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WatchLine<'a> {
    Updated {
        metric: UsageMetric,
        percentage: Option<f64>,
        mode: Option<MonitoringMode>,
        interval_secs: u64,
        usage: &'a UsageSnapshot,
    },
    Rescheduled {
        mode: Option<MonitoringMode>,
        interval_secs: u64,
    },
    FetchFailed {
        error: &'a str,
        code: &'a str,
    },
}

pub(crate) fn handle_watch_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let mut config = load_config_with_warning();
    apply_refresh_overrides(matches, &mut config);

    if let Err(e) = config.validate() {
        events::log_app_error(&e);
        if json_output {
            return Err(print_json_error(&e, "INVALID_CONFIGURATION"));
        }
        eprintln!("{} {}", color::error("Invalid configuration:"), e);
        return Err(e.into());
    }

    let metric = resolve_metric(matches, &config);

    info!(
        event = "cli.watch_started",
        metric = %metric,
        mode = %config.refresh.mode(),
        json_output = json_output
    );

    let client = build_client(&config)?;
    let runtime = build_runtime()?;
    let result = runtime.block_on(run_watch(client, &config, metric, json_output));

    // The stdin reader sits on a blocking thread that never returns on its own.
    runtime.shutdown_background();

    match &result {
        Ok(()) => info!(event = "cli.watch_completed"),
        Err(e) => error!(event = "cli.watch_failed", error = %e),
    }
    result
}

/// `--fixed SECS` and `--smart` override `[refresh] mode`.
fn apply_refresh_overrides(matches: &ArgMatches, config: &mut GaugeConfig) {
    if let Some(secs) = matches.get_one::<u64>("fixed") {
        config.refresh.mode = Some(RefreshMode::Fixed);
        config.refresh.fixed_interval_secs = Some(*secs);
    } else if matches.get_flag("smart") {
        config.refresh.mode = Some(RefreshMode::Smart);
    }
}

async fn run_watch(
    client: UsageClient,
    config: &GaugeConfig,
    metric: UsageMetric,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.history.enabled()
        && let Err(e) = history::cleanup_old_history(config.history.retention_days())
    {
        warn!(event = "cli.watch_history_cleanup_failed", error = %e);
    }

    let shutdown = CancellationToken::new();
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (ev_tx, mut ev_rx) = mpsc::channel(32);

    let scheduler = PollScheduler::new(
        client,
        RefreshPolicy::from_config(&config.refresh),
        SchedulerConfig::new(metric, &config.refresh),
    );
    let scheduler_task = tokio::spawn(scheduler.run(cmd_rx, ev_tx, shutdown.clone()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal(signal_token).await {
            error!(event = "cli.watch_signal_handler_failed", error = %e);
        }
    });

    tokio::spawn(forward_console_commands(cmd_tx.clone(), json_output));

    if !json_output {
        println!(
            "{}",
            color::hint(
                "Watching Claude usage. Enter refreshes, 'smart' or 'fixed SECS' switches mode, Ctrl+C exits."
            )
        );
    }

    while let Some(event) = ev_rx.recv().await {
        if json_output {
            print_json_line(&event, metric)?;
        } else {
            print_event(&event, metric, config);
        }

        if config.history.enabled()
            && let SchedulerEvent::Updated {
                snapshot,
                interval,
                mode,
                ..
            } = &event
            && let Err(e) = history::save_record(&UsageRecord::new(snapshot, *mode, *interval))
        {
            warn!(event = "cli.watch_history_save_failed", error = %e);
        }
    }

    drop(cmd_tx);
    let policy = scheduler_task.await?;
    info!(
        event = "cli.watch_stopped",
        final_mode = ?policy.mode(),
        final_interval_secs = policy.current_interval().as_secs()
    );
    Ok(())
}

/// Turns stdin lines into scheduler commands. EOF just stops listening.
async fn forward_console_commands(commands: mpsc::Sender<SchedulerCommand>, json_output: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let command = match parse_console_command(&line) {
            Ok(command) => command,
            Err(message) => {
                warn!(event = "cli.watch_console_command_rejected", input = %line.trim());
                if !json_output {
                    eprintln!("{} {}", color::warning("Ignored:"), message);
                }
                continue;
            }
        };
        if commands.send(command).await.is_err() {
            break;
        }
    }
}

/// An empty line (or `r`) refreshes now. `smart` and `fixed [SECS]` switch the
/// refresh preference; `fixed` alone keeps the configured interval.
fn parse_console_command(line: &str) -> Result<SchedulerCommand, String> {
    let mut words = line.split_whitespace();
    let command = match (words.next(), words.next()) {
        (None | Some("r" | "refresh"), None) => SchedulerCommand::RefreshNow,
        (Some("s" | "smart"), None) => SchedulerCommand::SetPreference {
            mode: RefreshMode::Smart,
            fixed_interval_secs: None,
        },
        (Some("f" | "fixed"), secs) => {
            let fixed_interval_secs = match secs {
                None => None,
                Some(raw) => match raw.parse::<u64>() {
                    Ok(secs) if ALLOWED_FIXED_INTERVALS.contains(&secs) => Some(secs),
                    _ => {
                        return Err(format!(
                            "'{raw}' is not an allowed fixed interval (one of {ALLOWED_FIXED_INTERVALS:?})"
                        ));
                    }
                },
            };
            SchedulerCommand::SetPreference {
                mode: RefreshMode::Fixed,
                fixed_interval_secs,
            }
        }
        _ => return Err(format!("unknown command '{}'", line.trim())),
    };
    if words.next().is_some() {
        return Err(format!("unknown command '{}'", line.trim()));
    }
    Ok(command)
}

fn print_event(event: &SchedulerEvent, metric: UsageMetric, config: &GaugeConfig) {
    let now = Local::now().format("%H:%M:%S").to_string();
    let stamp = color::muted(&now);

    match event {
        SchedulerEvent::Updated {
            snapshot,
            percentage,
            interval,
            mode,
        } => {
            let value = match percentage {
                Some(p) => colored_percentage(*p, config),
                None => color::muted("n/a"),
            };
            let others: Vec<String> = snapshot
                .windows()
                .into_iter()
                .filter(|(m, _)| *m != metric)
                .map(|(m, w)| format!("{m} {:.1}%", w.percentage()))
                .collect();
            let others = if others.is_empty() {
                String::new()
            } else {
                format!("  {}", color::muted(&others.join("  ")))
            };

            let schedule = format!(
                "[{}, next in {}]",
                mode_label(*mode),
                format_interval(*interval)
            );
            println!(
                "{stamp} {} {value}{others}  {}",
                color::accent(metric.as_str()),
                color::muted(&schedule)
            );
        }
        SchedulerEvent::Rescheduled { interval, mode } => {
            let label = match mode {
                Some(m) => color::mode(*m),
                None => color::muted("fixed"),
            };
            println!(
                "{stamp} {} {label}, polling every {}",
                color::muted("interval ->"),
                format_interval(*interval)
            );
        }
        SchedulerEvent::FetchFailed { message, .. } => {
            eprintln!(
                "{} {} {}",
                color::hint(&now),
                color::error("fetch failed:"),
                message
            );
        }
    }
}

fn mode_label(mode: Option<MonitoringMode>) -> &'static str {
    mode.map(|m| m.as_str()).unwrap_or("fixed")
}

fn print_json_line(event: &SchedulerEvent, metric: UsageMetric) -> serde_json::Result<()> {
    let line = match event {
        SchedulerEvent::Updated {
            snapshot,
            percentage,
            interval,
            mode,
        } => WatchLine::Updated {
            metric,
            percentage: *percentage,
            mode: *mode,
            interval_secs: interval.as_secs(),
            usage: snapshot,
        },
        SchedulerEvent::Rescheduled { interval, mode } => WatchLine::Rescheduled {
            mode: *mode,
            interval_secs: interval.as_secs(),
        },
        SchedulerEvent::FetchFailed { message, code } => WatchLine::FetchFailed {
            error: message,
            code,
        },
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_cli;

    fn watch_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["gauge", "watch"];
        argv.extend_from_slice(args);
        build_cli()
            .try_get_matches_from(argv)
            .unwrap()
            .subcommand_matches("watch")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_fixed_flag_overrides_mode() {
        let mut config = GaugeConfig::default();
        apply_refresh_overrides(&watch_matches(&["--fixed", "600"]), &mut config);
        assert_eq!(config.refresh.mode(), RefreshMode::Fixed);
        assert_eq!(config.refresh.fixed_interval_secs(), 600);
    }

    #[test]
    fn test_smart_flag_overrides_fixed_config() {
        let mut config = GaugeConfig::default();
        config.refresh.mode = Some(RefreshMode::Fixed);
        apply_refresh_overrides(&watch_matches(&["--smart"]), &mut config);
        assert_eq!(config.refresh.mode(), RefreshMode::Smart);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = GaugeConfig::default();
        config.refresh.mode = Some(RefreshMode::Fixed);
        apply_refresh_overrides(&watch_matches(&[]), &mut config);
        assert_eq!(config.refresh.mode(), RefreshMode::Fixed);
    }

    #[test]
    fn test_console_refresh_commands() {
        for line in ["", "   ", "r", "refresh"] {
            assert_eq!(
                parse_console_command(line),
                Ok(SchedulerCommand::RefreshNow),
                "line {line:?}"
            );
        }
    }

    #[test]
    fn test_console_preference_commands() {
        assert_eq!(
            parse_console_command("smart"),
            Ok(SchedulerCommand::SetPreference {
                mode: RefreshMode::Smart,
                fixed_interval_secs: None,
            })
        );
        assert_eq!(
            parse_console_command(" fixed 600 "),
            Ok(SchedulerCommand::SetPreference {
                mode: RefreshMode::Fixed,
                fixed_interval_secs: Some(600),
            })
        );
        assert_eq!(
            parse_console_command("f"),
            Ok(SchedulerCommand::SetPreference {
                mode: RefreshMode::Fixed,
                fixed_interval_secs: None,
            })
        );
    }

    #[test]
    fn test_console_rejects_bad_input() {
        assert!(parse_console_command("fixed 90").unwrap_err().contains("'90'"));
        assert!(parse_console_command("fixed soon").is_err());
        assert!(parse_console_command("fixed 60 now").is_err());
        assert!(parse_console_command("smart please").is_err());
        assert!(parse_console_command("quit").is_err());
    }

    #[test]
    fn test_mode_label() {
        assert_eq!(mode_label(None), "fixed");
        assert_eq!(mode_label(Some(MonitoringMode::IdleMedium)), "idle_medium");
    }

    #[test]
    fn test_json_line_shape() {
        let line = WatchLine::Rescheduled {
            mode: Some(MonitoringMode::IdleShort),
            interval_secs: 180,
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["type"], "rescheduled");
        assert_eq!(value["mode"], "idle_short");
        assert_eq!(value["interval_secs"], 180);
    }
}
