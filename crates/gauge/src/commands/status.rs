use chrono::Utc;
use clap::ArgMatches;
use serde::Serialize;
use tracing::{error, info};

use gauge_config::{GaugeConfig, UsageMetric};
use gauge_core::errors::GaugeError;
use gauge_core::{UsageLevel, UsageSnapshot, events};

use super::helpers::{
    build_client, build_runtime, colored_percentage, format_percentage, format_remaining,
    load_config_with_warning, print_json_error, resolve_metric, usage_error_hint,
};
use crate::color;

#[derive(Serialize)]
struct StatusOutput<'a> {
    metric: UsageMetric,
    percentage: Option<f64>,
    level: Option<UsageLevel>,
    usage: &'a UsageSnapshot,
}

pub(crate) fn handle_status_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = load_config_with_warning();
    let metric = resolve_metric(matches, &config);

    info!(
        event = "cli.status_started",
        metric = %metric,
        json_output = json_output
    );

    let client = build_client(&config)?;
    let runtime = build_runtime()?;

    match runtime.block_on(client.fetch_usage()) {
        Ok(snapshot) => {
            let percentage = snapshot.percentage(metric);
            if json_output {
                let output = StatusOutput {
                    metric,
                    percentage,
                    level: percentage
                        .map(|p| UsageLevel::from_percentage(p, &(&config.display).into())),
                    usage: &snapshot,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_snapshot(&snapshot, metric, &config);
            }

            info!(
                event = "cli.status_completed",
                metric = %metric,
                percentage = ?percentage
            );
            Ok(())
        }
        Err(e) => {
            error!(event = "cli.status_failed", error = %e);
            events::log_app_error(&e);

            if json_output {
                return Err(print_json_error(&e, e.error_code()));
            }
            eprintln!("{} {}", color::error("Failed to fetch usage:"), e);
            if let Some(hint) = usage_error_hint(&e) {
                eprintln!("{}", color::hint(hint));
            }
            Err(e.into())
        }
    }
}

fn print_snapshot(snapshot: &UsageSnapshot, metric: UsageMetric, config: &GaugeConfig) {
    let now = Utc::now();

    match snapshot.percentage(metric) {
        Some(p) => println!(
            "{} {}",
            color::bold(&format!("Claude usage ({metric}):")),
            colored_percentage(p, config)
        ),
        None => println!(
            "{} {}",
            color::bold(&format!("Claude usage ({metric}):")),
            color::muted("not reported")
        ),
    }

    let windows = snapshot.windows();
    if windows.is_empty() {
        println!("{}", color::muted("No usage windows reported."));
        return;
    }

    let name_w = windows
        .iter()
        .map(|(m, _)| m.as_str().len())
        .max()
        .unwrap_or(0);

    for (window_metric, window) in windows {
        let reset = window
            .time_until_reset(now)
            .map(|d| format!("resets in {}", format_remaining(d)))
            .unwrap_or_default();
        let percentage = window.percentage();
        let level = UsageLevel::from_percentage(percentage, &(&config.display).into());
        println!(
            "  {}  {}  {}",
            color::accent(&format!("{:<name_w$}", window_metric.as_str())),
            color::level(&format!("{:>6}", format_percentage(percentage)), level),
            color::muted(&reset)
        );
    }
}
