use chrono::Local;
use clap::ArgMatches;
use tracing::{error, info};

use gauge_config::GaugeConfig;
use gauge_core::errors::GaugeError;
use gauge_core::history::{self, UsageRecord};
use gauge_core::{UsageLevel, events};

use super::helpers::{format_percentage, load_config_with_warning, print_json_error};
use crate::color;

pub(crate) fn handle_history_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning();

    if matches.subcommand_matches("clean").is_some() {
        return handle_clean(&config);
    }

    let days = *matches.get_one::<u64>("days").unwrap_or(&1);
    let json_output = matches.get_flag("json");

    info!(event = "cli.history_started", days = days, json_output = json_output);

    let records = match history::load_history(days) {
        Ok(records) => records,
        Err(e) => {
            error!(event = "cli.history_failed", error = %e);
            events::log_app_error(&e);
            if json_output {
                return Err(print_json_error(&e, e.error_code()));
            }
            eprintln!("{} {}", color::error("Failed to load history:"), e);
            return Err(e.into());
        }
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_records(&records, &config);
    }

    info!(event = "cli.history_completed", count = records.len());
    Ok(())
}

fn handle_clean(config: &GaugeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let retention_days = config.history.retention_days();
    info!(event = "cli.history_clean_started", retention_days = retention_days);

    match history::cleanup_old_history(retention_days) {
        Ok(result) => {
            println!(
                "Removed {} history file(s) older than {} days.",
                result.removed, retention_days
            );
            if result.failed > 0 {
                eprintln!(
                    "{} {} file(s) could not be removed.",
                    color::warning("Warning:"),
                    result.failed
                );
            }
            info!(
                event = "cli.history_clean_completed",
                removed = result.removed,
                failed = result.failed
            );
            Ok(())
        }
        Err(e) => {
            error!(event = "cli.history_clean_failed", error = %e);
            events::log_app_error(&e);
            eprintln!("{} {}", color::error("Failed to clean history:"), e);
            Err(e.into())
        }
    }
}

fn print_records(records: &[UsageRecord], config: &GaugeConfig) {
    if records.is_empty() {
        println!("No usage history recorded.");
        if !config.history.enabled() {
            println!(
                "{}",
                color::muted("History is disabled. Set [history] enabled = true to record it.")
            );
        }
        return;
    }

    println!(
        "{}",
        color::bold(&format!(
            "{:<16}  {:>9}  {:>9}  {:<11}  {:>8}",
            "Time", "5-hour", "7-day", "Mode", "Interval"
        ))
    );

    for record in records {
        let time = record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        println!(
            "{:<16}  {}  {}  {}  {:>7}s",
            time,
            cell(record.five_hour, config),
            cell(record.seven_day, config),
            color::muted(&format!(
                "{:<11}",
                record.mode.map(|m| m.as_str()).unwrap_or("fixed")
            )),
            record.interval_secs
        );
    }
}

/// Right-aligned, level-colored percentage cell.
fn cell(value: Option<f64>, config: &GaugeConfig) -> String {
    match value {
        Some(p) => {
            let level = UsageLevel::from_percentage(p, &(&config.display).into());
            color::level(&format!("{:>9}", format_percentage(p)), level)
        }
        None => color::muted(&format!("{:>9}", "-")),
    }
}
