use clap::{Arg, ArgAction, Command};
use gauge_config::{ALLOWED_FIXED_INTERVALS, MAX_HISTORY_DAYS, UsageMetric};

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

fn metric_arg() -> Arg {
    Arg::new("metric")
        .long("metric")
        .short('m')
        .help("Usage window that drives the headline figure (default from config)")
        .value_parser(|s: &str| s.parse::<UsageMetric>())
}

pub fn status_command() -> Command {
    Command::new("status")
        .about("Fetch current usage once and print it")
        .arg(json_arg())
        .arg(metric_arg())
}

pub fn watch_command() -> Command {
    Command::new("watch")
        .about("Poll usage continuously, adapting the interval to activity")
        .long_about("Poll usage continuously. In smart mode the interval starts at 60s and backs off to 180s, 300s and 600s while usage stays flat, snapping back to 60s as soon as it moves. Press Enter to refresh immediately; Ctrl+C exits.")
        .arg(json_arg())
        .arg(metric_arg())
        .arg(
            Arg::new("fixed")
                .long("fixed")
                .help(format!(
                    "Poll at a fixed interval in seconds ({})",
                    allowed_intervals()
                ))
                .value_parser(parse_fixed_interval)
                .conflicts_with("smart"),
        )
        .arg(
            Arg::new("smart")
                .long("smart")
                .help("Use adaptive polling even if config selects fixed mode")
                .action(ArgAction::SetTrue),
        )
}

pub fn history_command() -> Command {
    Command::new("history")
        .about("Show usage recorded by 'gauge watch'")
        .arg(
            Arg::new("days")
                .long("days")
                .short('d')
                .help("How many days back to show")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_HISTORY_DAYS))
                .default_value("1"),
        )
        .arg(json_arg())
        .subcommand(Command::new("clean").about("Delete history older than the retention window"))
}

fn allowed_intervals() -> String {
    ALLOWED_FIXED_INTERVALS
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_fixed_interval(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if ALLOWED_FIXED_INTERVALS.contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("must be one of {}", allowed_intervals()))
    }
}
