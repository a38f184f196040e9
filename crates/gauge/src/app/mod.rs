mod global;
mod misc;
mod usage;


use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(usage::status_command())
        .subcommand(usage::watch_command())
        .subcommand(usage::history_command())
        .subcommand(misc::config_command())
        .subcommand(misc::completions_command())
}
