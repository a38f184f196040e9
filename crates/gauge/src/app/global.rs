use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("gauge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch Claude usage limits with adaptive polling")
        .long_about("gauge reads your Claude OAuth usage (5-hour and 7-day windows) and polls it at an interval that adapts to how fast usage is moving: every minute while it changes, backing off to ten minutes while it stays flat.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
