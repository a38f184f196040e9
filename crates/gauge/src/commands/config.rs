use clap::ArgMatches;
use tracing::info;

use super::helpers::load_config_with_warning;

pub(crate) fn handle_config_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = load_config_with_warning().resolved();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
    }

    info!(event = "cli.config_completed", json_output = json_output);
    Ok(())
}
