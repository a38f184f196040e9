//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.gauge/config.toml`, or the file named by `$GAUGE_CONFIG`
//! 3. **Project config** - `./.gauge/config.toml`
//! 4. **CLI arguments** - Command-line flags (highest priority, applied by the CLI)

use std::fs;
use std::path::{Path, PathBuf};

use gauge_paths::GaugePaths;
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::GaugeConfig;
use crate::validation::validate_config;

/// Environment variable that replaces the user config location.
pub const CONFIG_ENV_VAR: &str = "GAUGE_CONFIG";

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a present file fails to parse or the merged result fails
/// validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<GaugeConfig, ConfigError> {
    let user_path = user_config_path()?;
    let project_path = std::env::current_dir()
        .ok()
        .map(|dir| GaugePaths::project_config(&dir));
    load_hierarchy_from(&user_path, project_path.as_deref())
}

/// Load and merge the given user and project files over the defaults.
pub fn load_hierarchy_from(
    user_path: &Path,
    project_path: Option<&Path>,
) -> Result<GaugeConfig, ConfigError> {
    let mut config = GaugeConfig::default();

    if let Some(user_config) = load_config_file(user_path)? {
        config = GaugeConfig::merge(&config, &user_config);
    }

    if let Some(path) = project_path
        && let Some(project_config) = load_config_file(path)?
    {
        config = GaugeConfig::merge(&config, &project_config);
    }

    validate_config(&config)?;

    Ok(config)
}

fn user_config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR)
        && !explicit.is_empty()
    {
        return Ok(PathBuf::from(explicit));
    }
    Ok(GaugePaths::resolve()?.user_config())
}

/// Load a configuration file. Returns `Ok(None)` when the file does not exist.
fn load_config_file(path: &Path) -> Result<Option<GaugeConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(event = "config.load.file_missing", path = %path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let config = toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    debug!(event = "config.load.file_loaded", path = %path.display());
    Ok(Some(config))
}
