use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found; set $HOME")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.gauge/` directory layout and the
/// Claude Code files gauge reads from `~/.claude/`.
///
/// Use `resolve()` in production code and `from_dirs()` in tests.
#[derive(Debug, Clone)]
pub struct GaugePaths {
    gauge_dir: PathBuf,
    claude_dir: PathBuf,
}

impl GaugePaths {
    /// Resolve paths from the user's home directory (`~/.gauge`, `~/.claude`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            gauge_dir: home.join(".gauge"),
            claude_dir: home.join(".claude"),
        })
    }

    /// Create paths from explicit base directories. Use in tests.
    pub fn from_dirs(gauge_dir: PathBuf, claude_dir: PathBuf) -> Self {
        Self {
            gauge_dir,
            claude_dir,
        }
    }

    /// The base `~/.gauge` directory.
    pub fn gauge_dir(&self) -> &Path {
        &self.gauge_dir
    }

    /// The Claude Code `~/.claude` directory.
    pub fn claude_dir(&self) -> &Path {
        &self.claude_dir
    }

    pub fn history_dir(&self) -> PathBuf {
        self.gauge_dir.join("history")
    }

    pub fn user_config(&self) -> PathBuf {
        self.gauge_dir.join("config.toml")
    }

    /// OAuth credentials written by Claude Code when the Keychain is unavailable.
    pub fn claude_credentials_file(&self) -> PathBuf {
        self.claude_dir.join(".credentials.json")
    }

    /// Project-level config: `<project_root>/.gauge/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".gauge").join("config.toml")
    }
}
