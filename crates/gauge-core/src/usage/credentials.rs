//! OAuth token lookup for the Claude usage API.
//!
//! Token sources, first hit wins:
//! 1. `$GAUGE_OAUTH_TOKEN`
//! 2. macOS Keychain item written by Claude Code (via the `security` CLI)
//! 3. `~/.claude/.credentials.json`

use std::path::PathBuf;

use gauge_paths::GaugePaths;
use serde::Deserialize;
use tracing::debug;

use super::errors::CredentialsError;

pub const TOKEN_ENV_VAR: &str = "GAUGE_OAUTH_TOKEN";

/// Keychain service name used by Claude Code.
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// OAuth credentials structure from Claude Code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaudeCredentials {
    claude_ai_oauth: Option<OAuthCredentials>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuthCredentials {
    access_token: String,
    /// Milliseconds since the Unix epoch.
    expires_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials_file: PathBuf,
    use_keychain: bool,
    use_env: bool,
}

impl CredentialStore {
    /// Store that checks every source in order.
    pub fn new(paths: &GaugePaths) -> Self {
        Self {
            credentials_file: paths.claude_credentials_file(),
            use_keychain: cfg!(target_os = "macos"),
            use_env: true,
        }
    }

    /// Store that only reads the given credentials file. Use in tests.
    pub fn file_only(credentials_file: PathBuf) -> Self {
        Self {
            credentials_file,
            use_keychain: false,
            use_env: false,
        }
    }

    /// Resolve the current OAuth access token.
    pub async fn oauth_token(&self) -> Result<String, CredentialsError> {
        if self.use_env
            && let Some(token) = token_from_env()
        {
            debug!(event = "core.credentials.source_selected", source = "env");
            return Ok(token);
        }

        if self.use_keychain {
            match read_keychain().await {
                Ok(json) => {
                    debug!(event = "core.credentials.source_selected", source = "keychain");
                    return parse_credentials_json(&json, now_millis());
                }
                Err(e) => {
                    debug!(event = "core.credentials.keychain_unavailable", error = %e);
                }
            }
        }

        let content = match tokio::fs::read_to_string(&self.credentials_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialsError::NotFound {
                    searched: self.searched_locations(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        debug!(
            event = "core.credentials.source_selected",
            source = "file",
            path = %self.credentials_file.display()
        );
        parse_credentials_json(&content, now_millis())
    }

    /// Check whether a usable token is available, without returning it.
    pub async fn has_credentials(&self) -> bool {
        self.oauth_token().await.is_ok()
    }

    fn searched_locations(&self) -> String {
        let mut searched = Vec::new();
        if self.use_env {
            searched.push(format!("${TOKEN_ENV_VAR}"));
        }
        if self.use_keychain {
            searched.push(format!("Keychain '{KEYCHAIN_SERVICE}'"));
        }
        searched.push(self.credentials_file.display().to_string());
        searched.join(", ")
    }
}

fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn read_keychain() -> Result<String, CredentialsError> {
    let output = tokio::process::Command::new("security")
        .args(["find-generic-password", "-s", KEYCHAIN_SERVICE, "-w"])
        .output()
        .await
        .map_err(|e| CredentialsError::Keychain {
            message: format!("failed to execute security command: {e}"),
        })?;

    if !output.status.success() {
        return Err(CredentialsError::Keychain {
            message: "keychain item not found".to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| CredentialsError::Keychain {
        message: format!("invalid UTF-8 in keychain data: {e}"),
    })
}

/// Extract the access token, rejecting tokens whose `expiresAt` has passed.
fn parse_credentials_json(json: &str, now_ms: i64) -> Result<String, CredentialsError> {
    let creds: ClaudeCredentials =
        serde_json::from_str(json.trim()).map_err(|e| CredentialsError::Parse {
            message: e.to_string(),
        })?;

    let oauth = creds.claude_ai_oauth.ok_or(CredentialsError::MissingOAuth)?;
    if let Some(expires_at) = oauth.expires_at
        && expires_at <= now_ms
    {
        return Err(CredentialsError::Expired);
    }
    Ok(oauth.access_token)
}
