//! Built-in fallback values for every optional config field.

pub const FIXED_INTERVAL_SECS: u64 = 300;
pub const MIN_MANUAL_INTERVAL_SECS: u64 = 5;

pub const API_BASE_URL: &str = "https://api.anthropic.com";
/// Matches the Claude Code client so the OAuth endpoint accepts the token.
pub const USER_AGENT: &str = "claude-code/2.0.31";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const RESOURCE_TIMEOUT_SECS: u64 = 60;

pub const WARNING_THRESHOLD: f64 = 70.0;
pub const CRITICAL_THRESHOLD: f64 = 90.0;

pub const HISTORY_RETENTION_DAYS: u64 = 30;
