use crate::errors::GaugeError;

/// Failures while locating the OAuth token.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error(
        "No Claude credentials found. Log in with Claude Code first, or set GAUGE_OAUTH_TOKEN.\n  \
         Looked in: {searched}"
    )]
    NotFound { searched: String },

    #[error("Failed to parse credentials JSON: {message}")]
    Parse { message: String },

    #[error("Credentials contain no claudeAiOauth entry")]
    MissingOAuth,

    #[error("OAuth token expired. Open Claude Code to refresh your login.")]
    Expired,

    #[error("Keychain lookup failed: {message}")]
    Keychain { message: String },

    #[error("IO error reading credentials: {0}")]
    Io(#[from] std::io::Error),
}

impl GaugeError for CredentialsError {
    fn error_code(&self) -> &'static str {
        match self {
            CredentialsError::NotFound { .. } => "CREDENTIALS_NOT_FOUND",
            CredentialsError::Parse { .. } => "CREDENTIALS_PARSE_ERROR",
            CredentialsError::MissingOAuth => "CREDENTIALS_MISSING_OAUTH",
            CredentialsError::Expired => "CREDENTIALS_EXPIRED",
            CredentialsError::Keychain { .. } => "CREDENTIALS_KEYCHAIN_ERROR",
            CredentialsError::Io(_) => "CREDENTIALS_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            CredentialsError::NotFound { .. }
                | CredentialsError::MissingOAuth
                | CredentialsError::Expired
        )
    }
}

/// Failures fetching usage from the API.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Usage API rejected the OAuth token (HTTP {status}). Log in to Claude Code again.")]
    Unauthorized { status: u16 },

    #[error("Usage API rate limited the request")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Usage API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Usage request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Invalid usage response: {message}")]
    InvalidResponse { message: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

impl GaugeError for UsageError {
    fn error_code(&self) -> &'static str {
        match self {
            UsageError::Credentials(inner) => inner.error_code(),
            UsageError::Unauthorized { .. } => "USAGE_UNAUTHORIZED",
            UsageError::RateLimited { .. } => "USAGE_RATE_LIMITED",
            UsageError::Api { .. } => "USAGE_API_ERROR",
            UsageError::Network { .. } => "USAGE_NETWORK_ERROR",
            UsageError::Timeout { .. } => "USAGE_TIMEOUT",
            UsageError::InvalidResponse { .. } => "USAGE_INVALID_RESPONSE",
            UsageError::ClientBuild { .. } => "USAGE_CLIENT_BUILD_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            UsageError::Credentials(inner) => inner.is_user_error(),
            UsageError::Unauthorized { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases: Vec<(UsageError, &str)> = vec![
            (UsageError::Unauthorized { status: 401 }, "USAGE_UNAUTHORIZED"),
            (
                UsageError::RateLimited {
                    retry_after_secs: Some(30),
                },
                "USAGE_RATE_LIMITED",
            ),
            (
                UsageError::Api {
                    status: 500,
                    body: "oops".to_string(),
                },
                "USAGE_API_ERROR",
            ),
            (
                UsageError::Network {
                    message: "refused".to_string(),
                },
                "USAGE_NETWORK_ERROR",
            ),
            (UsageError::Timeout { secs: 60 }, "USAGE_TIMEOUT"),
            (
                UsageError::InvalidResponse {
                    message: "eof".to_string(),
                },
                "USAGE_INVALID_RESPONSE",
            ),
            (
                UsageError::Credentials(CredentialsError::Expired),
                "CREDENTIALS_EXPIRED",
            ),
        ];

        for (err, expected_code) in cases {
            assert_eq!(err.error_code(), expected_code);
        }
    }

    #[test]
    fn test_user_error_classification() {
        assert!(UsageError::Unauthorized { status: 403 }.is_user_error());
        assert!(UsageError::Credentials(CredentialsError::MissingOAuth).is_user_error());
        assert!(
            !UsageError::Network {
                message: "x".to_string()
            }
            .is_user_error()
        );
        assert!(!UsageError::Timeout { secs: 1 }.is_user_error());
        assert!(
            !CredentialsError::Keychain {
                message: "x".to_string()
            }
            .is_user_error()
        );
    }

    #[test]
    fn test_credentials_error_is_transparent() {
        let err: UsageError = CredentialsError::Expired.into();
        assert_eq!(err.to_string(), CredentialsError::Expired.to_string());
    }
}
