use std::future::Future;
use std::time::Duration;

use gauge_config::ApiConfig;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use super::errors::{CredentialsError, UsageError};
use super::types::{UsageApiResponse, UsageSnapshot};

/// Path of the OAuth usage endpoint, relative to the API base URL.
pub const USAGE_API_PATH: &str = "/api/oauth/usage";

/// Beta header required for the OAuth API.
const ANTHROPIC_BETA_HEADER: &str = "anthropic-beta";
const ANTHROPIC_BETA_VALUE: &str = "oauth-2025-04-20";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce a usage snapshot. The poll scheduler only sees this.
pub trait UsageSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<UsageSnapshot, UsageError>> + Send;
}

/// HTTP client for the Claude OAuth usage endpoint.
#[derive(Debug, Clone)]
pub struct UsageClient {
    http: reqwest::Client,
    url: String,
    credentials: CredentialStore,
    request_timeout: Duration,
    resource_timeout: Duration,
}

impl UsageClient {
    pub fn new(api: &ApiConfig, credentials: CredentialStore) -> Result<Self, UsageError> {
        let request_timeout = Duration::from_secs(api.request_timeout_secs());
        let http = reqwest::Client::builder()
            .user_agent(api.user_agent())
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
            .build()
            .map_err(|e| UsageError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: format!("{}{}", api.base_url().trim_end_matches('/'), USAGE_API_PATH),
            credentials,
            request_timeout,
            resource_timeout: Duration::from_secs(api.resource_timeout_secs()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current usage, bounded by the overall resource timeout.
    pub async fn fetch_usage(&self) -> Result<UsageSnapshot, UsageError> {
        debug!(event = "core.usage.fetch_started", url = %self.url);

        let result = match tokio::time::timeout(self.resource_timeout, self.fetch_once()).await {
            Ok(result) => result,
            Err(_) => Err(UsageError::Timeout {
                secs: self.resource_timeout.as_secs(),
            }),
        };

        match &result {
            Ok(snapshot) => info!(
                event = "core.usage.fetch_completed",
                five_hour = ?snapshot.five_hour.as_ref().map(|w| w.utilization),
                seven_day = ?snapshot.seven_day.as_ref().map(|w| w.utilization),
            ),
            Err(e) => warn!(event = "core.usage.fetch_failed", error = %e),
        }
        result
    }

    async fn fetch_once(&self) -> Result<UsageSnapshot, UsageError> {
        let token = self.credentials.oauth_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                UsageError::Credentials(CredentialsError::Parse {
                    message: "access token contains characters not allowed in a header"
                        .to_string(),
                })
            })?,
        );
        headers.insert(
            ANTHROPIC_BETA_HEADER,
            HeaderValue::from_static(ANTHROPIC_BETA_VALUE),
        );

        let response = self
            .http
            .get(&self.url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(response).await);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let api_response: UsageApiResponse =
            serde_json::from_str(&body).map_err(|e| UsageError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(UsageSnapshot::from_api(api_response, chrono::Utc::now()))
    }

    fn transport_error(&self, e: reqwest::Error) -> UsageError {
        if e.is_timeout() {
            UsageError::Timeout {
                secs: self.request_timeout.as_secs(),
            }
        } else {
            UsageError::Network {
                message: e.to_string(),
            }
        }
    }
}

impl UsageSource for UsageClient {
    fn fetch(&self) -> impl Future<Output = Result<UsageSnapshot, UsageError>> + Send {
        self.fetch_usage()
    }
}

/// Map a non-2xx response to the matching error variant.
async fn error_for_status(response: reqwest::Response) -> UsageError {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UsageError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => UsageError::RateLimited {
            retry_after_secs: response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        },
        _ => {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            UsageError::Api {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::file_only(std::path::PathBuf::from("/nonexistent/.credentials.json"))
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let api = ApiConfig {
            base_url: Some("http://127.0.0.1:9999/".to_string()),
            ..Default::default()
        };
        let client = UsageClient::new(&api, store()).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9999/api/oauth/usage");
    }

    #[test]
    fn test_default_url() {
        let client = UsageClient::new(&ApiConfig::default(), store()).unwrap();
        assert_eq!(client.url(), "https://api.anthropic.com/api/oauth/usage");
    }

    #[tokio::test]
    async fn test_missing_credentials_surface_as_usage_error() {
        let api = ApiConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let client = UsageClient::new(&api, store()).unwrap();

        let err = client.fetch_usage().await.unwrap_err();
        assert!(matches!(err, UsageError::Credentials(_)));
    }
}
