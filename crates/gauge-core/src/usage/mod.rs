//! Claude OAuth usage API: credentials, HTTP client and response types.

pub mod client;
pub mod credentials;
pub mod errors;
pub mod types;

pub use client::{USAGE_API_PATH, UsageClient, UsageSource};
pub use credentials::{CredentialStore, KEYCHAIN_SERVICE, TOKEN_ENV_VAR};
pub use errors::{CredentialsError, UsageError};
pub use types::{LevelThresholds, UsageLevel, UsageSnapshot, UsageWindow};
