use std::error::Error;

/// Base trait for all application errors
pub trait GaugeError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type GaugeResult<T> = Result<T, Box<dyn GaugeError>>;

impl GaugeError for gauge_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            gauge_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            gauge_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            gauge_config::ConfigError::PathError { .. } => "CONFIG_PATH_ERROR",
            gauge_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            gauge_config::ConfigError::ConfigParseError { .. }
                | gauge_config::ConfigError::InvalidConfiguration { .. }
        )
    }
}

impl GaugeError for gauge_paths::PathError {
    fn error_code(&self) -> &'static str {
        match self {
            gauge_paths::PathError::HomeNotFound => "HOME_NOT_FOUND",
        }
    }

    fn is_user_error(&self) -> bool {
        true
    }
}
