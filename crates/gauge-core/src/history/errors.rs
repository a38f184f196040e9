use crate::errors::GaugeError;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to serialize usage history: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Path(#[from] gauge_paths::PathError),

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl GaugeError for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            HistoryError::Serialization { .. } => "HISTORY_SERIALIZATION_ERROR",
            HistoryError::Path(_) => "HISTORY_PATH_ERROR",
            HistoryError::IoError { .. } => "HISTORY_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, HistoryError::Path(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_error_codes() {
        let io: HistoryError = std::io::Error::other("disk full").into();
        assert_eq!(io.error_code(), "HISTORY_IO_ERROR");
        assert!(!io.is_user_error());

        let path: HistoryError = gauge_paths::PathError::HomeNotFound.into();
        assert_eq!(path.error_code(), "HISTORY_PATH_ERROR");
        assert!(path.is_user_error());
    }
}
