use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Whether the error stems from a missing file rather than bad content.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = AppError::NotFound("data/history/nat.txt".to_string());
        assert_eq!(error.to_string(), "Not found: data/history/nat.txt");

        let error = AppError::Decode("invalid utf-8".to_string());
        assert_eq!(error.to_string(), "Decode error: invalid utf-8");
    }

    #[test]
    fn test_is_not_found() {
        assert!(AppError::NotFound("x".to_string()).is_not_found());
        assert!(AppError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)).is_not_found());
        assert!(!AppError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
            .is_not_found());
        assert!(!AppError::Validation("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json")
            .map_err(AppError::from)
            .unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }
}
