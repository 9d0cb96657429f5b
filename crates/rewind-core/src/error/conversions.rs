//! From trait implementations for RewindError conversions

use super::types::RewindError;

impl From<std::io::Error> for RewindError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for RewindError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<toml::de::Error> for RewindError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML: {}", error))
    }
}

impl From<serde_yaml::Error> for RewindError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::config(format!("Failed to parse YAML: {}", error))
    }
}

impl From<glob::PatternError> for RewindError {
    fn from(error: glob::PatternError) -> Self {
        Self::invalid_input_field(error.to_string(), "exclude_patterns")
    }
}

impl From<tokio::task::JoinError> for RewindError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::other(format!("Background task failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RewindError = io.into();
        assert_eq!(err.error_code(), "REWIND_IO");
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_glob_error_conversion() {
        let err: RewindError = glob::Pattern::new("a/***").unwrap_err().into();
        assert!(matches!(
            err,
            RewindError::InvalidInput { ref field, .. } if field.as_deref() == Some("exclude_patterns")
        ));
    }

    #[test]
    fn test_with_context() {
        let err = RewindError::storage("disk full").with_context("persisting chk_1_1");
        assert_eq!(err.context(), Some("persisting chk_1_1"));
        assert_eq!(RewindError::Cancelled.with_context("ignored").context(), None);
    }
}
