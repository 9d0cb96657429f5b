//! UnifiedError trait implementation for RewindError

use super::types::{RewindError, UnifiedError};

impl UnifiedError for RewindError {
    fn error_code(&self) -> &str {
        match self {
            Self::NotFound { .. } => "REWIND_NOT_FOUND",
            Self::Io { .. } => "REWIND_IO",
            Self::Json { .. } => "REWIND_JSON",
            Self::Storage { .. } => "REWIND_STORAGE",
            Self::StoreCorruption { .. } => "REWIND_STORE_CORRUPTION",
            Self::GitUnavailable { .. } => "REWIND_GIT_UNAVAILABLE",
            Self::GitCommandFailure { .. } => "REWIND_GIT_COMMAND",
            Self::Config { .. } => "REWIND_CONFIG",
            Self::InvalidInput { .. } => "REWIND_INVALID_INPUT",
            Self::Cancelled => "REWIND_CANCELLED",
            Self::Other { .. } => "REWIND_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::Io { message, .. }
            | Self::Json { message, .. }
            | Self::Storage { message, .. }
            | Self::StoreCorruption { message, .. }
            | Self::GitUnavailable { message, .. }
            | Self::GitCommandFailure { message, .. }
            | Self::Config { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::Other { message, .. } => message,
            Self::Cancelled => "Operation was cancelled",
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::NotFound { context, .. }
            | Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::Storage { context, .. }
            | Self::StoreCorruption { context, .. }
            | Self::GitUnavailable { context, .. }
            | Self::GitCommandFailure { context, .. }
            | Self::Config { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
            Self::Cancelled => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::GitCommandFailure { .. } | Self::Io { .. })
    }
}
