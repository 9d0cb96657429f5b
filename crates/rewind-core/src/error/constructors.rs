//! Constructor methods for RewindError

use super::types::RewindError;

impl RewindError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
            context: None,
        }
    }

    /// Create a not found error for a specific resource type
    pub fn not_found_resource(message: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: Some(resource_type.into()),
            context: None,
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            context: None,
        }
    }

    /// Create an IO error attributed to a path
    pub fn io_at(message: impl Into<String>, path: impl AsRef<std::path::Path>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.as_ref().display().to_string()),
            context: None,
        }
    }

    /// Create a JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
            context: None,
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            context: None,
        }
    }

    /// Create a store corruption error for a persisted document
    pub fn corruption(message: impl Into<String>, path: impl AsRef<std::path::Path>) -> Self {
        Self::StoreCorruption {
            message: message.into(),
            path: path.as_ref().display().to_string(),
            context: None,
        }
    }

    /// Create a git unavailable error
    pub fn git_unavailable(message: impl Into<String>) -> Self {
        Self::GitUnavailable {
            message: message.into(),
            context: None,
        }
    }

    /// Create a git command failure
    pub fn git_command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitCommandFailure {
            command: command.into(),
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
            context: None,
        }
    }

    /// Create an invalid input error naming the offending field
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
            context: None,
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to any variant that carries it
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        let ctx = Some(ctx.into());
        match &mut self {
            Self::NotFound { context, .. }
            | Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::Storage { context, .. }
            | Self::StoreCorruption { context, .. }
            | Self::GitUnavailable { context, .. }
            | Self::GitCommandFailure { context, .. }
            | Self::Config { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Other { context, .. } => *context = ctx,
            Self::Cancelled => {}
        }
        self
    }

    /// Check whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
