//! Core error types and traits

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, RewindError>;

/// Uniform accessors shared by every engine error.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Stable code for programmatic handling
    fn error_code(&self) -> &str;

    /// Human-readable message
    fn message(&self) -> &str;

    /// Optional context about where the error occurred
    fn context(&self) -> Option<&str> {
        None
    }

    /// Whether retrying the same operation may succeed
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> EngineResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> EngineResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> EngineResult<T> {
        self.map_err(|e| RewindError::other(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> EngineResult<T> {
        self.map_err(|e| RewindError::other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for turning an `Option` into an `EngineResult`
pub trait OptionExt<T> {
    /// Convert `None` into a `NotFound` error with the given message
    fn context<C: std::fmt::Display>(self, context: C) -> EngineResult<T>;

    /// Lazy variant of [`OptionExt::context`]
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> EngineResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> EngineResult<T> {
        self.ok_or_else(|| RewindError::not_found(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> EngineResult<T> {
        self.ok_or_else(|| RewindError::not_found(f().to_string()))
    }
}

/// Main error type for the checkpoint engine
#[derive(Error, Debug, Clone)]
pub enum RewindError {
    /// Unknown checkpoint or other missing resource
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        resource_type: Option<String>,
        context: Option<String>,
    },

    /// Filesystem errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Storage/persistence errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// A persisted checkpoint document could not be parsed
    #[error("Corrupt checkpoint document {path}: {message}")]
    StoreCorruption {
        message: String,
        path: String,
        context: Option<String>,
    },

    /// No git repository, or no git binary
    #[error("Git unavailable: {message}")]
    GitUnavailable {
        message: String,
        context: Option<String>,
    },

    /// A git subprocess failed or timed out
    #[error("Git command failed: {command}: {message}")]
    GitCommandFailure {
        command: String,
        message: String,
        context: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// The operation observed a cancellation signal before mutating anything
    #[error("Operation was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
