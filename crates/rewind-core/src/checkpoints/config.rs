//! Checkpoint engine configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::walker::ExclusionMatcher;
use crate::error::{EngineResult, RewindError};

/// Retention bound
pub const DEFAULT_MAX_CHECKPOINTS: usize = 50;
/// Files larger than this are skipped during capture (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
/// Concurrent file reads during capture
pub const DEFAULT_IO_CONCURRENCY: usize = 16;
/// Storage directory relative to the workspace root
pub const DEFAULT_STORAGE_DIR: &str = ".agent/checkpoints";

/// Build, dependency and version-control directories
pub fn default_exclude_patterns() -> Vec<String> {
    [
        ".git",
        ".agent",
        "node_modules",
        "target",
        "dist",
        "build",
        "__pycache__",
        ".venv",
        "venv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_checkpoint_tools() -> Vec<String> {
    ["Write", "Edit", "MultiEdit", "Delete", "Bash"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration for the checkpoint engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workspace being protected
    pub workspace_root: PathBuf,
    /// Where checkpoint documents live; relative paths resolve against the root
    pub storage_dir: PathBuf,
    /// Maximum number of checkpoints to keep
    pub max_checkpoints: usize,
    /// Per-file size ceiling in bytes
    pub max_file_size: u64,
    /// Glob patterns relative to the workspace root
    pub exclude_patterns: Vec<String>,
    pub capture_git_state: bool,
    pub git_timeout_secs: u64,
    pub io_concurrency: usize,
    /// Auto-create checkpoint before tool execution
    pub auto_checkpoint_before_tools: bool,
    /// Tools that trigger auto-checkpoints
    pub checkpoint_tools: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            max_checkpoints: DEFAULT_MAX_CHECKPOINTS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude_patterns: default_exclude_patterns(),
            capture_git_state: true,
            git_timeout_secs: super::git::DEFAULT_GIT_TIMEOUT_SECS,
            io_concurrency: DEFAULT_IO_CONCURRENCY,
            auto_checkpoint_before_tools: true,
            checkpoint_tools: default_checkpoint_tools(),
        }
    }
}

impl EngineConfig {
    /// Create config for a workspace
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            ..Default::default()
        }
    }

    /// Load from a TOML, YAML or JSON file (by extension).
    ///
    /// A missing file yields defaults. The workspace root is always the one
    /// passed in, and environment overrides are applied last.
    pub fn load(path: &Path, workspace_root: impl Into<PathBuf>) -> EngineResult<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                RewindError::config_with_context(
                    format!("Failed to read config file: {}", e),
                    format!("Reading configuration from '{}'", path.display()),
                )
            })?;
            Self::parse(&content, path)?
        } else {
            tracing::debug!(path = ?path, "No config file, using defaults");
            Self::default()
        };
        config.workspace_root = workspace_root.into();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str, path: &Path) -> EngineResult<Self> {
        let context = || format!("Deserializing configuration from '{}'", path.display());
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(content).map_err(|e| {
                RewindError::config_with_context(format!("Failed to parse TOML config: {}", e), context())
            }),
            Some("yaml") | Some("yml") => serde_yaml::from_str(content).map_err(|e| {
                RewindError::config_with_context(format!("Failed to parse YAML config: {}", e), context())
            }),
            _ => serde_json::from_str(content).map_err(|e| {
                RewindError::config_with_context(format!("Failed to parse JSON config: {}", e), context())
            }),
        }
    }

    /// Apply `REWIND_*` overrides from `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> EngineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> EngineResult<T> {
            value
                .trim()
                .parse()
                .map_err(|_| RewindError::config(format!("Invalid value for {}: '{}'", key, value)))
        }

        if let Some(v) = lookup("REWIND_MAX_CHECKPOINTS") {
            self.max_checkpoints = parse_var("REWIND_MAX_CHECKPOINTS", v)?;
        }
        if let Some(v) = lookup("REWIND_MAX_FILE_SIZE") {
            self.max_file_size = parse_var("REWIND_MAX_FILE_SIZE", v)?;
        }
        if let Some(v) = lookup("REWIND_GIT_TIMEOUT_SECS") {
            self.git_timeout_secs = parse_var("REWIND_GIT_TIMEOUT_SECS", v)?;
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_checkpoints == 0 {
            return Err(RewindError::invalid_input_field(
                "max_checkpoints must be at least 1",
                "max_checkpoints",
            ));
        }
        if self.io_concurrency == 0 {
            return Err(RewindError::invalid_input_field(
                "io_concurrency must be at least 1",
                "io_concurrency",
            ));
        }
        ExclusionMatcher::new(&self.exclude_patterns)?;
        Ok(())
    }

    /// Absolute storage directory
    pub fn storage_path(&self) -> PathBuf {
        if self.storage_dir.is_absolute() {
            self.storage_dir.clone()
        } else {
            self.workspace_root.join(&self.storage_dir)
        }
    }

    /// Storage directory as a glob relative to the root, if it lives inside it
    pub fn storage_exclude_pattern(&self) -> Option<String> {
        let storage = self.storage_path();
        let relative = storage.strip_prefix(&self.workspace_root).ok()?;
        let relative = relative.to_str()?.replace('\\', "/");
        (!relative.is_empty()).then(|| format!("{}/**", relative))
    }

    /// Git timeout as a Duration
    pub fn git_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.git_timeout_secs)
    }

    /// Set storage path
    pub fn with_storage_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_dir = path.into();
        self
    }

    /// Set max checkpoints
    pub fn with_max_checkpoints(mut self, max: usize) -> Self {
        self.max_checkpoints = max;
        self
    }

    /// Set the per-file size ceiling
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Replace the exclusion patterns
    pub fn with_exclude_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Add one exclusion pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Disable git state capture
    pub fn without_git_state(mut self) -> Self {
        self.capture_git_state = false;
        self
    }

    /// Disable auto-checkpointing
    pub fn without_auto_checkpoint(mut self) -> Self {
        self.auto_checkpoint_before_tools = false;
        self
    }
}
