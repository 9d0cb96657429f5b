//! Engine type and construction

use std::path::Path;
use std::sync::Arc;

use super::super::capture::{CaptureOptions, SnapshotCapture};
use super::super::config::EngineConfig;
use super::super::git::{CommandGitBackend, GitBackend};
use super::super::session::SessionStateRestorer;
use super::super::storage::{CheckpointStorage, FileCheckpointStorage};
use super::super::store::CheckpointStore;
use super::super::types::{Checkpoint, CheckpointId, FileSnapshot, Trigger};
use super::super::walker::ExclusionMatcher;
use crate::error::{EngineResult, RewindError};

/// Snapshot/rewind engine bound to one workspace
pub struct CheckpointEngine {
    pub(super) config: EngineConfig,
    pub(super) store: CheckpointStore,
    pub(super) capture: SnapshotCapture,
    pub(super) git: Arc<dyn GitBackend>,
    pub(super) session_restorer: Option<Arc<dyn SessionStateRestorer>>,
    /// Configured excludes plus the store directory
    pub(super) matcher: ExclusionMatcher,
}

impl CheckpointEngine {
    /// Open an engine with file storage under the configured directory and
    /// the system git binary
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        let config = Self::absolutize(config)?;
        let storage = Arc::new(FileCheckpointStorage::new(config.storage_path()));
        let git = Arc::new(CommandGitBackend::new(config.git_timeout()));
        Self::with_backends(config, storage, git).await
    }

    /// Open with custom storage and git backends
    pub async fn with_backends(
        config: EngineConfig,
        storage: Arc<dyn CheckpointStorage>,
        git: Arc<dyn GitBackend>,
    ) -> EngineResult<Self> {
        let config = Self::absolutize(config)?;
        config.validate()?;

        let mut capture = SnapshotCapture::new(&config.workspace_root, Arc::clone(&git))
            .with_io_concurrency(config.io_concurrency);
        if let Some(pattern) = config.storage_exclude_pattern() {
            capture = capture.with_forced_exclude(pattern);
        }
        let matcher = capture.matcher(&config.exclude_patterns)?;
        let store = CheckpointStore::open(storage, config.max_checkpoints).await?;
        if let Some(newest) = store.ids().iter().max() {
            newest.reserve_after();
        }

        tracing::info!(
            workspace = ?config.workspace_root,
            checkpoints = store.len(),
            max_checkpoints = config.max_checkpoints,
            "Checkpoint engine ready"
        );

        Ok(Self {
            config,
            store,
            capture,
            git,
            session_restorer: None,
            matcher,
        })
    }

    /// Attach the collaborator that restores session state
    pub fn with_session_restorer(mut self, restorer: Arc<dyn SessionStateRestorer>) -> Self {
        self.session_restorer = Some(restorer);
        self
    }

    fn absolutize(mut config: EngineConfig) -> EngineResult<EngineConfig> {
        if !config.workspace_root.is_absolute() {
            config.workspace_root = std::path::absolute(&config.workspace_root).map_err(|e| {
                RewindError::io_at(
                    format!("Failed to resolve workspace root: {}", e),
                    &config.workspace_root,
                )
            })?;
        }
        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.config.workspace_root
    }

    /// Check if a tool should trigger auto-checkpoint
    pub fn should_checkpoint_for_tool(&self, tool_name: &str) -> bool {
        self.config.auto_checkpoint_before_tools
            && self
                .config
                .checkpoint_tools
                .iter()
                .any(|t| t.eq_ignore_ascii_case(tool_name))
    }

    /// Capture options seeded from the engine configuration
    pub fn capture_options(&self, session_id: impl Into<String>, trigger: Trigger) -> CaptureOptions {
        let mut options = CaptureOptions::new(session_id, trigger)
            .with_exclude_patterns(self.config.exclude_patterns.clone())
            .with_max_file_size(self.config.max_file_size);
        if !self.config.capture_git_state {
            options = options.without_git_state();
        }
        options
    }

    // Internal helper methods

    pub(super) async fn load_or_not_found(&self, id: &CheckpointId) -> EngineResult<Checkpoint> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| RewindError::not_found_resource(format!("Checkpoint {} not found", id), "checkpoint"))
    }

    /// Whether a snapshot path belongs to this workspace and is not excluded
    pub(super) fn is_tracked(&self, snapshot: &FileSnapshot) -> bool {
        match snapshot.path.strip_prefix(&self.config.workspace_root) {
            Ok(relative) => !self.matcher.is_excluded(relative),
            Err(_) => false,
        }
    }
}
