//! Checkpoint creation

use super::super::capture::CaptureOptions;
use super::super::types::{Checkpoint, Trigger};
use super::types::CheckpointEngine;
use crate::error::EngineResult;

impl CheckpointEngine {
    /// Capture and persist a checkpoint.
    ///
    /// Without an explicit parent the checkpoint is chained to the most
    /// recent checkpoint of the same session.
    pub async fn create(&self, mut options: CaptureOptions) -> EngineResult<Checkpoint> {
        if options.parent_id.is_none() {
            options.parent_id = self.store.latest(Some(&options.session_id)).map(|item| item.id);
        }

        let checkpoint = self.capture.create(options).await?;
        let pruned = self.store.persist(&checkpoint).await?;

        tracing::info!(
            checkpoint_id = %checkpoint.id,
            trigger = %checkpoint.metadata.trigger,
            files = checkpoint.file_count(),
            pruned = pruned.len(),
            "Created checkpoint"
        );
        Ok(checkpoint)
    }

    /// User-requested checkpoint
    pub async fn create_manual(&self, session_id: &str, label: Option<String>) -> EngineResult<Checkpoint> {
        let mut options = self.capture_options(session_id, Trigger::Manual);
        if let Some(label) = label {
            options = options.with_label(label);
        }
        self.create(options).await
    }

    /// Create pre-tool checkpoint
    pub async fn create_pre_tool_checkpoint(&self, session_id: &str, tool_name: &str) -> EngineResult<Checkpoint> {
        let options = self
            .capture_options(session_id, Trigger::PreTool)
            .with_label(format!("Before {}", tool_name))
            .with_tool(tool_name);
        self.create(options).await
    }

    /// Pre-tool checkpoint, only when the tool is configured to trigger one
    pub async fn checkpoint_before_tool(&self, session_id: &str, tool_name: &str) -> EngineResult<Option<Checkpoint>> {
        if !self.should_checkpoint_for_tool(tool_name) {
            tracing::trace!(tool = tool_name, "Tool does not trigger a checkpoint");
            return Ok(None);
        }
        self.create_pre_tool_checkpoint(session_id, tool_name).await.map(Some)
    }

    /// Create session start checkpoint
    pub async fn create_session_start_checkpoint(&self, session_id: &str) -> EngineResult<Checkpoint> {
        let options = self
            .capture_options(session_id, Trigger::SessionStart)
            .with_label(format!("Session start: {}", session_id));
        self.create(options).await
    }

    /// Automatic checkpoint for any other reason
    pub async fn create_auto_checkpoint(&self, session_id: &str, reason: &str) -> EngineResult<Checkpoint> {
        let options = self.capture_options(session_id, Trigger::Auto(reason.to_string()));
        self.create(options).await
    }
}
