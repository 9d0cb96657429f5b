//! Rewind orchestration
//!
//! Order of work for a rewind:
//! 1. resolve the target (unknown ids fail before any side effect) and pin it
//! 2. capture a pre-rewind safety checkpoint unless this is a dry run
//! 3. plan file actions against a fresh scan of the workspace
//! 4. dry run: stop and report the plan
//! 5. move git HEAD if it differs from the target, then re-plan
//! 6. apply file actions, continuing past individual failures
//! 7. hand session state to the attached restorer

use tokio_util::sync::CancellationToken;

use super::super::git::{matches_head, restore_git_state};
use super::super::restore::{RestorePhase, RestorePlan, apply};
use super::super::types::{
    Checkpoint, CheckpointId, GitState, RewindOptions, RewindResult, SessionStateOutcome, Trigger,
};
use super::types::CheckpointEngine;
use crate::error::{EngineResult, RewindError};

impl CheckpointEngine {
    /// Rewind the workspace to a checkpoint
    pub async fn rewind(&self, id: &CheckpointId, options: RewindOptions) -> EngineResult<RewindResult> {
        self.rewind_with_cancel(id, options, &CancellationToken::new()).await
    }

    /// Dry-run rewind with default scope
    pub async fn preview(&self, id: &CheckpointId) -> EngineResult<RewindResult> {
        self.rewind(id, RewindOptions::dry_run()).await
    }

    /// Rewind, observing `cancel`.
    ///
    /// Cancellation before file actions start returns [`RewindError::Cancelled`]
    /// with the workspace untouched. Cancellation while applying stops after
    /// the in-flight file and reports every unattempted path as failed.
    pub async fn rewind_with_cancel(
        &self,
        id: &CheckpointId,
        options: RewindOptions,
        cancel: &CancellationToken,
    ) -> EngineResult<RewindResult> {
        let target = self.load_or_not_found(id).await?;
        let _pin = self.store.pin(id);
        tracing::info!(
            checkpoint_id = %id,
            mode = ?options.restore_mode,
            dry_run = options.dry_run,
            "Rewinding to checkpoint"
        );

        if cancel.is_cancelled() {
            return Err(RewindError::Cancelled);
        }

        let safety_checkpoint_id = if options.create_safety_checkpoint && !options.dry_run {
            let safety = self
                .create(
                    self.capture_options(&target.session_id, Trigger::PreRewind)
                        .with_label(format!("Before rewind to {}", target.id)),
                )
                .await
                .map_err(|e| e.with_context(format!("creating safety checkpoint before rewind to {}", id)))?;
            Some(safety.id)
        } else {
            None
        };

        let files_requested = options.restore_mode.includes_files();
        let scoped = self.scoped_target(&target);
        let mut plan = if files_requested {
            self.plan(&scoped).await?
        } else {
            RestorePlan::default()
        };

        if options.dry_run {
            let git_operations = match (&target.git_state, files_requested) {
                (Some(state), true) => {
                    if matches_head(self.git.as_ref(), self.workspace_root(), state).await {
                        Some(Vec::new())
                    } else {
                        Some(planned_git_operations(state))
                    }
                }
                _ => None,
            };
            let session_state = if options.restore_mode.includes_session_state() {
                SessionStateOutcome::Planned
            } else {
                SessionStateOutcome::NotRequested
            };
            tracing::info!(
                checkpoint_id = %id,
                changes = plan.changed_paths().len(),
                "Previewed rewind"
            );
            return Ok(RewindResult {
                checkpoint_id: id.clone(),
                restored_paths: plan.changed_paths(),
                failed_paths: Vec::new(),
                git_operations,
                actions: plan.actions,
                session_state,
                safety_checkpoint_id,
                phase: RestorePhase::Previewing,
                dry_run: true,
                success: true,
            });
        }

        if cancel.is_cancelled() {
            return Err(RewindError::Cancelled);
        }

        let mut git_operations = None;
        if let (Some(state), true) = (&target.git_state, files_requested) {
            let root = self.workspace_root();
            if matches_head(self.git.as_ref(), root, state).await {
                git_operations = Some(Vec::new());
            } else {
                let ops = restore_git_state(self.git.as_ref(), root, state).await;
                // the hard reset may have rewritten tracked files
                plan = self.plan(&scoped).await?;
                git_operations = Some(ops);
            }
        }

        let outcome = apply(&plan, &scoped, cancel).await;
        let phase = outcome.phase();

        let session_state = if !options.restore_mode.includes_session_state() {
            SessionStateOutcome::NotRequested
        } else if outcome.cancelled {
            SessionStateOutcome::Failed("cancelled before session-state restore".to_string())
        } else {
            match &self.session_restorer {
                None => SessionStateOutcome::NoRestorer,
                Some(restorer) => match restorer.restore(&target).await {
                    Ok(()) => SessionStateOutcome::Restored,
                    Err(e) => {
                        tracing::warn!(checkpoint_id = %id, error = %e, "Session-state restore failed");
                        SessionStateOutcome::Failed(e.to_string())
                    }
                },
            }
        };

        tracing::info!(
            checkpoint_id = %id,
            restored = outcome.restored.len(),
            failed = outcome.failed.len(),
            phase = %phase,
            "Rewind complete"
        );

        let success = outcome.failed.is_empty();
        Ok(RewindResult {
            checkpoint_id: id.clone(),
            restored_paths: outcome.restored,
            failed_paths: outcome.failed,
            git_operations,
            actions: plan.actions,
            session_state,
            safety_checkpoint_id,
            phase,
            dry_run: false,
            success,
        })
    }

    /// The target restricted to paths this engine may touch
    fn scoped_target(&self, target: &Checkpoint) -> Checkpoint {
        let mut scoped = target.clone();
        scoped.files.retain(|file| {
            let tracked = self.is_tracked(file);
            if !tracked {
                tracing::debug!(path = ?file.path, "Snapshot path excluded or outside workspace, not restoring");
            }
            tracked
        });
        scoped
    }

    async fn plan(&self, target: &Checkpoint) -> EngineResult<RestorePlan> {
        let current = self.capture.scan(&self.matcher, self.config.max_file_size).await?;
        Ok(RestorePlan::compute(&target.files, &current))
    }
}

fn planned_git_operations(state: &GitState) -> Vec<String> {
    let mut ops = Vec::new();
    if let Some(branch) = &state.branch {
        ops.push(format!("checkout {}", branch));
    }
    ops.push(format!("reset --hard {}", state.commit_hash));
    ops
}
