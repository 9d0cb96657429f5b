//! Listing, lookup, history and merge operations

use std::collections::HashSet;

use super::super::merge::{self, ComparedPath, MergeResult};
use super::super::types::{Checkpoint, CheckpointId, CheckpointListItem, CheckpointMetadata, Trigger};
use super::types::CheckpointEngine;
use crate::error::{EngineResult, RewindError};

impl CheckpointEngine {
    /// List checkpoints, most recent first
    pub fn list(&self, limit: Option<usize>, session_id: Option<&str>) -> Vec<CheckpointListItem> {
        self.store.list(limit, session_id)
    }

    /// Get a specific checkpoint
    pub async fn get(&self, id: &CheckpointId) -> EngineResult<Option<Checkpoint>> {
        self.store.get(id).await
    }

    /// Get the latest checkpoint
    pub fn latest(&self, session_id: Option<&str>) -> Option<CheckpointListItem> {
        self.store.latest(session_id)
    }

    /// Number of stored checkpoints
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Delete a checkpoint; `false` if it did not exist
    pub async fn delete(&self, id: &CheckpointId) -> EngineResult<bool> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!(checkpoint_id = %id, "Deleted checkpoint");
        }
        Ok(deleted)
    }

    /// Delete all checkpoints
    pub async fn clear(&self) -> EngineResult<usize> {
        let mut count = 0;
        for id in self.store.ids() {
            if self.store.delete(&id).await? {
                count += 1;
            }
        }
        tracing::info!(count, "Cleared checkpoints");
        Ok(count)
    }

    /// Resolve a full id or unique prefix
    pub fn find_by_prefix(&self, prefix: &str) -> EngineResult<Option<CheckpointId>> {
        self.store.find_by_prefix(prefix)
    }

    /// Like [`find_by_prefix`](Self::find_by_prefix) but unknown ids are `NotFound`
    pub fn resolve(&self, id_or_prefix: &str) -> EngineResult<CheckpointId> {
        self.find_by_prefix(id_or_prefix)?.ok_or_else(|| {
            RewindError::not_found_resource(format!("Checkpoint {} not found", id_or_prefix), "checkpoint")
        })
    }

    /// Walk the parent chain from `id`, newest first.
    ///
    /// The walk stops at the root or at the first parent that has been pruned.
    pub fn history(&self, id: &CheckpointId) -> EngineResult<Vec<CheckpointListItem>> {
        let mut current = self.store.item(id).ok_or_else(|| {
            RewindError::not_found_resource(format!("Checkpoint {} not found", id), "checkpoint")
        })?;

        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        loop {
            if !seen.insert(current.id.clone()) {
                tracing::warn!(checkpoint_id = %current.id, "Cycle in checkpoint parent chain");
                break;
            }
            let parent = current.parent_id.clone();
            chain.push(current);
            match parent.and_then(|p| self.store.item(&p)) {
                Some(item) => current = item,
                None => break,
            }
        }
        Ok(chain)
    }

    /// Classify every path of two checkpoints
    pub async fn compare(&self, a: &CheckpointId, b: &CheckpointId) -> EngineResult<Vec<ComparedPath>> {
        let a = self.load_or_not_found(a).await?;
        let b = self.load_or_not_found(b).await?;
        Ok(merge::compare(&a, &b))
    }

    /// Merge checkpoint `b` into `a`.
    ///
    /// A conflict-free merge is persisted as a new checkpoint chained to `a`.
    /// With conflicts nothing is written and the strategy is `Manual`.
    pub async fn merge_checkpoints(&self, a: &CheckpointId, b: &CheckpointId) -> EngineResult<MergeResult> {
        let a = self.load_or_not_found(a).await?;
        let b = self.load_or_not_found(b).await?;
        let (mut result, files) = merge::merge(&a, &b);

        if !result.success {
            tracing::info!(
                a = %a.id,
                b = %b.id,
                conflicts = result.conflicts.len(),
                "Merge needs manual resolution"
            );
            return Ok(result);
        }

        let mut merged = Checkpoint::new(
            a.session_id.clone(),
            CheckpointMetadata::new(Trigger::Auto("merge".to_string()), "rewind"),
        )
        .with_label(format!("Merge {} into {}", b.id, a.id))
        .with_files(files)
        .with_parent(a.id.clone());
        merged.git_state = a.git_state.clone();

        self.store.persist(&merged).await?;
        tracing::info!(checkpoint_id = %merged.id, paths = result.merged_paths.len(), "Persisted merged checkpoint");
        result.merged_checkpoint_id = Some(merged.id);
        Ok(result)
    }
}
