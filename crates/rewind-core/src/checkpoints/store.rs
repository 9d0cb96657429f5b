//! Checkpoint store: persistence plus an in-memory index and retention
//!
//! The index is kept sorted newest-first by `(timestamp, id)`. Every persist
//! is followed by a prune that deletes the oldest entries until at most
//! `max_checkpoints` remain, skipping any checkpoint pinned by an in-flight
//! restore.

use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;

use super::storage::CheckpointStorage;
use super::types::{Checkpoint, CheckpointId, CheckpointListItem};
use crate::error::{EngineResult, RewindError};

/// Keeps a checkpoint safe from pruning while alive
pub struct PinGuard {
    id: CheckpointId,
    pinned: Arc<Mutex<HashSet<CheckpointId>>>,
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.pinned.lock().remove(&self.id);
    }
}

/// Indexed, bounded checkpoint store
pub struct CheckpointStore {
    storage: Arc<dyn CheckpointStorage>,
    index: RwLock<Vec<CheckpointListItem>>,
    pinned: Arc<Mutex<HashSet<CheckpointId>>>,
    max_checkpoints: usize,
}

fn newest_first(a: &CheckpointListItem, b: &CheckpointListItem) -> std::cmp::Ordering {
    b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
}

impl CheckpointStore {
    /// Open a store, building the index from every readable document
    pub async fn open(storage: Arc<dyn CheckpointStorage>, max_checkpoints: usize) -> EngineResult<Self> {
        let mut items: Vec<CheckpointListItem> = storage
            .load_all()
            .await?
            .iter()
            .map(CheckpointListItem::from)
            .collect();
        items.sort_by(newest_first);
        tracing::debug!(count = items.len(), "Loaded checkpoint index");

        let store = Self {
            storage,
            index: RwLock::new(items),
            pinned: Arc::new(Mutex::new(HashSet::new())),
            max_checkpoints: max_checkpoints.max(1),
        };
        store.prune_except(None).await?;
        Ok(store)
    }

    /// Retention bound
    pub fn max_checkpoints(&self) -> usize {
        self.max_checkpoints
    }

    /// Number of indexed checkpoints
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Write a checkpoint, index it, then prune. Returns the pruned IDs.
    ///
    /// The checkpoint just written is never a pruning candidate.
    pub async fn persist(&self, checkpoint: &Checkpoint) -> EngineResult<Vec<CheckpointId>> {
        self.storage.save(checkpoint).await?;
        {
            let mut index = self.index.write();
            index.retain(|item| item.id != checkpoint.id);
            index.push(CheckpointListItem::from(checkpoint));
            index.sort_by(newest_first);
        }
        self.prune_except(Some(&checkpoint.id)).await
    }

    /// Most recent first, optionally filtered by session
    pub fn list(&self, limit: Option<usize>, session_id: Option<&str>) -> Vec<CheckpointListItem> {
        self.index
            .read()
            .iter()
            .filter(|item| session_id.is_none_or(|s| item.session_id == s))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Full checkpoint, or `None` if unknown
    pub async fn get(&self, id: &CheckpointId) -> EngineResult<Option<Checkpoint>> {
        if !self.contains(id) {
            return Ok(None);
        }
        self.storage.load(id).await
    }

    /// Index entry for one checkpoint
    pub fn item(&self, id: &CheckpointId) -> Option<CheckpointListItem> {
        self.index.read().iter().find(|item| &item.id == id).cloned()
    }

    pub fn contains(&self, id: &CheckpointId) -> bool {
        self.index.read().iter().any(|item| &item.id == id)
    }

    /// Most recent checkpoint summary, optionally within one session
    pub fn latest(&self, session_id: Option<&str>) -> Option<CheckpointListItem> {
        self.list(Some(1), session_id).into_iter().next()
    }

    /// Resolve a unique ID prefix
    pub fn find_by_prefix(&self, prefix: &str) -> EngineResult<Option<CheckpointId>> {
        let index = self.index.read();
        if let Some(exact) = index.iter().find(|item| item.id.as_str() == prefix) {
            return Ok(Some(exact.id.clone()));
        }
        let mut matches = index.iter().filter(|item| item.id.as_str().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (None, _) => Ok(None),
            (Some(only), None) => Ok(Some(only.id.clone())),
            (Some(_), Some(_)) => Err(RewindError::invalid_input(format!(
                "Checkpoint prefix '{}' is ambiguous",
                prefix
            ))),
        }
    }

    /// Remove a checkpoint; `false` if already absent
    pub async fn delete(&self, id: &CheckpointId) -> EngineResult<bool> {
        let removed_file = self.storage.delete(id).await?;
        let removed_index = {
            let mut index = self.index.write();
            let before = index.len();
            index.retain(|item| &item.id != id);
            index.len() != before
        };
        Ok(removed_file || removed_index)
    }

    /// Protect a checkpoint from pruning until the guard drops
    pub fn pin(&self, id: &CheckpointId) -> PinGuard {
        self.pinned.lock().insert(id.clone());
        PinGuard {
            id: id.clone(),
            pinned: Arc::clone(&self.pinned),
        }
    }

    pub fn is_pinned(&self, id: &CheckpointId) -> bool {
        self.pinned.lock().contains(id)
    }

    /// Delete oldest-first while over the bound, skipping pinned checkpoints
    pub async fn prune(&self) -> EngineResult<Vec<CheckpointId>> {
        self.prune_except(None).await
    }

    async fn prune_except(&self, keep: Option<&CheckpointId>) -> EngineResult<Vec<CheckpointId>> {
        let victims: Vec<CheckpointId> = {
            let index = self.index.read();
            let excess = index.len().saturating_sub(self.max_checkpoints);
            let pinned = self.pinned.lock();
            index
                .iter()
                .rev()
                .filter(|item| !pinned.contains(&item.id) && Some(&item.id) != keep)
                .take(excess)
                .map(|item| item.id.clone())
                .collect()
        };

        if !victims.is_empty() {
            tracing::debug!(count = victims.len(), "Pruning old checkpoints");
        }
        for id in &victims {
            self.delete(id).await?;
        }
        Ok(victims)
    }

    /// Every checkpoint ID, newest first
    pub fn ids(&self) -> Vec<CheckpointId> {
        self.index.read().iter().map(|item| item.id.clone()).collect()
    }
}
