//! In-memory checkpoint storage implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::super::types::{Checkpoint, CheckpointId, Trigger};
use super::CheckpointStorage;
use crate::error::{EngineResult, RewindError};

/// In-memory checkpoint storage (for testing)
#[derive(Default)]
pub struct MemoryCheckpointStorage {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
    /// Triggers whose saves should fail
    failing: RwLock<Vec<Trigger>>,
}

impl MemoryCheckpointStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save of a checkpoint with `trigger` fail
    pub fn fail_saves_for(&self, trigger: Trigger) {
        self.failing.write().push(trigger);
    }

    pub fn len(&self) -> usize {
        self.checkpoints.read().len()
    }
}

#[async_trait]
impl CheckpointStorage for MemoryCheckpointStorage {
    async fn save(&self, checkpoint: &Checkpoint) -> EngineResult<()> {
        if self.failing.read().contains(&checkpoint.metadata.trigger) {
            return Err(RewindError::storage("simulated write failure"));
        }
        self.checkpoints
            .write()
            .insert(checkpoint.id.as_str().to_string(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, id: &CheckpointId) -> EngineResult<Option<Checkpoint>> {
        Ok(self.checkpoints.read().get(id.as_str()).cloned())
    }

    async fn load_all(&self) -> EngineResult<Vec<Checkpoint>> {
        Ok(self.checkpoints.read().values().cloned().collect())
    }

    async fn delete(&self, id: &CheckpointId) -> EngineResult<bool> {
        Ok(self.checkpoints.write().remove(id.as_str()).is_some())
    }

    async fn exists(&self, id: &CheckpointId) -> EngineResult<bool> {
        Ok(self.checkpoints.read().contains_key(id.as_str()))
    }
}
