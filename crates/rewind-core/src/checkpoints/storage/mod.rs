//! Checkpoint storage implementations
//!
//! Backends persist whole checkpoint documents. Indexing, retention and
//! pinning live one level up in [`super::store::CheckpointStore`].

use crate::error::EngineResult;
use async_trait::async_trait;

use super::types::{Checkpoint, CheckpointId};

mod file_storage;

#[cfg(test)]
mod memory_storage;


pub use file_storage::FileCheckpointStorage;

#[cfg(test)]
pub use memory_storage::MemoryCheckpointStorage;

/// Trait for checkpoint storage backends
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Persist a checkpoint atomically
    async fn save(&self, checkpoint: &Checkpoint) -> EngineResult<()>;

    /// Load a checkpoint by ID
    async fn load(&self, id: &CheckpointId) -> EngineResult<Option<Checkpoint>>;

    /// Load every readable checkpoint. Unparseable documents are logged and
    /// skipped; they never fail the whole load.
    async fn load_all(&self) -> EngineResult<Vec<Checkpoint>>;

    /// Delete a checkpoint; `false` if it was already absent
    async fn delete(&self, id: &CheckpointId) -> EngineResult<bool>;

    /// Check if a checkpoint exists
    async fn exists(&self, id: &CheckpointId) -> EngineResult<bool>;
}
