//! File-based checkpoint storage implementation

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::super::types::{Checkpoint, CheckpointId};
use super::CheckpointStorage;
use crate::error::{EngineResult, RewindError};

const DOCUMENT_EXT: &str = "json";
const TEMP_EXT: &str = "json.tmp";

/// File-based checkpoint storage
///
/// One JSON document per checkpoint:
/// ```text
/// {storage_dir}/
///   {checkpoint_id}.json
/// ```
/// Writes go to `{checkpoint_id}.json.tmp` first and are renamed into place.
pub struct FileCheckpointStorage {
    storage_dir: PathBuf,
}

impl FileCheckpointStorage {
    /// Create a new file-based storage
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// Get the checkpoints directory
    pub fn checkpoints_dir(&self) -> PathBuf {
        self.storage_dir.clone()
    }

    /// Get the path for a checkpoint file
    pub fn checkpoint_path(&self, id: &CheckpointId) -> PathBuf {
        self.checkpoints_dir()
            .join(format!("{}.{}", id.as_str(), DOCUMENT_EXT))
    }

    fn temp_path(&self, id: &CheckpointId) -> PathBuf {
        self.checkpoints_dir()
            .join(format!("{}.{}", id.as_str(), TEMP_EXT))
    }

    async fn ensure_dirs(&self) -> EngineResult<()> {
        fs::create_dir_all(self.checkpoints_dir()).await.map_err(|e| {
            RewindError::storage(format!("Failed to create checkpoints directory: {}", e))
        })
    }

    async fn read_document(&self, path: &std::path::Path) -> EngineResult<Checkpoint> {
        let content = fs::read(path)
            .await
            .map_err(|e| RewindError::io_at(format!("Failed to read checkpoint file: {}", e), path))?;
        serde_json::from_slice(&content)
            .map_err(|e| RewindError::corruption(format!("Failed to deserialize checkpoint: {}", e), path))
    }
}

#[async_trait]
impl CheckpointStorage for FileCheckpointStorage {
    async fn save(&self, checkpoint: &Checkpoint) -> EngineResult<()> {
        self.ensure_dirs().await?;

        let json = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| RewindError::storage(format!("Failed to serialize checkpoint: {}", e)))?;

        let temp = self.temp_path(&checkpoint.id);
        let path = self.checkpoint_path(&checkpoint.id);

        let write = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            fs::rename(&temp, &path).await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp).await;
            return Err(RewindError::storage(format!(
                "Failed to write checkpoint file: {}",
                e
            ))
            .with_context(format!("checkpoint {}", checkpoint.id)));
        }

        tracing::debug!(checkpoint_id = %checkpoint.id, path = ?path, bytes = json.len(), "Saved checkpoint");
        Ok(())
    }

    async fn load(&self, id: &CheckpointId) -> EngineResult<Option<Checkpoint>> {
        let path = self.checkpoint_path(id);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        self.read_document(&path).await.map(Some)
    }

    async fn load_all(&self) -> EngineResult<Vec<Checkpoint>> {
        let checkpoints_dir = self.checkpoints_dir();
        if !fs::try_exists(&checkpoints_dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut checkpoints = Vec::new();
        let mut entries = fs::read_dir(&checkpoints_dir).await.map_err(|e| {
            RewindError::storage(format!("Failed to read checkpoints directory: {}", e))
        })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RewindError::storage(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != DOCUMENT_EXT) {
                continue;
            }
            match self.read_document(&path).await {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Skipping unreadable checkpoint document");
                }
            }
        }

        Ok(checkpoints)
    }

    async fn delete(&self, id: &CheckpointId) -> EngineResult<bool> {
        let path = self.checkpoint_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(checkpoint_id = %id, "Deleted checkpoint");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RewindError::storage(format!(
                "Failed to delete checkpoint file: {}",
                e
            ))),
        }
    }

    async fn exists(&self, id: &CheckpointId) -> EngineResult<bool> {
        Ok(fs::try_exists(self.checkpoint_path(id)).await.unwrap_or(false))
    }
}
