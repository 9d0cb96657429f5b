//! Session-state restore collaborator
//!
//! The engine does not own the conversation or session log format. When a
//! rewind includes session state, it hands the target checkpoint to whatever
//! [`SessionStateRestorer`] the host attached.

use async_trait::async_trait;

use super::types::Checkpoint;
use crate::error::EngineResult;

#[async_trait]
pub trait SessionStateRestorer: Send + Sync {
    /// Bring session state back to the point `checkpoint` was taken
    async fn restore(&self, checkpoint: &Checkpoint) -> EngineResult<()>;
}
