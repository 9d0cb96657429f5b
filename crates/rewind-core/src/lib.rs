//! Rewind Core Library
//!
//! Snapshot and rewind engine for agent-driven workspaces: capture the whole
//! workspace before risky mutations and restore any earlier checkpoint.

pub mod checkpoints;
pub mod error;

// Re-export commonly used types
pub use checkpoints::{
    CaptureOptions, Checkpoint, CheckpointEngine, CheckpointId, CheckpointListItem, EngineConfig,
    GitBackend, MergeResult, RestoreMode, RewindOptions, RewindResult, SessionStateRestorer, Trigger,
};
pub use error::{EngineResult, RewindError, UnifiedError};
