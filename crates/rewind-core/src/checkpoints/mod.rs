//! Checkpoint and rewind system
//!
//! This module captures complete, content-hashed snapshots of a workspace and
//! restores any of them on demand:
//! - Pre-tool checkpoints taken before an agent mutates files
//! - Rewind with selectable scope, dry-run preview and a safety checkpoint
//! - Bounded retention with pruning of the oldest checkpoints
//! - Two-way merge with conflict detection
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use rewind_core::checkpoints::{CheckpointEngine, EngineConfig, RewindOptions};
//!
//! let engine = CheckpointEngine::open(EngineConfig::new("./project")).await?;
//!
//! // before a risky edit
//! let checkpoint = engine.create_pre_tool_checkpoint("session-1", "Edit").await?;
//!
//! // ... the edit goes wrong ...
//!
//! let result = engine.rewind(&checkpoint.id, RewindOptions::files_only()).await?;
//! println!("Restored {} files", result.restored_count());
//! ```
//!
//! # Storage
//!
//! Checkpoints are stored in `.agent/checkpoints/` by default, one JSON
//! document per checkpoint:
//! ```text
//! .agent/checkpoints/
//!   {checkpoint_id}.json
//! ```

pub mod capture;
pub mod config;
pub mod engine;
pub mod git;
pub mod hash;
pub mod merge;
pub mod restore;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;
pub mod walker;

#[cfg(test)]
mod types_tests;

pub use capture::{CaptureOptions, SnapshotCapture};
pub use config::EngineConfig;
pub use engine::CheckpointEngine;
pub use git::{CommandGitBackend, GitBackend};
pub use hash::content_hash;
pub use merge::{ComparedPath, ConflictKind, MergeConflict, MergeResult, MergeStrategy, PathStatus};
pub use restore::{PlannedAction, RestoreAction, RestorePhase, RestorePlan};
pub use session::SessionStateRestorer;
pub use storage::{CheckpointStorage, FileCheckpointStorage};
pub use store::{CheckpointStore, PinGuard};
pub use types::{
    Checkpoint, CheckpointId, CheckpointListItem, CheckpointMetadata, FileSnapshot, GitState,
    RestoreMode, RewindOptions, RewindResult, SessionStateOutcome, Trigger,
};
pub use walker::{ExclusionMatcher, WorkspaceWalker};
