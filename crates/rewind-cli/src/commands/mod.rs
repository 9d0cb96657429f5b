//! Command implementations

pub mod list;
pub mod manage;
pub mod merge;
pub mod rewind;

use rewind_core::{CheckpointEngine, CheckpointId};

/// Resolve a full ID or unique prefix given on the command line
pub(crate) fn resolve_id(engine: &CheckpointEngine, raw: &str) -> anyhow::Result<CheckpointId> {
    Ok(engine.resolve(raw.trim())?)
}
