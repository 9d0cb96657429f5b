//! Compare and merge two checkpoints

use super::resolve_id;
use crate::console::{CLIConsole, format};
use crate::router::Outcome;
use colored::*;
use rewind_core::CheckpointEngine;
use rewind_core::checkpoints::PathStatus;

/// Print how each path differs between two checkpoints
pub async fn diff(
    engine: &CheckpointEngine,
    console: &CLIConsole,
    raw_a: &str,
    raw_b: &str,
) -> anyhow::Result<Outcome> {
    let a = resolve_id(engine, raw_a)?;
    let b = resolve_id(engine, raw_b)?;
    let compared = engine.compare(&a, &b).await?;
    let root = engine.workspace_root();

    console.print_header(&format!("{} .. {}", a, b));
    let mut unchanged = 0usize;
    for entry in &compared {
        let tag = match entry.status {
            PathStatus::Unchanged => {
                unchanged += 1;
                continue;
            }
            PathStatus::Added => "added".green(),
            PathStatus::Conflict(kind) => kind.to_string().yellow(),
        };
        println!("  {:>9}  {}", tag, format::path(&entry.path, root));
    }
    console.info(&format!("{} paths unchanged", unchanged));
    Ok(Outcome::Success)
}

/// Merge B into A, persisting the result when there are no conflicts
pub async fn merge(
    engine: &CheckpointEngine,
    console: &CLIConsole,
    raw_a: &str,
    raw_b: &str,
) -> anyhow::Result<Outcome> {
    let a = resolve_id(engine, raw_a)?;
    let b = resolve_id(engine, raw_b)?;
    let result = engine.merge_checkpoints(&a, &b).await?;
    let root = engine.workspace_root();

    console.print_header(&format!("Merge {} into {}", b, a));
    console.info(&format!("{} paths merged", result.merged_paths.len()));

    if result.success {
        match &result.merged_checkpoint_id {
            Some(id) => console.success(&format!("Merged into new checkpoint {}", id)),
            None => console.success("Merged without conflicts"),
        }
        return Ok(Outcome::Success);
    }

    for conflict in &result.conflicts {
        println!(
            "  {:>9}  {}",
            conflict.kind.to_string().red(),
            format::path(&conflict.path, root)
        );
    }
    console.warn(&format!(
        "{} conflicts need manual resolution; nothing was persisted",
        result.conflicts.len()
    ));
    Ok(Outcome::Incomplete)
}
