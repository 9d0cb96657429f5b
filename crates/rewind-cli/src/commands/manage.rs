//! Create, show and delete

use super::resolve_id;
use crate::console::{CLIConsole, format};
use crate::router::Outcome;
use colored::*;
use rewind_core::CheckpointEngine;

/// Snapshot the workspace as a manual checkpoint
pub async fn create(
    engine: &CheckpointEngine,
    console: &CLIConsole,
    session: &str,
    label: Option<String>,
) -> anyhow::Result<Outcome> {
    let checkpoint = engine.create_manual(session, label).await?;
    console.success(&format!(
        "Created {} ({} files, {})",
        checkpoint.id,
        checkpoint.file_count(),
        format::bytes(checkpoint.total_size())
    ));
    if let Some(git) = &checkpoint.git_state {
        console.info(&format!("Git HEAD {}", git.commit_hash));
    }
    Ok(Outcome::Success)
}

/// Print a checkpoint's metadata and file list
pub async fn show(engine: &CheckpointEngine, console: &CLIConsole, raw_id: &str) -> anyhow::Result<Outcome> {
    let id = resolve_id(engine, raw_id)?;
    let Some(checkpoint) = engine.get(&id).await? else {
        anyhow::bail!("Checkpoint {} disappeared while reading it", id);
    };
    let root = engine.workspace_root();

    console.print_header(&format!("Checkpoint {}", checkpoint.id));
    console.print_field("Created", &format::timestamp(&checkpoint.timestamp));
    console.print_field("Label", checkpoint.label.as_deref().unwrap_or("-"));
    console.print_field("Session", &checkpoint.session_id);
    console.print_field("Trigger", &checkpoint.metadata.trigger.to_string());
    if let Some(tool) = &checkpoint.metadata.tool_name {
        console.print_field("Tool", tool);
    }
    console.print_field("Created by", &checkpoint.metadata.created_by);
    console.print_field(
        "Parent",
        &checkpoint
            .parent_id
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(format::none),
    );
    console.print_field(
        "Size",
        &format!(
            "{} files, {}",
            checkpoint.file_count(),
            format::bytes(checkpoint.total_size())
        ),
    );

    match &checkpoint.git_state {
        Some(git) => {
            let branch = git.branch.as_deref().unwrap_or("(detached)");
            let state = if git.is_clean { "clean".green() } else { "dirty".yellow() };
            console.print_field("Git", &format!("{} @ {} ({})", branch, git.commit_hash, state));
        }
        None => console.print_field("Git", &format::none()),
    }

    console.print_separator();
    for file in &checkpoint.files {
        println!(
            "  {:>10}  {}  {}",
            format::bytes(file.size),
            file.hash.get(..12).unwrap_or(file.hash.as_str()).dimmed(),
            format::path(&file.path, root)
        );
    }
    Ok(Outcome::Success)
}

/// Delete a checkpoint from the store
pub async fn delete(engine: &CheckpointEngine, console: &CLIConsole, raw_id: &str) -> anyhow::Result<Outcome> {
    let id = resolve_id(engine, raw_id)?;
    if engine.delete(&id).await? {
        console.success(&format!("Deleted {}", id));
    } else {
        console.warn(&format!("Checkpoint {} was already gone", id));
    }
    Ok(Outcome::Success)
}
