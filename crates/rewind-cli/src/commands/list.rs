//! Listing and ancestry

use super::resolve_id;
use crate::console::{CLIConsole, format};
use crate::router::Outcome;
use colored::*;
use rewind_core::{CheckpointEngine, CheckpointListItem};

const ID_WIDTH: usize = 28;
const TIME_WIDTH: usize = 19;
const TRIGGER_WIDTH: usize = 16;
const FILES_WIDTH: usize = 6;

/// Print checkpoints newest first
pub fn list(
    engine: &CheckpointEngine,
    console: &CLIConsole,
    limit: Option<usize>,
    session: Option<&str>,
) -> anyhow::Result<Outcome> {
    let items = engine.list(limit, session);
    if items.is_empty() {
        console.warn("No checkpoints found");
        return Ok(Outcome::Success);
    }

    console.print_header(&format!("Checkpoints ({})", items.len()));
    print_items(console, &items);
    Ok(Outcome::Success)
}

/// Print a checkpoint and its ancestors, newest first
pub fn history(engine: &CheckpointEngine, console: &CLIConsole, raw_id: &str) -> anyhow::Result<Outcome> {
    let id = resolve_id(engine, raw_id)?;
    let chain = engine.history(&id)?;

    console.print_header(&format!("History of {}", id));
    print_items(console, &chain);
    if let Some(root) = chain.last() {
        if let Some(parent) = &root.parent_id {
            console.info(&format!("Older ancestors were pruned (next: {})", parent));
        }
    }
    Ok(Outcome::Success)
}

fn print_items(console: &CLIConsole, items: &[CheckpointListItem]) {
    console.print_table_header(&[
        ("ID", ID_WIDTH),
        ("CREATED", TIME_WIDTH),
        ("TRIGGER", TRIGGER_WIDTH),
        ("FILES", FILES_WIDTH),
        ("LABEL", 0),
    ]);

    for item in items {
        let timestamp = format::timestamp(&item.timestamp);
        let trigger = item.trigger.to_string();
        let files = item.file_count.to_string();
        let label = match (&item.label, &item.tool_name) {
            (Some(label), _) => format::truncate(label, 48),
            (None, Some(tool)) => format!("({})", tool).dimmed().to_string(),
            (None, None) => format::none(),
        };
        console.print_table_row(&[
            (item.id.as_str(), ID_WIDTH),
            (timestamp.as_str(), TIME_WIDTH),
            (trigger.as_str(), TRIGGER_WIDTH),
            (files.as_str(), FILES_WIDTH),
            (label.as_str(), 0),
        ]);
    }
}
