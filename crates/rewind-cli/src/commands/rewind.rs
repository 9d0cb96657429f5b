//! Rewind and preview

use super::resolve_id;
use crate::console::{CLIConsole, format};
use crate::router::Outcome;
use colored::*;
use rewind_core::checkpoints::{RestoreAction, SessionStateOutcome};
use rewind_core::{CheckpointEngine, RewindOptions, RewindResult};
use tokio_util::sync::CancellationToken;

/// Rewind the workspace, cancelling cleanly on Ctrl+C
pub async fn rewind(
    engine: &CheckpointEngine,
    console: &CLIConsole,
    raw_id: &str,
    options: RewindOptions,
) -> anyhow::Result<Outcome> {
    let id = resolve_id(engine, raw_id)?;

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping rewind");
                cancel.cancel();
            }
        })
    };
    let result = engine.rewind_with_cancel(&id, options, &cancel).await;
    watcher.abort();
    let result = result?;

    print_result(console, engine, &result);

    if result.success {
        Ok(Outcome::Success)
    } else {
        Ok(Outcome::Incomplete)
    }
}

fn print_result(console: &CLIConsole, engine: &CheckpointEngine, result: &RewindResult) {
    let root = engine.workspace_root();
    let title = if result.dry_run {
        format!("Rewind preview for {}", result.checkpoint_id)
    } else {
        format!("Rewind to {}", result.checkpoint_id)
    };
    console.print_header(&title);

    if let Some(safety) = &result.safety_checkpoint_id {
        console.info(&format!("Safety checkpoint {}", safety));
    }

    match &result.git_operations {
        Some(ops) if ops.is_empty() => console.info("Git HEAD already matches"),
        Some(ops) => {
            let verb = if result.dry_run { "would run" } else { "ran" };
            for op in ops {
                println!("  {} git {}", verb.dimmed(), op);
            }
        }
        None => {}
    }

    for action in result.actions.iter().filter(|a| a.action.is_change()) {
        let tag = match action.action {
            RestoreAction::Recreate => "recreate".green(),
            RestoreAction::Overwrite => "overwrite".yellow(),
            RestoreAction::Delete => "delete".red(),
            RestoreAction::Skip => "skip".dimmed(),
        };
        println!("  {:>9}  {}", tag, format::path(&action.path, root));
    }

    for (path, reason) in &result.failed_paths {
        console.error(&format!("{}: {}", format::path(path, root), reason));
    }

    match &result.session_state {
        SessionStateOutcome::NotRequested | SessionStateOutcome::Restored => {}
        SessionStateOutcome::Planned => console.info("Session state would be restored"),
        SessionStateOutcome::NoRestorer => {
            console.warn("No session-state restorer attached; only files were considered")
        }
        SessionStateOutcome::Failed(reason) => {
            console.warn(&format!("Session state not restored: {}", reason))
        }
    }

    console.print_separator();
    let changes = result.restored_count();
    if result.dry_run {
        if changes == 0 {
            console.success("Workspace already matches the checkpoint");
        } else {
            console.success(&format!("{} paths would change (phase: {})", changes, result.phase));
        }
    } else if result.success {
        console.success(&format!("Restored {} paths (phase: {})", changes, result.phase));
    } else {
        console.warn(&format!(
            "Restored {} paths, {} failed (phase: {})",
            changes,
            result.failed_count(),
            result.phase
        ));
    }
}
