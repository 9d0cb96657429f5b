//! Command routing logic for CLI

use crate::args::{Cli, Commands, DEFAULT_CONFIG_FILE};
use crate::commands;
use crate::console::CLIConsole;
use anyhow::Context;
use rewind_core::{CheckpointEngine, EngineConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// How a command finished when it did not error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Completed, but with failed paths or merge conflicts
    Incomplete,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Incomplete => ExitCode::from(1),
        }
    }
}

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<Outcome> {
    let console = CLIConsole::new(cli.verbose);
    let engine = open_engine(&cli).await?;
    console.info(&format!(
        "Workspace {} ({} checkpoints)",
        engine.workspace_root().display(),
        engine.len()
    ));

    match cli.command {
        Commands::List { limit, session } => {
            commands::list::list(&engine, &console, limit, session.as_deref())
        }
        Commands::Create { label, session } => {
            commands::manage::create(&engine, &console, &session, label).await
        }
        Commands::Show { id } => commands::manage::show(&engine, &console, &id).await,
        Commands::Rewind {
            id,
            dry_run,
            no_safety_checkpoint,
            files_only,
            session_state_only,
        } => {
            let options = rewind_core::RewindOptions::from_flags(
                dry_run,
                no_safety_checkpoint,
                files_only,
                session_state_only,
            );
            commands::rewind::rewind(&engine, &console, &id, options).await
        }
        Commands::Delete { id } => commands::manage::delete(&engine, &console, &id).await,
        Commands::History { id } => commands::list::history(&engine, &console, &id),
        Commands::Diff { a, b } => commands::merge::diff(&engine, &console, &a, &b).await,
        Commands::Merge { a, b } => commands::merge::merge(&engine, &console, &a, &b).await,
    }
}

/// Resolve the workspace and config file, then open the engine
pub async fn open_engine(cli: &Cli) -> anyhow::Result<CheckpointEngine> {
    let workspace = match &cli.workspace {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| workspace.join(DEFAULT_CONFIG_FILE));

    let config = load_config(&config_path, workspace)?;
    CheckpointEngine::open(config)
        .await
        .context("Failed to open checkpoint store")
}

fn load_config(path: &Path, workspace: PathBuf) -> anyhow::Result<EngineConfig> {
    EngineConfig::load(path, workspace)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
