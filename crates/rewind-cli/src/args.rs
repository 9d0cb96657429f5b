//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default configuration file, relative to the workspace root
pub const DEFAULT_CONFIG_FILE: &str = ".agent/rewind.toml";

/// Session ID used for checkpoints created from the command line
pub const DEFAULT_SESSION_ID: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(about = "Workspace checkpoints and deterministic rewind")]
#[command(
    long_about = r#"Rewind - workspace checkpoints and deterministic rewind

USAGE:
  rewind list                      # Newest checkpoints first
  rewind create --label "before"   # Snapshot the workspace now
  rewind show <id>                 # Files and git state of a checkpoint
  rewind rewind <id> --dry-run     # Preview what a rewind would change
  rewind rewind <id>               # Restore the workspace
  rewind merge <a> <b>             # Merge checkpoint b into a

Checkpoint IDs may be abbreviated to any unique prefix."#
)]
#[command(version)]
pub struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(long, short = 'w', global = true, env = "REWIND_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List checkpoints, newest first
    List {
        /// Show at most this many checkpoints
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Only checkpoints from this session
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Create a manual checkpoint of the workspace
    Create {
        /// Human-readable label
        #[arg(long, short)]
        label: Option<String>,

        /// Session to record the checkpoint under
        #[arg(long, short, default_value = DEFAULT_SESSION_ID)]
        session: String,
    },

    /// Show one checkpoint in detail
    Show {
        /// Checkpoint ID or unique prefix
        id: String,
    },

    /// Restore the workspace to a checkpoint
    Rewind {
        /// Checkpoint ID or unique prefix
        id: String,

        /// Compute and print the plan without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the safety checkpoint taken before restoring
        #[arg(long)]
        no_safety_checkpoint: bool,

        /// Restore files only
        #[arg(long)]
        files_only: bool,

        /// Restore session state only
        #[arg(long)]
        session_state_only: bool,
    },

    /// Delete a checkpoint
    Delete {
        /// Checkpoint ID or unique prefix
        id: String,
    },

    /// Show the ancestry of a checkpoint
    History {
        /// Checkpoint ID or unique prefix
        id: String,
    },

    /// Compare two checkpoints path by path
    Diff {
        /// Base checkpoint
        a: String,
        /// Checkpoint compared against the base
        b: String,
    },

    /// Merge checkpoint B into checkpoint A
    Merge {
        /// Checkpoint merged into
        a: String,
        /// Checkpoint merged from
        b: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rewind_flags() {
        let cli = Cli::try_parse_from([
            "rewind",
            "rewind",
            "chk_1",
            "--dry-run",
            "--files-only",
            "--no-safety-checkpoint",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Commands::Rewind {
                id: "chk_1".to_string(),
                dry_run: true,
                no_safety_checkpoint: true,
                files_only: true,
                session_state_only: false,
            }
        );
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rewind",
            "list",
            "--limit",
            "5",
            "--workspace",
            "/tmp/ws",
            "--log-format",
            "json",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
        assert_eq!(
            cli.command,
            Commands::List {
                limit: Some(5),
                session: None
            }
        );
    }

    #[test]
    fn test_create_defaults_session() {
        let cli = Cli::try_parse_from(["rewind", "create"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Create {
                label: None,
                session: DEFAULT_SESSION_ID.to_string()
            }
        );
    }

    #[test]
    fn test_merge_requires_two_ids() {
        assert!(Cli::try_parse_from(["rewind", "merge", "chk_1"]).is_err());
        assert!(Cli::try_parse_from(["rewind"]).is_err());
    }
}
