//! Rewind CLI
//!
//! Inspect and restore workspace checkpoints from the command line.
//!
//! ```bash
//! rewind list --limit 10
//! rewind create --label "before refactor"
//! rewind rewind chk_1718000000000_3 --dry-run
//! ```
//!
//! Exit codes: `0` on success, `1` when a rewind left failed paths or a merge
//! found conflicts, `2` on any error.

#![allow(clippy::collapsible_if)]

mod args;
mod commands;
mod console;
mod router;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use args::{Cli, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match router::route(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            console::CLIConsole::new(false).error(&format!("{e:#}"));
            ExitCode::from(2)
        }
    }
}

/// RUST_LOG wins over the `--verbose` default
fn init_logging(verbose: bool, format: LogFormat) {
    let default = if verbose { "rewind_core=debug,rewind=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
