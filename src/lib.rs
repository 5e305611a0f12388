//! # ServerCommander
//!
//! Operator CLI over a registry of stored sessions. The FTP/FTPS client
//! lives in `srvcmd-ftp`, the registry in `srvcmd-core`; this crate wires
//! them to the command line.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod prompt;

use anyhow::Result;
use cli::{Cli, Command};
use srvcmd_core::paths;
use std::path::PathBuf;

/// Resolve the config root, install logging and dispatch one command.
pub async fn run(cli: Cli) -> Result<()> {
    let root = config_root(cli.config_dir)?;
    logging::init(cli.verbose, Some(&paths::log_file(&root)));
    tracing::debug!("config root: {}", root.display());

    let sessions_file = paths::sessions_file(&root);
    let mut stdout = std::io::stdout();
    let result = match cli.command {
        Command::Session { action } => commands::session::run(action, &sessions_file, &mut stdout),
        Command::Ftp { action } => commands::ftp::run(action, &sessions_file, &mut stdout).await,
    };
    if let Err(e) = &result {
        tracing::info!("command failed: {:#}", e);
    }
    result
}

fn config_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => {
            paths::create_private_dir(&dir)?;
            Ok(dir)
        }
        None => Ok(paths::config_root()?),
    }
}
