//! # CLI Commands
//!
//! clap-based command definitions and the `cmd_*` implementations the
//! binary dispatches to. Commands are plain functions so integration
//! tests can call them without spawning a process.

use clap::{Parser, Subcommand};
use sakip_core::{Achievement, Decimal2, WorkflowEngine, WorkflowError};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// SAKIP workflow server and CLI.
#[derive(Debug, Parser)]
#[command(name = "sakip", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new workflow database.
    Init {
        /// Database file path.
        #[arg(long, default_value = "sakip.redb")]
        path: PathBuf,
        /// Overwrite an existing database.
        #[arg(long)]
        force: bool,
    },
    /// Serve the HTTP API over an existing database.
    Serve {
        /// Database file path.
        #[arg(long, default_value = "sakip.redb")]
        path: PathBuf,
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Compute an achievement percentage and status label.
    Achievement {
        /// Actual value.
        #[arg(long)]
        actual: Decimal2,
        /// Yearly target value.
        #[arg(long)]
        target: Option<Decimal2>,
        /// Optional minimum floor.
        #[arg(long)]
        minimum: Option<Decimal2>,
    },
}

/// Errors surfaced by the command layer.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("database already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Engine(#[from] WorkflowError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create the database file, refusing to clobber one unless forced.
pub fn cmd_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() {
        if !force {
            return Err(CliError::AlreadyExists(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
    }
    let _engine = WorkflowEngine::open(path)?;
    tracing::info!(path = %path.display(), "database initialized");
    Ok(())
}

/// Pure achievement computation for scripting use.
#[must_use]
pub fn cmd_achievement(
    actual: Decimal2,
    target: Option<Decimal2>,
    minimum: Option<Decimal2>,
) -> Achievement {
    sakip_core::achievement(actual, target, minimum)
}

/// Open the database and serve the HTTP API until the process is stopped.
pub async fn cmd_serve(path: &Path, addr: SocketAddr) -> Result<(), CliError> {
    let engine = Arc::new(WorkflowEngine::open(path)?);
    let app = crate::api::router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, path = %path.display(), "serving");
    axum::serve(listener, app).await?;
    Ok(())
}
