//! # SAKIP Binary
//!
//! Parses the command line, installs tracing, and dispatches to the
//! command implementations in the library crate.

use clap::Parser;
use sakip::cli::{cmd_achievement, cmd_init, cmd_serve, Cli, CliError, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Init { path, force } => cmd_init(&path, force),
        Command::Serve { path, addr } => cmd_serve(&path, addr).await,
        Command::Achievement {
            actual,
            target,
            minimum,
        } => {
            let result = cmd_achievement(actual, target, minimum);
            println!("{} {}", result.percentage, result.status);
            Ok(())
        }
    }
}
