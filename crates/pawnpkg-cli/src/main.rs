//! pawnpkg - plugin and include acquisition for Pawn projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pawnpkg_cli::cmd;
use pawnpkg_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Install { verbose: true, .. });
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install {
            identifier,
            project,
            sweep,
            verbose,
        } => cmd::install::install(&identifier, &project, sweep, verbose).await,
        Commands::Sweep { dir, project } => cmd::sweep::sweep(&dir, &project).await,
        Commands::List => cmd::list::list(),
        Commands::Completions { shell } => cmd::completions::completions(shell),
    }
}
