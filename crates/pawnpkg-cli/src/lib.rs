//! pawnpkg - plugin and include acquisition for Pawn projects
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pawnpkg_core::DestinationRoots;

pub mod cmd;
pub mod ui;

#[derive(Parser, Debug)]
#[command(name = "pawnpkg")]
#[command(author, version, about = "Fetch SA-MP/open.mp plugins and includes into a Pawn project", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire a package and record it in the project manifest
    Install {
        /// `owner/repo`, a direct URL, or a bare name (e.g. `streamer`)
        identifier: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// After installing, move loose headers and plugins found under DIR
        #[arg(long, value_name = "DIR")]
        sweep: Option<PathBuf>,

        /// Print every progress event
        #[arg(short, long)]
        verbose: bool,
    },
    /// Move loose headers and plugins under DIR into the project's destinations
    Sweep {
        /// Directory to scan
        dir: PathBuf,

        #[command(flatten)]
        project: ProjectArgs,
    },
    /// List identifiers recorded as installed
    List,
    /// Generate shell completions
    Completions {
        /// Shell to generate for
        shell: clap_complete::Shell,
    },
}

/// Where the project lives and where its files go.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, env = "PAWNPKG_PROJECT", value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Include destination (defaults to <project>/qawno/include)
    #[arg(long, value_name = "DIR")]
    pub include_dir: Option<PathBuf>,

    /// Plugin destination (defaults to <project>/plugins)
    #[arg(long, value_name = "DIR")]
    pub plugins_dir: Option<PathBuf>,
}

impl ProjectArgs {
    /// The absolute project root.
    pub fn project_root(&self) -> std::io::Result<PathBuf> {
        match &self.project {
            Some(p) => std::path::absolute(p),
            None => std::env::current_dir(),
        }
    }

    /// Destination roots with defaults filled in.
    pub fn roots(&self) -> std::io::Result<DestinationRoots> {
        let project = self.project_root()?;
        let resolve = |explicit: &Option<PathBuf>, default: PathBuf| match explicit {
            Some(p) => std::path::absolute(p),
            None => Ok(default),
        };
        let plugins = resolve(&self.plugins_dir, project.join("plugins"))?;
        let include = resolve(&self.include_dir, project.join("qawno").join("include"))?;
        Ok(DestinationRoots::new(plugins, include))
    }
}
