//! Subcommand implementations.

pub mod completions;
pub mod install;
pub mod list;
pub mod sweep;

use std::path::PathBuf;

use anyhow::{Context, Result};
use pawnpkg_core::{Config, config_path, try_pawnpkg_home};

/// The pawnpkg home directory.
pub fn home() -> Result<PathBuf> {
    try_pawnpkg_home().context("Could not determine home directory (set PAWNPKG_HOME)")
}

/// `<home>/config.toml` with environment overrides applied.
pub fn load_config(home: &std::path::Path) -> Result<Config> {
    let path = config_path(home);
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(config.with_env_overrides())
}
