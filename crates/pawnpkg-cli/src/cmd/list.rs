use anyhow::{Context, Result};
use pawnpkg_core::db_path;
use pawnpkg_core::store::{InstallLedger, SqliteStore};

/// List identifiers recorded as installed, in install order.
pub fn list() -> Result<()> {
    let home = super::home()?;
    let store = SqliteStore::open_at(&db_path(&home)).context("Failed to open state database")?;
    let installed = InstallLedger::new(store)
        .installed()
        .context("Failed to read installed packages")?;

    if installed.is_empty() {
        println!();
        println!("  No packages installed.");
        println!("  Run 'pawnpkg install <owner/repo>' to get started.");
        return Ok(());
    }

    for identifier in &installed {
        println!("{identifier}");
    }
    Ok(())
}
