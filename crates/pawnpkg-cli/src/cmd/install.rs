use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use pawnpkg_core::ops::install_package;
use pawnpkg_core::store::{InstallLedger, SqliteStore};
use pawnpkg_core::{AcquireError, Context, MANIFEST_FILE, Reporter, db_path, tmp_path};
use tokio_util::sync::CancellationToken;

use crate::ProjectArgs;
use crate::ui::{self, ConsoleReporter};

/// Acquire `identifier` into the project, then record it.
pub async fn install(
    identifier: &str,
    project: &ProjectArgs,
    sweep: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let home = super::home()?;
    let config = super::load_config(&home)?;
    let relocated = config.relocated_files.clone();
    let roots = project.roots().context("Failed to resolve project directories")?;
    let manifest = project
        .project_root()
        .context("Failed to resolve project directory")?
        .join(MANIFEST_FILE);

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(verbose));
    let ctx = Context::new(config, reporter.clone(), tmp_path(&home))
        .context("Failed to build HTTP client")?;
    let store = SqliteStore::open_at(&db_path(&home)).context("Failed to open state database")?;
    let ledger = InstallLedger::new(store);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome =
        match install_package(&ctx, &ledger, identifier, &roots, &manifest, &cancel).await {
            Ok(outcome) => outcome,
            Err(AcquireError::NoSourceFound {
                identifier,
                rungs_attempted,
                errors,
            }) => {
                ui::print_failure_report(&identifier, &rungs_attempted, &errors);
                bail!("No source found for {identifier}");
            }
            Err(e) => return Err(e).context(format!("Failed to install {}", identifier.trim())),
        };

    ui::print_install_summary(&outcome.result, &roots, outcome.previously_installed);

    if let Some(dir) = sweep {
        let report = super::sweep::run_sweep(&dir, &roots, relocated, reporter).await?;
        ui::print_sweep_summary(&dir, &report);
    }

    Ok(())
}
