use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pawnpkg_core::io::sweep::{SweepReport, sweep_loose_files};
use pawnpkg_core::{DestinationRoots, Reporter};

use crate::ProjectArgs;
use crate::ui::{self, ConsoleReporter};

/// Move loose headers and plugins under `dir` into the project's destinations.
pub async fn sweep(dir: &Path, project: &ProjectArgs) -> Result<()> {
    let config = super::load_config(&super::home()?)?;
    let roots = project.roots().context("Failed to resolve project directories")?;
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(true));

    let report = run_sweep(dir, &roots, config.relocated_files, reporter).await?;
    ui::print_sweep_summary(dir, &report);
    Ok(())
}

/// Run the blocking sweep off the async runtime.
pub(crate) async fn run_sweep(
    dir: &Path,
    roots: &DestinationRoots,
    relocated: Vec<String>,
    reporter: Arc<dyn Reporter>,
) -> Result<SweepReport> {
    let source = dir.to_path_buf();
    let roots = roots.clone();
    let report = tokio::task::spawn_blocking(move || {
        sweep_loose_files(&source, &roots, &relocated, reporter.as_ref())
    })
    .await
    .context("Sweep task panicked")?
    .with_context(|| format!("Failed to sweep {}", dir.display()))?;
    Ok(report)
}
