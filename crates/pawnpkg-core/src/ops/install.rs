//! Installation: acquisition plus bookkeeping.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::ops::acquire::{AcquisitionResult, acquire};
use crate::ops::context::Context;
use crate::ops::error::AcquireError;
use crate::ops::place::DestinationRoots;
use crate::reporter::Stage;
use crate::store::{InstallLedger, StateStore, update_manifest};

#[derive(Debug)]
pub struct InstallOutcome {
    pub result: AcquisitionResult,
    /// The ledger already listed this identifier before the run.
    pub previously_installed: bool,
}

/// Acquire `identifier`, then record it in the ledger and the manifest.
///
/// Nothing is recorded unless the acquisition placed at least one file.
///
/// # Errors
///
/// Any [`AcquireError`] from [`acquire`], or [`AcquireError::Ledger`] when
/// the ledger or manifest cannot be written.
pub async fn install_package<S: StateStore>(
    ctx: &Context,
    ledger: &InstallLedger<S>,
    identifier: &str,
    roots: &DestinationRoots,
    manifest_path: &Path,
    cancel: &CancellationToken,
) -> Result<InstallOutcome, AcquireError> {
    let result = acquire(ctx, identifier, roots, cancel).await?;

    let added = ledger.record(&result.identifier)?;
    update_manifest(manifest_path, &result.identifier)?;

    let note = if added {
        "recorded as installed"
    } else {
        "already installed, files refreshed"
    };
    ctx.reporter
        .report(Stage::Ledger, &format!("{}: {note}", result.identifier));

    Ok(InstallOutcome {
        result,
        previously_installed: !added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::reporter::NullReporter;
    use crate::store::{MemoryStore, PackageManifest};
    use mockito::Server;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_install_twice_is_idempotent() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/Y-Less/sscanf/releases/latest")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "tag_name": "v2",
                    "assets": [{"name": "sscanf.so",
                                "browser_download_url": format!("{}/dl/sscanf.so", server.url())}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _listing = server
            .mock("GET", "/repos/Y-Less/sscanf/contents")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let _file = server
            .mock("GET", "/dl/sscanf.so")
            .with_status(200)
            .with_body("elf")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let config = Config {
            api_base: server.url(),
            mirrors: Vec::new(),
            ..Config::default()
        };
        let ctx = Context::new(config, Arc::new(NullReporter), dir.path().join("tmp")).unwrap();
        let roots = DestinationRoots::new(dir.path().join("plugins"), dir.path().join("include"));
        let manifest = dir.path().join("pawn-package.json");
        let ledger = InstallLedger::new(MemoryStore::new());
        let cancel = CancellationToken::new();

        let first = install_package(&ctx, &ledger, "Y-Less/sscanf", &roots, &manifest, &cancel)
            .await
            .unwrap();
        let second = install_package(&ctx, &ledger, " Y-Less/sscanf ", &roots, &manifest, &cancel)
            .await
            .unwrap();

        assert!(!first.previously_installed);
        assert!(second.previously_installed);
        assert_eq!(ledger.installed().unwrap(), vec!["Y-Less/sscanf"]);
        assert_eq!(
            first.result.placed_paths().collect::<Vec<_>>(),
            second.result.placed_paths().collect::<Vec<_>>()
        );

        let m = PackageManifest::load(&manifest);
        let deps = m.dependencies().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps["Y-Less/sscanf"], "*");
    }

    #[tokio::test]
    async fn test_failed_install_records_nothing() {
        let dir = tempdir().unwrap();
        let config = Config {
            mirrors: Vec::new(),
            ..Config::default()
        };
        let ctx = Context::new(config, Arc::new(NullReporter), dir.path().join("tmp")).unwrap();
        let roots = DestinationRoots::new(dir.path().join("plugins"), dir.path().join("include"));
        let manifest = dir.path().join("pawn-package.json");
        let ledger = InstallLedger::new(MemoryStore::new());

        let err = install_package(
            &ctx,
            &ledger,
            "ftp-less/../x",
            &roots,
            &manifest,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AcquireError::InvalidIdentifier(_)));
        assert!(ledger.installed().unwrap().is_empty());
        assert!(!manifest.exists());
    }
}
