//! Acquisition orchestrator.
//!
//! Walks the ladder produced by [`resolve`] with one loop. Each rung first
//! asks whether it is still needed given what has been placed so far, then
//! tries its candidates. Every per-candidate and per-asset failure is caught
//! and recorded. Only an invalid identifier, cancellation or a run that
//! placed nothing at all surface as errors.
//!
//! Within a rung, release assets and listed include files are fetched
//! concurrently (bounded by `max_concurrent_downloads`). Rungs themselves run
//! strictly in order.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;

use bytes::Bytes;
use futures::StreamExt;
use pawnpkg_schema::{
    ArchiveFormat, Artifact, ContentHint, ContentType, PackageId, RepoKey, Role,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::classify::{Classification, classify, classify_with_hint, file_name};
use crate::io::download::fetch_bytes;
use crate::io::extract::{detect_format, extract};
use crate::ops::context::Context;
use crate::ops::error::{AcquireError, SourceFailure};
use crate::ops::place::{
    DestinationRoots, PlaceError, Placement, PlacedArtifact, PlacementEngine,
};
use crate::paths::filename_from_url;
use crate::reporter::Stage;
use crate::resolver::{Rung, RungKind, SourceCandidate, resolve};

/// What one acquisition produced. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionResult {
    /// The identifier in its normalized form.
    pub identifier: String,
    /// Written files in placement order.
    pub placed: Vec<PlacedArtifact>,
    /// Failures that were recovered from.
    pub errors: Vec<SourceFailure>,
    pub rungs_attempted: Vec<RungKind>,
}

impl AcquisitionResult {
    pub fn succeeded(&self) -> bool {
        !self.placed.is_empty()
    }

    pub fn placed_paths(&self) -> impl Iterator<Item = &Path> {
        self.placed.iter().map(|p| p.path.as_path())
    }

    fn count(&self, role: Role) -> usize {
        self.placed.iter().filter(|p| p.role == role).count()
    }

    pub fn header_count(&self) -> usize {
        self.count(Role::Header)
    }

    /// Plugins placed. Components are not counted.
    pub fn plugin_count(&self) -> usize {
        self.count(Role::Plugin)
    }

    pub fn component_count(&self) -> usize {
        self.count(Role::Component)
    }
}

/// The last recorded failure of each rung, in ladder order.
pub fn last_error_per_rung<'a>(
    rungs: &[RungKind],
    errors: &'a [SourceFailure],
) -> Vec<(RungKind, Option<&'a SourceFailure>)> {
    rungs
        .iter()
        .map(|rung| (*rung, errors.iter().rev().find(|e| e.rung == *rung)))
        .collect()
}

/// Acquire a package into `roots`.
///
/// # Errors
///
/// - [`AcquireError::InvalidIdentifier`] before any network call.
/// - [`AcquireError::NoSourceFound`] when every rung ran and nothing was placed.
/// - [`AcquireError::Cancelled`] when `cancel` fires. Files already written stay.
pub async fn acquire(
    ctx: &Context,
    identifier: &str,
    roots: &DestinationRoots,
    cancel: &CancellationToken,
) -> Result<AcquisitionResult, AcquireError> {
    let id = PackageId::parse(identifier)?;
    let rungs = resolve(&id, &ctx.config);
    tracing::info!("acquiring {id} ({} rungs)", rungs.len());
    ctx.reporter.report(
        Stage::Resolve,
        &format!("{id}: {} source rungs", rungs.len()),
    );

    if cancel.is_cancelled() {
        return Err(AcquireError::Cancelled);
    }

    // Scoped to this call: removed on every return path, cancellation included.
    tokio::fs::create_dir_all(&ctx.staging_root).await?;
    let prefix = format!("pawnpkg-{}-", staging_key(&id.to_string()));
    let staging = tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(&ctx.staging_root)?;

    let run = Run {
        ctx,
        engine: PlacementEngine::new(roots.clone(), ctx.config.relocated_files.clone()),
        staging: staging.path(),
        errors: Mutex::new(Vec::new()),
        extractions: TaskTracker::new(),
    };

    let mut attempted = Vec::new();
    let cancelled = tokio::select! {
        biased;
        () = cancel.cancelled() => true,
        () = run.ladder(&rungs, &mut attempted) => false,
    };

    // Extractions orphaned by cancellation still write under `staging`.
    run.extractions.close();
    run.extractions.wait().await;
    if cancelled {
        tracing::warn!("acquisition of {id} cancelled");
        return Err(AcquireError::Cancelled);
    }

    let Run { engine, errors, .. } = run;
    let errors = errors.into_inner().unwrap_or_default();
    let placed = engine.into_placed();
    drop(staging);

    let result = AcquisitionResult {
        identifier: id.to_string(),
        placed,
        errors,
        rungs_attempted: attempted,
    };

    if result.header_count() == 0 {
        ctx.reporter
            .report(Stage::Summary, &format!("No include files found in {id}"));
    }
    if result.plugin_count() == 0 {
        ctx.reporter
            .report(Stage::Summary, &format!("No plugin files found in {id}"));
    }

    if !result.succeeded() {
        return Err(AcquireError::NoSourceFound {
            identifier: result.identifier,
            rungs_attempted: result.rungs_attempted,
            errors: result.errors,
        });
    }

    ctx.reporter.report(
        Stage::Summary,
        &format!(
            "{id}: {} include files, {} plugins, {} components",
            result.header_count(),
            result.plugin_count(),
            result.component_count()
        ),
    );
    Ok(result)
}

/// Entry point for front-ends. Same as [`acquire`].
pub async fn acquire_package(
    ctx: &Context,
    identifier: &str,
    roots: &DestinationRoots,
    cancel: &CancellationToken,
) -> Result<AcquisitionResult, AcquireError> {
    acquire(ctx, identifier, roots, cancel).await
}

/// Filesystem-safe, bounded form of an identifier for temp-dir names.
fn staging_key(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .take(48)
        .collect()
}

/// State of one acquisition in flight.
struct Run<'a> {
    ctx: &'a Context,
    engine: PlacementEngine,
    staging: &'a Path,
    errors: Mutex<Vec<SourceFailure>>,
    extractions: TaskTracker,
}

impl Run<'_> {
    async fn ladder(&self, rungs: &[Rung], attempted: &mut Vec<RungKind>) {
        for rung in rungs {
            let headers = self.engine.count(Role::Header).await;
            let plugins = self.engine.count(Role::Plugin).await;
            if !rung.kind.is_needed(headers, plugins) {
                tracing::debug!("skipping {} (headers={headers}, plugins={plugins})", rung.kind);
                continue;
            }

            attempted.push(rung.kind);
            tracing::info!("trying {}", rung.kind);
            self.report(rung.kind.stage(), format!("trying {}", rung.kind));

            for candidate in &rung.candidates {
                match self.candidate(rung.kind, candidate).await {
                    Ok(placed) => {
                        tracing::debug!("{} placed {placed} files", candidate.label());
                        if rung.kind.stops_at_first_success() {
                            break;
                        }
                    }
                    Err(e) => self.record(rung.kind, candidate.label(), &e),
                }
            }
        }
    }

    async fn candidate(
        &self,
        rung: RungKind,
        candidate: &SourceCandidate,
    ) -> Result<usize, AcquireError> {
        match candidate {
            SourceCandidate::ReleaseAssets(repo) => self.release_assets(repo).await,
            SourceCandidate::RepositoryListing { repo, path } => {
                self.repository_listing(repo, path).await
            }
            SourceCandidate::DirectUrl { url, .. } | SourceCandidate::MirrorUrl { url } => {
                let hint = candidate.hint();
                if rung == RungKind::DirectLink && hint == ContentHint::Unknown {
                    return Err(AcquireError::SourceUnavailable(
                        "unsupported file type".to_string(),
                    ));
                }
                self.report(rung.stage(), format!("downloading {url}"));
                self.fetch_and_process(rung, filename_from_url(url), url, hint, url)
                    .await
            }
        }
    }

    async fn release_assets(&self, repo: &RepoKey) -> Result<usize, AcquireError> {
        let Some(release) = self.bounded(self.ctx.github.latest_release(repo)).await? else {
            self.report(Stage::Release, format!("{repo} has no releases"));
            return Ok(0);
        };
        self.report(
            Stage::Release,
            format!(
                "release {} with {} assets",
                release.tag_name,
                release.assets.len()
            ),
        );

        let wanted: Vec<_> = release
            .assets
            .iter()
            .filter(|a| classify(&a.name) != Classification::Unclassified)
            .collect();

        let results: Vec<_> = futures::stream::iter(wanted)
            .map(|asset| async move {
                let r = self
                    .fetch_and_process(
                        RungKind::ReleaseAssets,
                        &asset.name,
                        &asset.browser_download_url,
                        ContentHint::Unknown,
                        &asset.name,
                    )
                    .await;
                (asset.name.as_str(), r)
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await;

        Ok(self.tally(RungKind::ReleaseAssets, results))
    }

    /// Walk the content listing for loose include files.
    ///
    /// Only directories whose path mentions `include` are entered, each at
    /// most once, and no deeper than `max_listing_depth`.
    async fn repository_listing(&self, repo: &RepoKey, root: &str) -> Result<usize, AcquireError> {
        let max_depth = self.ctx.config.max_listing_depth;
        let mut worklist = VecDeque::from([(root.to_string(), 0usize)]);
        let mut visited = HashSet::new();
        let mut files = Vec::new();

        while let Some((path, depth)) = worklist.pop_front() {
            if !visited.insert(path.clone()) {
                continue;
            }
            let entries = match self.bounded(self.ctx.github.contents(repo, &path)).await {
                Ok(entries) => entries,
                Err(e) if path == root => return Err(e),
                Err(e) => {
                    self.record(RungKind::RepositoryListing, format!("{repo} contents/{path}"), &e);
                    continue;
                }
            };

            for entry in entries {
                match entry.kind {
                    ContentType::File => {
                        if classify(&entry.name) != Classification::Artifact(Role::Header) {
                            continue;
                        }
                        if let Some(url) = entry.download_url {
                            files.push((entry.name, url));
                        }
                    }
                    ContentType::Dir
                        if depth < max_depth
                            && entry.path.to_ascii_lowercase().contains("include") =>
                    {
                        worklist.push_back((entry.path, depth + 1));
                    }
                    _ => {}
                }
            }
        }

        self.report(
            Stage::Listing,
            format!("{repo}: {} include files listed", files.len()),
        );

        let results: Vec<_> = futures::stream::iter(&files)
            .map(|(name, url)| async move {
                let r = self
                    .fetch_and_process(RungKind::RepositoryListing, name, url, ContentHint::Header, url)
                    .await;
                (name.as_str(), r)
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await;

        Ok(self.tally(RungKind::RepositoryListing, results))
    }

    /// Download, then extract/classify/place, all under the candidate timeout.
    async fn fetch_and_process(
        &self,
        rung: RungKind,
        name: &str,
        url: &str,
        hint: ContentHint,
        source: &str,
    ) -> Result<usize, AcquireError> {
        self.bounded(async {
            let bytes = fetch_bytes(&self.ctx.client, url).await?;
            self.process_payload(rung, name, bytes, hint, source).await
        })
        .await
    }

    async fn process_payload(
        &self,
        rung: RungKind,
        name: &str,
        bytes: Bytes,
        hint: ContentHint,
        source: &str,
    ) -> Result<usize, AcquireError> {
        if name.is_empty() {
            return Err(AcquireError::SourceUnavailable(format!(
                "no filename in {source}"
            )));
        }

        let class = match classify(name) {
            Classification::Unclassified => match detect_format(name, &bytes) {
                Some(format) => Classification::Archive(format),
                None => classify_with_hint(name, hint),
            },
            known => known,
        };

        match class {
            Classification::Artifact(role) => {
                let artifact = Artifact::new(name, role, bytes);
                Ok(self.place(&artifact, source).await?)
            }
            Classification::Archive(format) => self.unpack(rung, name, bytes, format, source).await,
            Classification::Unclassified => {
                tracing::debug!("dropping unclassified payload {name}");
                Ok(0)
            }
        }
    }

    async fn unpack(
        &self,
        rung: RungKind,
        name: &str,
        bytes: Bytes,
        format: ArchiveFormat,
        source: &str,
    ) -> Result<usize, AcquireError> {
        self.report(Stage::Extract, format!("extracting {name} ({format})"));

        let staging = self.staging.to_path_buf();
        let archive_name = name.to_string();
        let entries =
            self.extractions
                .spawn_blocking(move || extract(&archive_name, &bytes, format, &staging))
                .await
                .map_err(|e| AcquireError::ArchiveDecode {
                    name: name.to_string(),
                    reason: e.to_string(),
                })??;

        let mut placed = 0;
        for entry in entries {
            let role = match classify(&entry.path) {
                Classification::Artifact(role) => role,
                Classification::Archive(_) => {
                    tracing::debug!("not expanding nested archive {}", entry.path);
                    continue;
                }
                Classification::Unclassified => continue,
            };
            let artifact =
                Artifact::new(file_name(&entry.path), role, entry.bytes).with_entry_path(&entry.path);
            // One unwritable entry does not stop its siblings.
            match self.place(&artifact, source).await {
                Ok(n) => placed += n,
                Err(e) => self.record(rung, format!("{source}:{}", entry.path), &AcquireError::from(e)),
            }
        }
        Ok(placed)
    }

    async fn place(
        &self,
        artifact: &Artifact,
        source: &str,
    ) -> Result<usize, PlaceError> {
        match self.engine.place(artifact, source).await? {
            Placement::Written(path) => {
                self.report(
                    Stage::Place,
                    format!("{} -> {}", artifact.name(), path.display()),
                );
                Ok(1)
            }
            Placement::Duplicate(path) => {
                self.report(
                    Stage::Place,
                    format!("{} already placed, skipping", path.display()),
                );
                Ok(0)
            }
        }
    }

    async fn bounded<T, E>(&self, fut: impl Future<Output = Result<T, E>>) -> Result<T, AcquireError>
    where
        AcquireError: From<E>,
    {
        let limit = self.ctx.config.candidate_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(r) => r.map_err(AcquireError::from),
            Err(_) => Err(AcquireError::SourceUnavailable(format!(
                "timed out after {}s",
                limit.as_secs()
            ))),
        }
    }

    fn tally(&self, rung: RungKind, results: Vec<(&str, Result<usize, AcquireError>)>) -> usize {
        let mut placed = 0;
        for (source, r) in results {
            match r {
                Ok(n) => placed += n,
                Err(e) => self.record(rung, source, &e),
            }
        }
        placed
    }

    fn concurrency(&self) -> usize {
        self.ctx.config.max_concurrent_downloads.max(1)
    }

    fn record(&self, rung: RungKind, source: impl Into<String>, err: &AcquireError) {
        let failure = SourceFailure::new(rung, source, err);
        tracing::warn!("{failure}");
        self.report(rung.stage(), format!("failed: {failure}"));
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(failure);
        }
    }

    fn report(&self, stage: Stage, message: String) {
        self.ctx.reporter.report(stage, &message);
    }
}
