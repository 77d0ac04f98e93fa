//! Loose-file sweep.
//!
//! Walks an already-unpacked directory tree, moves headers and plugins to
//! their destinations, then prunes directories left empty. The walk uses an
//! explicit stack and never follows symbolic links.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pawnpkg_schema::Role;
use serde::Serialize;

use crate::classify::{Classification, classify};
use crate::ops::place::DestinationRoots;
use crate::reporter::{Reporter, Stage};

/// A file moved by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweptFile {
    pub from: PathBuf,
    pub to: PathBuf,
    pub role: Role,
}

#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    pub moved: Vec<SweptFile>,
    pub removed_dirs: Vec<PathBuf>,
    /// Files that classified but could not be moved.
    pub failed: Vec<(PathBuf, String)>,
}

/// Sweep `source` for loose headers and plugins.
///
/// Archives, components and unclassified files are left where they are.
///
/// # Errors
///
/// Fails only when `source` itself cannot be read. Per-file problems are
/// collected in [`SweepReport::failed`].
pub fn sweep_loose_files(
    source: &Path,
    roots: &DestinationRoots,
    relocated: &[String],
    reporter: &dyn Reporter,
) -> io::Result<SweepReport> {
    let source = fs::canonicalize(source)?;
    let excluded: Vec<PathBuf> = [
        &roots.plugins_root,
        &roots.include_root,
        &roots.components_root,
    ]
    .into_iter()
    .filter_map(|p| fs::canonicalize(p).ok())
    .collect();

    let mut report = SweepReport::default();
    let mut visited = Vec::new();
    let mut stack = vec![source.clone()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir == source => return Err(e),
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", dir.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                tracing::debug!("not following symlink {}", path.display());
                continue;
            }
            if file_type.is_dir() {
                if excluded.iter().any(|root| *root == path) {
                    continue;
                }
                visited.push(path.clone());
                stack.push(path);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&source).unwrap_or(&path);
            let role = match classify(&relative.to_string_lossy()) {
                Classification::Artifact(role @ (Role::Plugin | Role::Header)) => role,
                _ => continue,
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let target = roots.target_path(&name, role, None, relocated);

            match move_file(&path, &target) {
                Ok(true) => {
                    reporter.report(
                        Stage::Sweep,
                        &format!("moved {} to {}", name, target.display()),
                    );
                    report.moved.push(SweptFile {
                        from: path,
                        to: target,
                        role,
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("failed to move {}: {e}", path.display());
                    report.failed.push((path, e.to_string()));
                }
            }
        }
    }

    // Deepest first so parents see their children gone.
    visited.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
    for dir in visited {
        if fs::remove_dir(&dir).is_ok() {
            tracing::debug!("removed empty directory {}", dir.display());
            report.removed_dirs.push(dir);
        }
    }

    Ok(report)
}

/// Copy then delete. Returns `false` when the file already sits at `target`.
fn move_file(from: &Path, target: &Path) -> io::Result<bool> {
    if let Ok(existing) = fs::canonicalize(target)
        && existing == from
    {
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, target)?;
    fs::remove_file(from)?;
    Ok(true)
}
