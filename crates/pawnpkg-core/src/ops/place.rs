//! Placement engine: decides where an artifact lands and writes it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pawnpkg_schema::{Artifact, Role};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::classify::{component_subpath, file_name, is_relocated};

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("cannot write {path}: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where classified artifacts go. Supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRoots {
    pub plugins_root: PathBuf,
    pub include_root: PathBuf,
    /// Always `<parent of plugins_root>/components`.
    pub components_root: PathBuf,
}

impl DestinationRoots {
    pub fn new(plugins_root: impl Into<PathBuf>, include_root: impl Into<PathBuf>) -> Self {
        let plugins_root = plugins_root.into();
        let components_root = plugins_root
            .parent()
            .unwrap_or(&plugins_root)
            .join("components");
        Self {
            plugins_root,
            include_root: include_root.into(),
            components_root,
        }
    }

    /// Parent of the plugins root: where the server executable lives.
    pub fn project_root(&self) -> &Path {
        self.plugins_root.parent().unwrap_or(&self.plugins_root)
    }

    /// Final on-disk path for a file of `role`.
    ///
    /// Relocated names go to the project root whatever their role; components
    /// keep their path below the archive's `components/` segment.
    pub fn target_path(
        &self,
        name: &str,
        role: Role,
        entry_path: Option<&str>,
        relocated: &[String],
    ) -> PathBuf {
        let name = file_name(name);
        if is_relocated(name, relocated) {
            return self.project_root().join(name);
        }
        match role {
            Role::Plugin => self.plugins_root.join(name),
            Role::Header => self.include_root.join(name),
            Role::Component => {
                let sub = entry_path
                    .and_then(component_subpath)
                    .unwrap_or_else(|| name.to_string());
                self.components_root.join(sub)
            }
        }
    }

    pub fn target_for(&self, artifact: &Artifact, relocated: &[String]) -> PathBuf {
        self.target_path(
            artifact.name(),
            artifact.role(),
            artifact.entry_path(),
            relocated,
        )
    }
}

/// A file written during one acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedArtifact {
    pub path: PathBuf,
    pub role: Role,
    /// The candidate (asset name or URL) it came from.
    pub source: String,
}

/// Result of a single placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Written(PathBuf),
    /// An earlier artifact in this run already claimed the path.
    Duplicate(PathBuf),
}

#[derive(Debug, Default)]
struct Placed {
    order: Vec<PlacedArtifact>,
    paths: HashSet<PathBuf>,
}

/// Writes artifacts for one acquisition run. The first writer of a path wins.
#[derive(Debug)]
pub struct PlacementEngine {
    roots: DestinationRoots,
    relocated: Vec<String>,
    placed: Mutex<Placed>,
}

impl PlacementEngine {
    pub fn new(roots: DestinationRoots, relocated: Vec<String>) -> Self {
        Self {
            roots,
            relocated,
            placed: Mutex::new(Placed::default()),
        }
    }

    /// Place one artifact.
    ///
    /// The lock is held from the duplicate check until the path is appended,
    /// so two concurrent writers can never both be first.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceError::DestinationUnwritable`] if the directory or file
    /// cannot be written. Nothing is recorded in that case.
    pub async fn place(&self, artifact: &Artifact, source: &str) -> Result<Placement, PlaceError> {
        let target = self.roots.target_for(artifact, &self.relocated);
        let mut placed = self.placed.lock().await;

        if placed.paths.contains(&target) {
            tracing::debug!("skipping duplicate {}", target.display());
            return Ok(Placement::Duplicate(target));
        }

        write_file(&target, artifact.bytes()).await?;
        tracing::info!("placed {} ({})", target.display(), artifact.role());

        placed.paths.insert(target.clone());
        placed.order.push(PlacedArtifact {
            path: target.clone(),
            role: artifact.role(),
            source: source.to_string(),
        });
        Ok(Placement::Written(target))
    }

    /// Count of written artifacts with the given role.
    pub async fn count(&self, role: Role) -> usize {
        self.placed
            .lock()
            .await
            .order
            .iter()
            .filter(|p| p.role == role)
            .count()
    }

    pub fn into_placed(self) -> Vec<PlacedArtifact> {
        self.placed.into_inner().order
    }
}

async fn write_file(target: &Path, bytes: &[u8]) -> Result<(), PlaceError> {
    let unwritable = |source| PlaceError::DestinationUnwritable {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(unwritable)?;
    }
    tokio::fs::write(target, bytes).await.map_err(unwritable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn roots(base: &Path) -> DestinationRoots {
        DestinationRoots::new(base.join("plugins"), base.join("qawno/include"))
    }

    #[test]
    fn test_components_root_derived() {
        let r = roots(Path::new("/srv/game"));
        assert_eq!(r.components_root, PathBuf::from("/srv/game/components"));
        assert_eq!(r.project_root(), Path::new("/srv/game"));
    }

    #[test]
    fn test_targets_by_role() {
        let r = roots(Path::new("/p"));
        assert_eq!(
            r.target_path("sscanf.dll", Role::Plugin, None, &[]),
            PathBuf::from("/p/plugins/sscanf.dll")
        );
        assert_eq!(
            r.target_path("a.inc", Role::Header, Some("include/a.inc"), &[]),
            PathBuf::from("/p/qawno/include/a.inc")
        );
        assert_eq!(
            r.target_path("x.dll", Role::Component, Some("pkg/components/sub/x.dll"), &[]),
            PathBuf::from("/p/components/sub/x.dll")
        );
    }

    #[test]
    fn test_relocation_overrides_role() {
        let r = roots(Path::new("/p"));
        assert_eq!(
            r.target_path("AMXSSCANF.SO", Role::Plugin, None, &[]),
            PathBuf::from("/p/AMXSSCANF.SO")
        );
        assert_eq!(
            r.target_path("extra.dll", Role::Plugin, None, &["extra.dll".to_string()]),
            PathBuf::from("/p/extra.dll")
        );
    }

    #[tokio::test]
    async fn test_place_creates_dirs_and_dedups() {
        let dir = tempdir().unwrap();
        let engine = PlacementEngine::new(roots(dir.path()), Vec::new());

        let first = Artifact::new("a.inc", Role::Header, Bytes::from_static(b"first"));
        let second = Artifact::new("a.inc", Role::Header, Bytes::from_static(b"second"));

        let p1 = engine.place(&first, "release").await.unwrap();
        let p2 = engine.place(&second, "listing").await.unwrap();

        let target = dir.path().join("qawno/include/a.inc");
        assert_eq!(p1, Placement::Written(target.clone()));
        assert_eq!(p2, Placement::Duplicate(target.clone()));
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        let placed = engine.into_placed();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].source, "release");
    }

    #[tokio::test]
    async fn test_concurrent_writers_single_winner() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(PlacementEngine::new(roots(dir.path()), Vec::new()));

        let mut handles = Vec::new();
        for i in 0u8..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let a = Artifact::new("b.so", Role::Plugin, Bytes::from(vec![i]));
                engine.place(&a, "asset").await.unwrap()
            }));
        }

        let mut written = 0;
        for h in handles {
            if matches!(h.await.unwrap(), Placement::Written(_)) {
                written += 1;
            }
        }
        assert_eq!(written, 1);
        assert_eq!(engine.count(Role::Plugin).await, 1);
    }

    #[tokio::test]
    async fn test_unwritable_destination() {
        let dir = tempdir().unwrap();
        // A file where the plugins directory should be.
        std::fs::write(dir.path().join("plugins"), b"").unwrap();
        let engine = PlacementEngine::new(roots(dir.path()), Vec::new());

        let a = Artifact::new("b.so", Role::Plugin, Bytes::from_static(b"x"));
        let err = engine.place(&a, "asset").await.unwrap_err();
        assert!(matches!(err, PlaceError::DestinationUnwritable { .. }));
        assert_eq!(engine.count(Role::Plugin).await, 0);
        assert!(engine.into_placed().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_overwrites() {
        let dir = tempdir().unwrap();
        let a = Artifact::new("b.so", Role::Plugin, Bytes::from_static(b"v1"));
        PlacementEngine::new(roots(dir.path()), Vec::new())
            .place(&a, "asset")
            .await
            .unwrap();

        let b = Artifact::new("b.so", Role::Plugin, Bytes::from_static(b"v2"));
        PlacementEngine::new(roots(dir.path()), Vec::new())
            .place(&b, "asset")
            .await
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join("plugins/b.so")).unwrap(), b"v2");
    }
}
