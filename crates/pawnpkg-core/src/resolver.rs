//! Source resolution.
//!
//! An identifier becomes an ordered ladder of rungs. Each rung is plain data:
//! what kind of source it is and the candidates to try. The acquisition loop
//! decides per rung whether it still needs to run.

use std::fmt;

use pawnpkg_schema::{ArchiveFormat, ContentHint, PackageId, RepoKey};
use serde::Serialize;

use crate::config::Config;
use crate::reporter::Stage;

/// One stage of the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RungKind {
    ReleaseAssets,
    RepositoryListing,
    GuessedUrls,
    Mirrors,
    DirectLink,
}

impl RungKind {
    /// Whether this rung still has work to do given what has been placed.
    ///
    /// Guessed URLs run only while nothing at all has been found; mirrors run
    /// while no plugin has been found.
    pub fn is_needed(self, headers: usize, plugins: usize) -> bool {
        match self {
            Self::ReleaseAssets | Self::RepositoryListing | Self::DirectLink => true,
            Self::GuessedUrls => headers == 0 && plugins == 0,
            Self::Mirrors => plugins == 0,
        }
    }

    /// Sequential rungs stop at the first candidate that yields content.
    pub fn stops_at_first_success(self) -> bool {
        matches!(self, Self::GuessedUrls | Self::Mirrors | Self::DirectLink)
    }

    pub fn stage(self) -> Stage {
        match self {
            Self::ReleaseAssets => Stage::Release,
            Self::RepositoryListing => Stage::Listing,
            Self::GuessedUrls => Stage::Guessed,
            Self::Mirrors => Stage::Mirror,
            Self::DirectLink => Stage::Direct,
        }
    }
}

impl fmt::Display for RungKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReleaseAssets => "release assets",
            Self::RepositoryListing => "repository listing",
            Self::GuessedUrls => "guessed urls",
            Self::Mirrors => "mirrors",
            Self::DirectLink => "direct link",
        })
    }
}

/// Something that can be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCandidate {
    /// Assets of the latest (or newest listed) release.
    ReleaseAssets(RepoKey),
    /// The repository content listing, starting at `path`.
    RepositoryListing { repo: RepoKey, path: String },
    /// A URL with a known or guessed payload type.
    DirectUrl { url: String, hint: ContentHint },
    /// A mirror serving the identifier as a path suffix.
    MirrorUrl { url: String },
}

impl SourceCandidate {
    /// Short label used in errors and progress events.
    pub fn label(&self) -> String {
        match self {
            Self::ReleaseAssets(repo) => format!("{repo} releases"),
            Self::RepositoryListing { repo, path } if path.is_empty() => format!("{repo} contents"),
            Self::RepositoryListing { repo, path } => format!("{repo} contents/{path}"),
            Self::DirectUrl { url, .. } | Self::MirrorUrl { url } => url.clone(),
        }
    }

    pub fn hint(&self) -> ContentHint {
        match self {
            Self::DirectUrl { hint, .. } => *hint,
            Self::MirrorUrl { .. } => ContentHint::Plugin,
            Self::ReleaseAssets(_) | Self::RepositoryListing { .. } => ContentHint::Unknown,
        }
    }
}

/// A ladder stage and its candidates, in preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rung {
    pub kind: RungKind,
    pub candidates: Vec<SourceCandidate>,
}

/// Build the ladder for an identifier.
pub fn resolve(id: &PackageId, config: &Config) -> Vec<Rung> {
    match id {
        PackageId::Repo(repo) => vec![
            Rung {
                kind: RungKind::ReleaseAssets,
                candidates: vec![SourceCandidate::ReleaseAssets(repo.clone())],
            },
            Rung {
                kind: RungKind::RepositoryListing,
                candidates: vec![SourceCandidate::RepositoryListing {
                    repo: repo.clone(),
                    path: String::new(),
                }],
            },
            guessed_rung(&repo.to_string(), config),
            mirror_rung(&repo.to_string(), config),
        ],
        PackageId::Token(token) => vec![guessed_rung(token, config), mirror_rung(token, config)],
        PackageId::Link(url) => vec![Rung {
            kind: RungKind::DirectLink,
            candidates: vec![SourceCandidate::DirectUrl {
                url: url.clone(),
                hint: link_hint(url),
            }],
        }],
    }
}

fn guessed_rung(id: &str, config: &Config) -> Rung {
    let web = config.web_base.trim_end_matches('/');
    let raw = config.raw_base.trim_end_matches('/');
    let direct = |url: String, hint| SourceCandidate::DirectUrl { url, hint };
    Rung {
        kind: RungKind::GuessedUrls,
        candidates: vec![
            direct(
                format!("{web}/{id}/releases/latest/download/plugin.zip"),
                ContentHint::Archive,
            ),
            direct(
                format!("{web}/{id}/archive/refs/heads/main.zip"),
                ContentHint::Archive,
            ),
            direct(format!("{raw}/{id}/main/plugin.dll"), ContentHint::Plugin),
            direct(format!("{raw}/{id}/main/plugin.so"), ContentHint::Plugin),
        ],
    }
}

fn mirror_rung(id: &str, config: &Config) -> Rung {
    Rung {
        kind: RungKind::Mirrors,
        candidates: config
            .mirrors
            .iter()
            .map(|m| SourceCandidate::MirrorUrl {
                url: format!("{}/{id}", m.trim_end_matches('/')),
            })
            .collect(),
    }
}

/// Payload type of a direct link, judged by its suffix.
///
/// Anything that is neither a plugin binary nor a known archive is
/// [`ContentHint::Unknown`] and gets rejected when fetched.
pub fn link_hint(url: &str) -> ContentHint {
    let name = crate::paths::filename_from_url(url).to_ascii_lowercase();
    if name.ends_with(".dll") || name.ends_with(".so") {
        ContentHint::Plugin
    } else if ArchiveFormat::from_name(&name).is_some() {
        ContentHint::Archive
    } else {
        ContentHint::Unknown
    }
}
