//! Records returned by the source host's REST API.
//!
//! Only the fields the engine reads are modelled. Unknown fields are ignored;
//! a missing required field fails deserialization, which the HTTP layer
//! reports as a malformed response.

use serde::{Deserialize, Serialize};

/// A tagged release (`GET /repos/{owner}/{repo}/releases/latest`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Git tag the release points at.
    pub tag_name: String,
    /// Display name, when set.
    #[serde(default)]
    pub name: Option<String>,
    /// Attached binaries.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A binary attached to a [`Release`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset filename.
    pub name: String,
    /// Public download URL.
    pub browser_download_url: String,
    /// Size in bytes, when reported.
    #[serde(default)]
    pub size: u64,
}

/// Entry type in a repository content listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symlinks and submodules; never followed.
    #[serde(other)]
    Other,
}

/// One entry of `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Entry name.
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// File or directory.
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// Raw download URL (files only).
    #[serde(default)]
    pub download_url: Option<String>,
}
