use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Returns the pawnpkg home directory, or None if the user's home cannot be resolved.
///
/// `PAWNPKG_HOME` overrides the default of `~/.pawnpkg`.
pub fn try_pawnpkg_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("PAWNPKG_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".pawnpkg"))
}

/// User configuration: <home>/config.toml
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

/// `SQLite` state database: <home>/state.db
pub fn db_path(home: &Path) -> PathBuf {
    home.join("state.db")
}

/// Staging area for archive extraction: <home>/tmp
pub fn tmp_path(home: &Path) -> PathBuf {
    home.join("tmp")
}

/// Name of the dependency manifest kept at the project root.
pub const MANIFEST_FILE: &str = "pawn-package.json";

/// Extract the filename from a URL, ignoring any query string or fragment.
///
/// # Example
///
/// ```
/// use pawnpkg_core::filename_from_url;
///
/// assert_eq!(filename_from_url("https://example.com/dl/sscanf.dll?raw=1"), "sscanf.dll");
/// assert_eq!(filename_from_url(""), "");
/// ```
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').next_back().unwrap_or("")
}
