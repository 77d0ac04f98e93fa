//! Engine configuration.
//!
//! Defaults are built in; `<home>/config.toml` overrides them and a handful
//! of environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Tunables for source resolution and fetching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// REST API base of the source host.
    pub api_base: String,
    /// Web base used for release-download and branch-archive guesses.
    pub web_base: String,
    /// Raw-file base used for single-binary guesses.
    pub raw_base: String,
    /// Mirror prefixes; the identifier is appended as a path suffix.
    pub mirrors: Vec<String>,
    /// Timeout for each HTTP call.
    pub request_timeout_secs: u64,
    /// Upper bound for one source candidate, including extraction and placement.
    pub candidate_timeout_secs: u64,
    /// Concurrent downloads within a single rung.
    pub max_concurrent_downloads: usize,
    /// How deep the repository listing walk descends into include directories.
    pub max_listing_depth: usize,
    /// Extra filenames relocated to the project root.
    pub relocated_files: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            web_base: "https://github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            mirrors: vec![
                "https://files.sa-mp.com/plugins".to_string(),
                "https://assets.open.mp/plugins".to_string(),
                "https://github.com/samp-plugins-mirror/plugins/raw/main".to_string(),
            ],
            request_timeout_secs: 30,
            candidate_timeout_secs: 120,
            max_concurrent_downloads: 8,
            max_listing_depth: 4,
            relocated_files: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply `PAWNPKG_API_URL`, `PAWNPKG_MIRRORS` and `PAWNPKG_TIMEOUT_SECS`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(api) = var("PAWNPKG_API_URL").filter(|v| !v.is_empty()) {
            self.api_base = api;
        }
        if let Some(mirrors) = var("PAWNPKG_MIRRORS") {
            self.mirrors = mirrors
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(raw) = var("PAWNPKG_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!("ignoring PAWNPKG_TIMEOUT_SECS={raw}: not a number"),
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_secs(self.candidate_timeout_secs.max(1))
    }

    /// Build the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(self.request_timeout())
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "mirrors = [\"https://mirror.example/plugins\"]\nmax_listing_depth = 2\n",
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.mirrors, vec!["https://mirror.example/plugins"]);
        assert_eq!(cfg.max_listing_depth, 2);
        assert_eq!(cfg.api_base, "https://api.github.com");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mirrors = 3 = 4").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::default().with_overrides(|key| match key {
            "PAWNPKG_API_URL" => Some("http://127.0.0.1:9".to_string()),
            "PAWNPKG_MIRRORS" => Some("http://a/plugins, ,http://b/plugins".to_string()),
            "PAWNPKG_TIMEOUT_SECS" => Some("nope".to_string()),
            _ => None,
        });
        assert_eq!(cfg.api_base, "http://127.0.0.1:9");
        assert_eq!(cfg.mirrors, vec!["http://a/plugins", "http://b/plugins"]);
        assert_eq!(cfg.request_timeout_secs, 30);
    }
}
