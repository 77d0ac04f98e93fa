//! Shared acquisition context.
//!
//! Groups the HTTP client, configuration and progress sink so operations do
//! not take them as separate arguments.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::registry::GitHubClient;
use crate::reporter::Reporter;

#[derive(Clone)]
pub struct Context {
    pub client: reqwest::Client,
    pub github: GitHubClient,
    pub config: Arc<Config>,
    pub reporter: Arc<dyn Reporter>,
    /// Parent of the per-acquisition staging directories.
    pub staging_root: PathBuf,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("staging_root", &self.staging_root)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be built.
    pub fn new(
        config: Config,
        reporter: Arc<dyn Reporter>,
        staging_root: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        let github = GitHubClient::new(client.clone(), &config.api_base);
        Ok(Self {
            client,
            github,
            config: Arc::new(config),
            reporter,
            staging_root: staging_root.into(),
        })
    }
}
