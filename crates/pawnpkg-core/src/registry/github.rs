use pawnpkg_schema::{ContentEntry, Release, RepoKey};
use reqwest::Client;

use crate::io::download::{SourceError, fetch_json};

const ACCEPT: &str = "application/vnd.github+json";

/// Read-only client for the releases and contents endpoints.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn repo_url(&self, repo: &RepoKey) -> String {
        format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.repo)
    }

    /// The latest release, or the newest entry of the release list when the
    /// repository has no release marked latest.
    ///
    /// Returns `Ok(None)` for a repository without any releases.
    pub async fn latest_release(&self, repo: &RepoKey) -> Result<Option<Release>, SourceError> {
        let url = format!("{}/releases/latest", self.repo_url(repo));
        match fetch_json::<Release>(&self.client, &url, ACCEPT).await {
            Ok(release) => Ok(Some(release)),
            Err(e) if e.is_not_found() => {
                tracing::info!("no latest release for {repo}, checking release list");
                let list_url = format!("{}/releases", self.repo_url(repo));
                let releases: Vec<Release> = fetch_json(&self.client, &list_url, ACCEPT).await?;
                Ok(releases.into_iter().next())
            }
            Err(e) => Err(e),
        }
    }

    /// Directory listing at `path` (empty for the repository root).
    pub async fn contents(
        &self,
        repo: &RepoKey,
        path: &str,
    ) -> Result<Vec<ContentEntry>, SourceError> {
        let path = path.trim_matches('/');
        let url = if path.is_empty() {
            format!("{}/contents", self.repo_url(repo))
        } else {
            format!("{}/contents/{path}", self.repo_url(repo))
        };
        fetch_json(&self.client, &url, ACCEPT).await
    }
}
