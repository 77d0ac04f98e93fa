//! HTTP fetches for source candidates.
//!
//! Bodies are streamed into memory; payloads here are plugin binaries and
//! small archives, never multi-gigabyte blobs.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Upper bound on buffer space reserved from a declared `Content-Length`.
pub(crate) const MAX_PREALLOC: usize = 8 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("unexpected response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

impl SourceError {
    /// Returns `true` for an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

async fn get(client: &Client, url: &str) -> Result<reqwest::Response, SourceError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response)
}

/// Download a URL into memory.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Bytes, SourceError> {
    tracing::debug!("GET {url}");
    let response = get(client, url).await?;

    // The declared length is untrusted; the buffer grows as chunks arrive.
    let declared = response.content_length().unwrap_or(0);
    let mut buf = BytesMut::with_capacity(prealloc(declared));
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

fn prealloc(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |len| len.min(MAX_PREALLOC))
}

/// Fetch and decode a JSON document.
///
/// A body that does not match `T` becomes [`SourceError::MalformedResponse`].
pub async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    accept: &str,
) -> Result<T, SourceError> {
    tracing::debug!("GET {url} (json)");
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .header(reqwest::header::ACCEPT, accept)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::MalformedResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
