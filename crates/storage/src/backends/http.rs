//! Remote raw-content origin backend over HTTP.

use crate::error::{StorageError, StorageResult};
use crate::traits::ContentBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use scout_core::ContentPath;
use std::time::Duration;
use tracing::instrument;

/// Fetches content with a single `GET {base_url}/{key}` per call.
///
/// A 200 response yields the body; every other status is a miss. Transport
/// failures surface as [`StorageError::Transport`] so they can be logged
/// apart from genuine misses. No retries.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Create a new backend for the given origin.
    pub fn new(base_url: &str, request_timeout: Duration) -> StorageResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::Config(format!("invalid remote base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "remote base URL cannot carry a path: {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("scout-content/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// URL for a content path. Each key segment is percent-encoded.
    pub fn object_url(&self, path: &ContentPath) -> StorageResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StorageError::Config(format!(
                    "remote base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(path.key().split('/'));
        Ok(url)
    }
}

#[async_trait]
impl ContentBackend for HttpBackend {
    #[instrument(skip(self, path), fields(backend = "http", key = %path))]
    async fn fetch(&self, path: &ContentPath) -> StorageResult<Option<Bytes>> {
        let url = self.object_url(path)?;
        let transport = |source| StorageError::Transport {
            key: path.key(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(status = status.as_u16(), "remote origin returned non-success status");
            return Ok(None);
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(Some(body))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
