//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use scout_core::ContentPath;

/// A source of content bytes for validated paths.
///
/// Implemented by the local filesystem backend, the remote HTTP backend and
/// the caching decorator, so the resolver can hold any of them as one
/// strategy value.
#[async_trait]
pub trait ContentBackend: Send + Sync + 'static {
    /// Fetch the full content at `path`.
    ///
    /// Returns `Ok(None)` when there is nothing at that path. Errors are
    /// reserved for faults (I/O failures, remote transport failures).
    async fn fetch(&self, path: &ContentPath) -> StorageResult<Option<Bytes>>;

    /// Get the name of this backend.
    ///
    /// Returns a static string identifier for the backend type (e.g., "http", "filesystem").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify backend availability at startup.
    ///
    /// The default implementation returns Ok(()), suitable for backends that
    /// don't require connectivity verification.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
