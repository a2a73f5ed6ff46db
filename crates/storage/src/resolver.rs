//! Content resolution over the configured backend.

use crate::cache::CachingBackend;
use crate::error::{StorageError, StorageResult};
use crate::traits::ContentBackend;
use bytes::Bytes;
use scout_core::ContentPath;
use std::sync::Arc;
use tracing::instrument;

/// Observer invoked for every remote transport fault collapsed into a miss.
pub type FaultHook = Arc<dyn Fn(&StorageError) + Send + Sync>;

/// Resolves validated content paths to bytes.
///
/// Holds the backend chosen at startup. Remote transport faults are logged
/// and reported as a miss so a flaky origin never produces a 5xx. When a
/// fallback is configured, a miss on the primary is retried there once.
#[derive(Clone)]
pub struct ContentResolver {
    primary: Arc<dyn ContentBackend>,
    fallback: Option<Arc<dyn ContentBackend>>,
    cache: Option<Arc<CachingBackend>>,
    on_transport_fault: Option<FaultHook>,
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("primary", &self.primary.backend_name())
            .field("fallback", &self.fallback.as_ref().map(|b| b.backend_name()))
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl ContentResolver {
    pub fn new(primary: Arc<dyn ContentBackend>) -> Self {
        Self {
            primary,
            fallback: None,
            cache: None,
            on_transport_fault: None,
        }
    }

    /// Resolve through a TTL cache, keeping a handle for maintenance.
    pub fn cached(cache: Arc<CachingBackend>) -> Self {
        Self {
            primary: cache.clone(),
            fallback: None,
            cache: Some(cache),
            on_transport_fault: None,
        }
    }

    /// Retry primary misses against `fallback`.
    pub fn with_fallback(mut self, fallback: Arc<dyn ContentBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_fault_hook(mut self, hook: FaultHook) -> Self {
        self.on_transport_fault = Some(hook);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.primary.backend_name()
    }

    /// Resolve `path` to its bytes, or `None` when nothing is there.
    #[instrument(skip(self, path), fields(key = %path))]
    pub async fn resolve(&self, path: &ContentPath) -> StorageResult<Option<Bytes>> {
        if let Some(content) = self.fetch_from(self.primary.as_ref(), path).await? {
            return Ok(Some(content));
        }

        match &self.fallback {
            Some(fallback) => {
                tracing::debug!(fallback = fallback.backend_name(), "primary miss, trying fallback");
                self.fetch_from(fallback.as_ref(), path).await
            }
            None => Ok(None),
        }
    }

    /// Drop expired cache entries, if a cache is in use.
    pub fn purge_expired(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.purge_expired())
    }

    /// Number of cached entries, or `None` without a cache.
    pub fn cache_len(&self) -> Option<usize> {
        self.cache.as_ref().map(|cache| cache.len())
    }

    /// Check every configured backend.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.primary.health_check().await?;
        if let Some(fallback) = &self.fallback {
            fallback.health_check().await?;
        }
        Ok(())
    }

    async fn fetch_from(
        &self,
        backend: &dyn ContentBackend,
        path: &ContentPath,
    ) -> StorageResult<Option<Bytes>> {
        match backend.fetch(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.is_transport() => {
                tracing::warn!(
                    backend = backend.backend_name(),
                    error = %e,
                    "Remote fetch failed, treating as not found"
                );
                if let Some(hook) = &self.on_transport_fault {
                    hook(&e);
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Answer {
        Hit(&'static [u8]),
        Miss,
        Io,
        Transport,
    }

    struct StubBackend {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentBackend for StubBackend {
        async fn fetch(&self, path: &ContentPath) -> StorageResult<Option<Bytes>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Answer::Hit(data) => Ok(Some(Bytes::from_static(data))),
                Answer::Miss => Ok(None),
                Answer::Io => Err(StorageError::Io(std::io::Error::other("disk on fire"))),
                Answer::Transport => {
                    // A real reqwest error: connect to a port nothing listens on.
                    let source = reqwest::Client::new()
                        .get("http://127.0.0.1:1/")
                        .send()
                        .await
                        .unwrap_err();
                    Err(StorageError::Transport {
                        key: path.key(),
                        source,
                    })
                }
            }
        }

        fn backend_name(&self) -> &'static str {
            "stub"
        }
    }

    fn script() -> ContentPath {
        ContentPath::parse_script("linux/setup.sh").unwrap()
    }

    #[tokio::test]
    async fn test_resolve_hit() {
        let resolver = ContentResolver::new(StubBackend::new(Answer::Hit(b"data")));
        assert_eq!(
            resolver.resolve(&script()).await.unwrap(),
            Some(Bytes::from_static(b"data"))
        );
    }

    #[tokio::test]
    async fn test_transport_fault_is_a_miss() {
        let resolver = ContentResolver::new(StubBackend::new(Answer::Transport));
        assert_eq!(resolver.resolve(&script()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fault_hook_sees_transport_faults_only() {
        let faults = Arc::new(AtomicUsize::new(0));
        let counter = faults.clone();
        let hook: FaultHook = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let resolver =
            ContentResolver::new(StubBackend::new(Answer::Transport)).with_fault_hook(hook.clone());
        resolver.resolve(&script()).await.unwrap();
        assert_eq!(faults.load(Ordering::SeqCst), 1);

        let resolver = ContentResolver::new(StubBackend::new(Answer::Miss)).with_fault_hook(hook);
        resolver.resolve(&script()).await.unwrap();
        assert_eq!(faults.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_io_error_propagates() {
        let resolver = ContentResolver::new(StubBackend::new(Answer::Io));
        assert!(matches!(
            resolver.resolve(&script()).await,
            Err(StorageError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_no_fallback_by_default() {
        let primary = StubBackend::new(Answer::Miss);
        let resolver = ContentResolver::new(primary.clone());
        assert_eq!(resolver.resolve(&script()).await.unwrap(), None);
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_miss_and_transport_fault() {
        for answer in [Answer::Miss, Answer::Transport] {
            let fallback = StubBackend::new(Answer::Hit(b"local"));
            let resolver =
                ContentResolver::new(StubBackend::new(answer)).with_fallback(fallback.clone());

            assert_eq!(
                resolver.resolve(&script()).await.unwrap(),
                Some(Bytes::from_static(b"local"))
            );
            assert_eq!(fallback.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_cached_resolver_exposes_cache() {
        let primary = StubBackend::new(Answer::Miss);
        let cache = Arc::new(CachingBackend::new(primary.clone(), std::time::Duration::from_secs(60)));
        let resolver = ContentResolver::cached(cache);
        assert_eq!(resolver.cache_len(), Some(0));

        resolver.resolve(&script()).await.unwrap();
        resolver.resolve(&script()).await.unwrap();
        assert_eq!(primary.calls(), 1);
        assert_eq!(resolver.cache_len(), Some(1));
        assert_eq!(resolver.purge_expired(), 0);

        let uncached = ContentResolver::new(StubBackend::new(Answer::Miss));
        assert_eq!(uncached.cache_len(), None);
    }

    #[tokio::test]
    async fn test_fallback_not_used_on_hit() {
        let fallback = StubBackend::new(Answer::Hit(b"local"));
        let resolver = ContentResolver::new(StubBackend::new(Answer::Hit(b"remote")))
            .with_fallback(fallback.clone());

        assert_eq!(
            resolver.resolve(&script()).await.unwrap(),
            Some(Bytes::from_static(b"remote"))
        );
        assert_eq!(fallback.calls(), 0);
    }
}
