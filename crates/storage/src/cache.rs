//! TTL cache in front of a content backend.

use crate::error::StorageResult;
use crate::traits::ContentBackend;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use scout_core::ContentPath;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source for cache expiry.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// The process monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + offset
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    content: Option<Bytes>,
    fetched_at: Instant,
}

/// Caches the outcome of each lookup, including misses, keyed by the full
/// content key.
///
/// An entry is served while its age is strictly below the TTL; after that the
/// next lookup goes back to the inner backend and replaces the entry. Errors
/// are never cached. Concurrent misses on the same key may each reach the
/// inner backend; the last writer wins.
pub struct CachingBackend {
    inner: Arc<dyn ContentBackend>,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CachingBackend {
    pub fn new(inner: Arc<dyn ContentBackend>, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(inner: Arc<dyn ContentBackend>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let expired = |entry: &CacheEntry| now.saturating_duration_since(entry.fetched_at) >= self.ttl;

        let keys_to_check: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| expired(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the shard lock so an entry refreshed since the scan survives.
        let removed = keys_to_check
            .into_iter()
            .filter(|key| self.entries.remove_if(key, |_, entry| expired(entry)).is_some())
            .count();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "purged expired cache entries");
        }
        removed
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str, now: Instant) -> Option<Option<Bytes>> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            Some(entry.content.clone())
        } else {
            None
        }
    }
}

#[async_trait]
impl ContentBackend for CachingBackend {
    async fn fetch(&self, path: &ContentPath) -> StorageResult<Option<Bytes>> {
        let key = path.key();
        if let Some(content) = self.lookup(&key, self.clock.now()) {
            tracing::trace!(key = %key, hit = content.is_some(), "content cache hit");
            return Ok(content);
        }

        let content = self.inner.fetch(path).await?;
        self.entries.insert(
            key,
            CacheEntry {
                content: content.clone(),
                fetched_at: self.clock.now(),
            },
        );
        Ok(content)
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that counts calls and answers from a fixed script.
    struct CountingBackend {
        calls: AtomicUsize,
        answer: fn(usize) -> StorageResult<Option<Bytes>>,
    }

    impl CountingBackend {
        fn new(answer: fn(usize) -> StorageResult<Option<Bytes>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                answer,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentBackend for CountingBackend {
        async fn fetch(&self, _path: &ContentPath) -> StorageResult<Option<Bytes>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)(n)
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    fn versioned(n: usize) -> StorageResult<Option<Bytes>> {
        Ok(Some(Bytes::from(format!("v{n}"))))
    }

    fn setup(
        answer: fn(usize) -> StorageResult<Option<Bytes>>,
    ) -> (Arc<CountingBackend>, Arc<ManualClock>, CachingBackend) {
        let inner = CountingBackend::new(answer);
        let clock = Arc::new(ManualClock::new());
        let cache = CachingBackend::with_clock(inner.clone(), Duration::from_secs(300), clock.clone());
        (inner, clock, cache)
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let (inner, clock, cache) = setup(versioned);
        let path = ContentPath::parse_script("linux/a.sh").unwrap();

        assert_eq!(cache.fetch(&path).await.unwrap(), Some(Bytes::from("v0")));
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.fetch(&path).await.unwrap(), Some(Bytes::from("v0")));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_refetch_at_ttl() {
        let (inner, clock, cache) = setup(versioned);
        let path = ContentPath::parse_script("linux/a.sh").unwrap();

        cache.fetch(&path).await.unwrap();
        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.fetch(&path).await.unwrap(), Some(Bytes::from("v1")));
        assert_eq!(inner.calls(), 2);

        // The refreshed entry is served again.
        assert_eq!(cache.fetch(&path).await.unwrap(), Some(Bytes::from("v1")));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn test_misses_are_cached() {
        let (inner, _clock, cache) = setup(|_| Ok(None));
        let path = ContentPath::parse_bin("missing.exe").unwrap();

        assert_eq!(cache.fetch(&path).await.unwrap(), None);
        assert_eq!(cache.fetch(&path).await.unwrap(), None);
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (inner, _clock, cache) = setup(|n| {
            if n == 0 {
                Err(StorageError::Io(std::io::Error::other("boom")))
            } else {
                Ok(Some(Bytes::from_static(b"ok")))
            }
        });
        let path = ContentPath::parse_script("a.sh").unwrap();

        assert!(cache.fetch(&path).await.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.fetch(&path).await.unwrap(), Some(Bytes::from_static(b"ok")));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn test_keys_include_class() {
        let (inner, _clock, cache) = setup(versioned);

        cache.fetch(&ContentPath::parse_script("tool").unwrap()).await.unwrap();
        cache.fetch(&ContentPath::parse_bin("tool").unwrap()).await.unwrap();
        assert_eq!(inner.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (_inner, clock, cache) = setup(versioned);

        cache.fetch(&ContentPath::parse_script("old.sh").unwrap()).await.unwrap();
        clock.advance(Duration::from_secs(200));
        cache.fetch(&ContentPath::parse_script("new.sh").unwrap()).await.unwrap();
        clock.advance(Duration::from_secs(150));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
