//! Application state shared across handlers.

use crate::metrics;
use scout_core::config::AppConfig;
use scout_signer::ContentSigner;
use scout_storage::{ContentResolver, StorageResult};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Content resolver, built once from `config.content`.
    pub resolver: Arc<ContentResolver>,
    /// Content signer holding the process key.
    pub signer: Arc<ContentSigner>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, resolver: ContentResolver, signer: ContentSigner) -> Self {
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            signer: Arc::new(signer),
        }
    }

    /// Interval for sweeping expired cache entries, if the resolver caches.
    pub fn cache_purge_interval(&self) -> Option<Duration> {
        self.resolver
            .cache_len()
            .map(|_| self.config.content.cache_ttl())
    }
}

/// Build the content resolver for `config`, counting transport faults.
pub fn build_resolver(config: &AppConfig) -> StorageResult<ContentResolver> {
    let resolver = scout_storage::from_config(&config.content)?;
    Ok(resolver.with_fault_hook(Arc::new(|_| metrics::REMOTE_TRANSPORT_FAULTS.inc())))
}

/// Spawn a background task that periodically drops expired cache entries.
pub fn spawn_cache_purge_task(
    resolver: Arc<ContentResolver>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let evicted = resolver.purge_expired();
            if let Some(len) = resolver.cache_len() {
                metrics::CACHE_ENTRIES.set(len as i64);
            }
            if evicted > 0 {
                tracing::info!(evicted, "Cache purge task evicted expired entries");
            }
        }
    })
}
