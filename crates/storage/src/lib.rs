//! Content sources for the scout content server.
//!
//! This crate provides:
//! - The [`ContentBackend`] trait and its local filesystem and HTTP backends
//! - A TTL cache decorator for remote lookups, negative results included
//! - [`ContentResolver`], which turns backend faults into the right outcome

pub mod backends;
pub mod cache;
pub mod error;
pub mod resolver;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, http::HttpBackend};
pub use cache::{CachingBackend, Clock, ManualClock, SystemClock};
pub use error::{StorageError, StorageResult};
pub use resolver::{ContentResolver, FaultHook};
pub use traits::ContentBackend;

use scout_core::config::{ContentConfig, ContentMode};
use std::sync::Arc;

/// Create a content resolver from configuration.
pub fn from_config(config: &ContentConfig) -> StorageResult<ContentResolver> {
    config.validate().map_err(StorageError::Config)?;

    let local = || Arc::new(FilesystemBackend::new(&config.scripts_dir, &config.bin_dir));

    match config.mode {
        ContentMode::Local => Ok(ContentResolver::new(local())),
        ContentMode::Remote => {
            let remote = HttpBackend::new(&config.remote_base_url, config.request_timeout())?;
            let cache = Arc::new(CachingBackend::new(Arc::new(remote), config.cache_ttl()));
            let resolver = ContentResolver::cached(cache);
            if config.fallback_to_local {
                Ok(resolver.with_fallback(local()))
            } else {
                Ok(resolver)
            }
        }
    }
}
