//! Cache-gated data source.
//!
//! [`LogSource::fetch`] consults the cache before anything else. Once a
//! non-empty payload is cached for a key the collector is never run again
//! for that key; removing the entry is the only way to refresh it.

use crate::collect::cache::{CacheError, PayloadCache};
use crate::collect::process::CollectError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Collect(#[from] CollectError),
}

/// Per-key serialised access to a [`PayloadCache`] with a collector fallback.
pub struct LogSource {
    cache: Arc<dyn PayloadCache>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LogSource {
    pub fn new(cache: Arc<dyn PayloadCache>) -> Self {
        Self {
            cache,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &dyn PayloadCache {
        self.cache.as_ref()
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Return the cached payload for `key`, or run `collect` and cache its
    /// result when non-blank. Blank results are returned but not cached.
    ///
    /// Concurrent fetches of one key run `collect` at most once between
    /// them: later callers wait and then read what the first one cached.
    pub async fn fetch<F, Fut>(&self, key: &str, collect: F) -> Result<String, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, CollectError>>,
    {
        if let Some(payload) = self.cache.get(key).await? {
            info!("Loaded {key} from cache.");
            return Ok(payload);
        }

        let lock = self.lock_for(key);
        let _guard = lock.lock().await;

        if let Some(payload) = self.cache.get(key).await? {
            debug!("{key} was cached while waiting for the lock");
            return Ok(payload);
        }

        let payload = collect().await?;
        if payload.trim().is_empty() {
            info!("No logs found for {key}; nothing cached.");
        } else {
            self.cache.put(key, &payload).await?;
            info!("Successfully retrieved {key} ({} bytes).", payload.len());
        }
        Ok(payload)
    }
}
