//! Write-Through Cache
//!
//! Persists every write through an [`Updater`] before repopulating the
//! cache. Reads and deletes go straight to the wrapped cache.
//!
//! # Write Path
//!
//! 1. Delete the cached entry, so nobody reads the old value mid-update
//! 2. Persist the new value with the updater
//! 3. Cache the new value
//!
//! A failure at step 1 or 2 aborts the write; later steps never run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::{Cache, Updater};
use crate::error::Result;

/// Cache that persists writes before caching them
pub struct WriteThroughCache<V> {
    cache: Arc<dyn Cache<V>>,
    updater: Arc<dyn Updater<V>>,
}

impl<V> WriteThroughCache<V> {
    /// Wrap `cache`, persisting writes with `updater`
    pub fn new(cache: Arc<dyn Cache<V>>, updater: Arc<dyn Updater<V>>) -> Self {
        Self { cache, updater }
    }
}

#[async_trait]
impl<V> Cache<V> for WriteThroughCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.cache.get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, error = %e, "Write-through aborted: cache invalidation failed");
            return Err(e);
        }
        if let Err(e) = self.updater.update(key, value.clone()).await {
            warn!(key, error = %e, "Write-through aborted: update failed");
            return Err(e);
        }
        self.cache.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.delete(key).await
    }
}

// =============================================================================
// Tests
// =============================================================================
