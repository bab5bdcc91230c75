//! Read-Through Cache
//!
//! Fills the cache from a [`Loader`] on a miss. Writes and deletes go
//! straight to the wrapped cache.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{Cache, Loader};
use crate::error::Result;

/// Cache that loads missing keys and stores what it loaded
pub struct ReadThroughCache<V> {
    cache: Arc<dyn Cache<V>>,
    loader: Arc<dyn Loader<V>>,
}

impl<V> ReadThroughCache<V> {
    /// Wrap `cache`, loading misses with `loader`
    pub fn new(cache: Arc<dyn Cache<V>>, loader: Arc<dyn Loader<V>>) -> Self {
        Self { cache, loader }
    }
}

#[async_trait]
impl<V> Cache<V> for ReadThroughCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        match self.cache.get(key).await {
            Err(err) if err.is_miss() => {
                debug!(key, "Cache miss, loading");
                let value = self.loader.load(key).await?;
                self.cache.set(key, value.clone()).await?;
                Ok(value)
            }
            other => other,
        }
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.cache.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.delete(key).await
    }
}

// =============================================================================
// Tests
// =============================================================================
