//! Sharded Cache
//!
//! Spreads a key space over N independent caches.
//!
//! # Design
//!
//! - `bucket(key) = hash(key) mod N`, a pure function of the key for a
//!   fixed strategy and bucket count
//! - Every operation is forwarded unchanged to the key's bucket
//! - Buckets know nothing about each other; there is no cross-bucket
//!   coordination

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::Fnv1a32;
use crate::domain::ports::{Cache, HashStrategy};
use crate::error::{Error, Result};

/// Cache that routes each key to one of several buckets
pub struct ShardedCache<V> {
    buckets: Vec<Arc<dyn Cache<V>>>,
    strategy: Arc<dyn HashStrategy>,
}

impl<V> std::fmt::Debug for ShardedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedCache")
            .field("buckets", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl<V> ShardedCache<V> {
    /// Create over `buckets`, routing with 32-bit FNV-1a
    pub fn new(buckets: Vec<Arc<dyn Cache<V>>>) -> Result<Self> {
        Self::with_strategy(buckets, Fnv1a32)
    }

    /// Create over `buckets`, routing with `strategy`
    pub fn with_strategy<S>(buckets: Vec<Arc<dyn Cache<V>>>, strategy: S) -> Result<Self>
    where
        S: HashStrategy + 'static,
    {
        if buckets.is_empty() {
            return Err(Error::NoBuckets);
        }
        Ok(Self {
            buckets,
            strategy: Arc::new(strategy),
        })
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Index of the bucket that owns `key`, always in `0..bucket_count()`
    #[inline]
    pub fn bucket_index(&self, key: &str) -> usize {
        (self.strategy.hash(key) % self.buckets.len() as u64) as usize
    }

    /// The bucket that owns `key`
    pub fn bucket(&self, key: &str) -> &Arc<dyn Cache<V>> {
        &self.buckets[self.bucket_index(key)]
    }
}

#[async_trait]
impl<V> Cache<V> for ShardedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.bucket(key).get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.bucket(key).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bucket(key).delete(key).await
    }
}

// =============================================================================
// Tests
// =============================================================================
