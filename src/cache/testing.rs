//! Test doubles shared by the decorator tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapters::MemoryCache;
use crate::domain::ports::{Cache, Database};
use crate::error::{Error, Result};

/// Cache whose every operation fails
pub struct FailingCache;

#[async_trait]
impl<V: Send + 'static> Cache<V> for FailingCache {
    async fn get(&self, _key: &str) -> Result<V> {
        Err(Error::Message("cache down".into()))
    }

    async fn set(&self, _key: &str, _value: V) -> Result<()> {
        Err(Error::Message("cache down".into()))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(Error::Message("cache down".into()))
    }
}

/// Database whose every operation fails
pub struct FailingDatabase;

#[async_trait]
impl<V: Send + 'static> Database<V> for FailingDatabase {
    async fn select(&self, _key: &str) -> Result<V> {
        Err(Error::Message("database down".into()))
    }

    async fn upsert(&self, _key: &str, _value: V) -> Result<()> {
        Err(Error::Message("database down".into()))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(Error::Message("database down".into()))
    }
}

/// Operations seen by a [`RecordingCache`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Get(String),
    Set(String),
    Delete(String),
}

/// Memory cache that records the order of operations, with an optional
/// latency and an optional count of deletes to fail
pub struct RecordingCache<V> {
    inner: MemoryCache<V>,
    ops: Mutex<Vec<Op>>,
    latency: Option<Duration>,
    failing_deletes: AtomicUsize,
    failing_sets: AtomicUsize,
}

impl<V> RecordingCache<V> {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(),
            ops: Mutex::new(Vec::new()),
            latency: None,
            failing_deletes: AtomicUsize::new(0),
            failing_sets: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::new()
        }
    }

    pub fn fail_next_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_sets(&self, n: usize) {
        self.failing_sets.store(n, Ordering::SeqCst);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl<V> Cache<V> for RecordingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.ops.lock().push(Op::Get(key.to_string()));
        self.pause().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.ops.lock().push(Op::Set(key.to_string()));
        self.pause().await;
        if Self::take_failure(&self.failing_sets) {
            return Err(Error::Message("set failed".into()));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.ops.lock().push(Op::Delete(key.to_string()));
        self.pause().await;
        if Self::take_failure(&self.failing_deletes) {
            return Err(Error::Message("delete failed".into()));
        }
        self.inner.delete(key).await
    }
}

/// Shorthand for a shared recording cache of strings
pub fn recording() -> Arc<RecordingCache<String>> {
    Arc::new(RecordingCache::new())
}
