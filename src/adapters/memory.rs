//! In-Memory Backends
//!
//! `DashMap`-backed implementations of the [`Cache`] and [`Database`] ports.
//! They are the reference collaborators for tests and the demo binary; they
//! do no eviction and no persistence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::ports::{Cache, Database};
use crate::error::{Error, Result};

/// Operation counters for an in-memory backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Read operations (`get` / `select`)
    pub reads: u64,
    /// Write operations (`set` / `upsert`)
    pub writes: u64,
    /// Delete operations
    pub deletes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> MemoryStats {
        MemoryStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Memory Cache
// =============================================================================

/// Concurrent map cache
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: DashMap<String, V>,
    counters: Counters,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            counters: Counters::default(),
        }
    }
}

impl<V> MemoryCache<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if `key` is cached, without counting a read
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Operation counters
    pub fn stats(&self) -> MemoryStats {
        self.counters.snapshot()
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::miss(key))
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// Memory Database
// =============================================================================

/// Concurrent map standing in for a source of record
///
/// An optional latency is applied to every operation, which makes races
/// between readers and writers observable in tests and demos.
#[derive(Debug)]
pub struct MemoryDatabase<V> {
    records: DashMap<String, V>,
    latency: Option<Duration>,
    counters: Counters,
}

impl<V> Default for MemoryDatabase<V> {
    fn default() -> Self {
        Self {
            records: DashMap::new(),
            latency: None,
            counters: Counters::default(),
        }
    }
}

impl<V> MemoryDatabase<V> {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database that sleeps `latency` on every operation
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Operation counters
    pub fn stats(&self) -> MemoryStats {
        self.counters.snapshot()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl<V> Database<V> for MemoryDatabase<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn select(&self, key: &str) -> Result<V> {
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        self.records
            .get(key)
            .map(|record| record.value().clone())
            .ok_or_else(|| Error::miss(key))
    }

    async fn upsert(&self, key: &str, value: V) -> Result<()> {
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        self.records.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        self.records.remove(key);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
