//! Domain Ports (Port/Adapter Pattern)
//!
//! The capability contracts every decorator is written against. Storage
//! engines, sources of record and task runners implement these traits; the
//! decorators in [`crate::cache`] only ever talk to them through the traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Ports (Traits)                          │
//! │   Cache │ Database │ Loader │ Updater │ Scheduler │ Hash    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Adapters (Impls)                          │
//! │  MemoryCache │ MemoryDatabase │ TokioScheduler │ Fnv1a32    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;

// =============================================================================
// Cache Port
// =============================================================================

/// Port for a fast, volatile key/value cache.
///
/// `get` reports an absent (or expired) key as [`Error::Miss`], never as a
/// generic failure, so decorators can tell "load it" apart from "give up".
///
/// [`Error::Miss`]: crate::error::Error::Miss
#[async_trait]
pub trait Cache<V>: Send + Sync {
    /// Get the value cached under `key`.
    async fn get(&self, key: &str) -> Result<V>;

    /// Store `value` under `key`.
    async fn set(&self, key: &str, value: V) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<V, C> Cache<V> for Arc<C>
where
    V: Send + 'static,
    C: Cache<V> + ?Sized,
{
    async fn get(&self, key: &str) -> Result<V> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

// =============================================================================
// Source of Record Port
// =============================================================================

/// Port for the authoritative source of record.
#[async_trait]
pub trait Database<V>: Send + Sync {
    /// Read the record stored under `key`.
    async fn select(&self, key: &str) -> Result<V>;

    /// Insert or replace the record stored under `key`.
    async fn upsert(&self, key: &str, value: V) -> Result<()>;

    /// Remove the record stored under `key`.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<V, D> Database<V> for Arc<D>
where
    V: Send + 'static,
    D: Database<V> + ?Sized,
{
    async fn select(&self, key: &str) -> Result<V> {
        (**self).select(key).await
    }

    async fn upsert(&self, key: &str, value: V) -> Result<()> {
        (**self).upsert(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

// =============================================================================
// Loader / Updater Ports
// =============================================================================

/// Port for loading a value on a cache miss.
#[async_trait]
pub trait Loader<V>: Send + Sync {
    /// Load the value for `key` from wherever it really lives.
    async fn load(&self, key: &str) -> Result<V>;
}

#[async_trait]
impl<V, L> Loader<V> for Arc<L>
where
    V: Send + 'static,
    L: Loader<V> + ?Sized,
{
    async fn load(&self, key: &str) -> Result<V> {
        (**self).load(key).await
    }
}

/// Port for persisting a value on a write-through.
#[async_trait]
pub trait Updater<V>: Send + Sync {
    /// Persist `value` under `key`.
    async fn update(&self, key: &str, value: V) -> Result<()>;
}

#[async_trait]
impl<V, U> Updater<V> for Arc<U>
where
    V: Send + 'static,
    U: Updater<V> + ?Sized,
{
    async fn update(&self, key: &str, value: V) -> Result<()> {
        (**self).update(key, value).await
    }
}

// =============================================================================
// Scheduler Port
// =============================================================================

/// A detached unit of work.
///
/// The task owns everything it touches; it never borrows from the request
/// that submitted it.
pub type Task = BoxFuture<'static, ()>;

/// Port for submitting detached work.
///
/// Submission is synchronous: an `Err` means the work will never run. Once
/// accepted, the task's outcome is the task's own business.
pub trait Scheduler: Send + Sync {
    /// Submit `task` for execution.
    fn submit(&self, task: Task) -> Result<()>;
}

impl<S> Scheduler for Arc<S>
where
    S: Scheduler + ?Sized,
{
    fn submit(&self, task: Task) -> Result<()> {
        (**self).submit(task)
    }
}

// =============================================================================
// Hash Strategy Port
// =============================================================================

/// Port for the key hash used to pick a shard.
///
/// Must be a pure function of the key.
pub trait HashStrategy: Send + Sync {
    /// Hash `key`.
    fn hash(&self, key: &str) -> u64;
}

impl<F> HashStrategy for F
where
    F: Fn(&str) -> u64 + Send + Sync,
{
    fn hash(&self, key: &str) -> u64 {
        self(key)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCache;

    #[tokio::test]
    async fn test_arc_forwards_cache() {
        let cache: Arc<dyn Cache<u32>> = Arc::new(MemoryCache::new());
        let shared = Arc::new(cache);

        shared.set("a", 1).await.unwrap();
        assert_eq!(shared.get("a").await.unwrap(), 1);

        shared.delete("a").await.unwrap();
        assert!(shared.get("a").await.unwrap_err().is_miss());
    }

    #[test]
    fn test_closure_is_hash_strategy() {
        let strategy = |key: &str| key.len() as u64;
        assert_eq!(HashStrategy::hash(&strategy, "four"), 4);
    }
}
