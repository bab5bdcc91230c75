//! Single-Flight Cache
//!
//! Collapses concurrent identical calls: while a `get`, `set` or `delete`
//! for a key is running, later calls of the same kind for that key wait for
//! it and receive its result instead of running again.
//!
//! # Design
//!
//! - One [`FlightGroup`] per operation kind; a `get` and a `set` on the same
//!   key do not coordinate with each other
//! - The running call is a [`Shared`] future, so every waiter observes the
//!   identical `Result`, errors included
//! - The group entry is removed as soon as its call completes, so the next
//!   call does fresh work

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::debug;

use crate::domain::ports::Cache;
use crate::error::Result;

type SharedCall<T> = Shared<BoxFuture<'static, Result<T>>>;

type Calls<T> = Mutex<HashMap<String, Call<T>>>;

struct Call<T> {
    id: u64,
    waiters: usize,
    future: SharedCall<T>,
}

/// Per-key deduplication of in-flight calls
///
/// An entry lives exactly as long as its call: the call removes it when it
/// resolves, or the last waiter removes it if every caller gave up first.
/// A waiter that is dropped while others are still waiting leaves the
/// entry in place, so later callers keep joining the running call.
pub struct FlightGroup<T> {
    calls: Arc<Calls<T>>,
    next_id: AtomicU64,
}

impl<T> Default for FlightGroup<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a call in flight
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Run the call built by `start` for `key`, or join the one already
    /// running.
    ///
    /// `start` runs outside the group's lock and may be invoked even when
    /// another caller wins the race to register; its future is then
    /// dropped unpolled.
    pub async fn run<F>(&self, key: &str, start: F) -> Result<T>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>>,
    {
        let (id, future) = match self.join(key) {
            Some(joined) => joined,
            None => self.lead(key, start),
        };

        // releases this waiter's hold on the entry, even when cancelled
        let _landing = Landing {
            group: self,
            key,
            id,
        };
        future.await
    }

    fn join(&self, key: &str) -> Option<(u64, SharedCall<T>)> {
        let mut calls = self.calls.lock();
        let call = calls.get_mut(key)?;
        call.waiters += 1;
        debug!(key, waiters = call.waiters, "Joining in-flight call");
        Some((call.id, call.future.clone()))
    }

    fn lead<F>(&self, key: &str, start: F) -> (u64, SharedCall<T>)
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let work = start();
        let registry = Arc::downgrade(&self.calls);
        let owned = key.to_string();
        let future = async move {
            let result = work.await;
            land(&registry, &owned, id);
            result
        }
        .boxed()
        .shared();

        let mut calls = self.calls.lock();
        match calls.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let call = entry.get_mut();
                call.waiters += 1;
                debug!(key, waiters = call.waiters, "Joining in-flight call");
                (call.id, call.future.clone())
            }
            Entry::Vacant(entry) => {
                entry.insert(Call {
                    id,
                    waiters: 1,
                    future: future.clone(),
                });
                (id, future)
            }
        }
    }

    fn leave(&self, key: &str, id: u64) {
        let abandoned = {
            let mut calls = self.calls.lock();
            let last = match calls.get_mut(key) {
                Some(call) if call.id == id => {
                    call.waiters -= 1;
                    call.waiters == 0
                }
                _ => false,
            };
            if last {
                calls.remove(key)
            } else {
                None
            }
        };

        // the unfinished call is dropped outside the lock
        if abandoned.is_some() {
            debug!(key, "Every waiter left, dropping call");
        }
    }
}

/// Remove the entry of a call that has resolved
fn land<T>(registry: &Weak<Calls<T>>, key: &str, id: u64) {
    let Some(calls) = registry.upgrade() else {
        return;
    };
    let mut calls = calls.lock();
    if calls.get(key).is_some_and(|call| call.id == id) {
        calls.remove(key);
    }
}

struct Landing<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    group: &'a FlightGroup<T>,
    key: &'a str,
    id: u64,
}

impl<T> Drop for Landing<'_, T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.group.leave(self.key, self.id);
    }
}

// =============================================================================
// Single-Flight Cache
// =============================================================================

/// Cache decorator that deduplicates concurrent identical calls
pub struct SingleFlightCache<V> {
    cache: Arc<dyn Cache<V>>,
    gets: FlightGroup<V>,
    sets: FlightGroup<()>,
    deletes: FlightGroup<()>,
}

impl<V> SingleFlightCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wrap `cache`
    pub fn new(cache: Arc<dyn Cache<V>>) -> Self {
        Self {
            cache,
            gets: FlightGroup::new(),
            sets: FlightGroup::new(),
            deletes: FlightGroup::new(),
        }
    }

    /// Number of keys with any call in flight, summed over operation kinds
    pub fn in_flight(&self) -> usize {
        self.gets.in_flight() + self.sets.in_flight() + self.deletes.in_flight()
    }
}

#[async_trait]
impl<V> Cache<V> for SingleFlightCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        let cache = Arc::clone(&self.cache);
        let owned = key.to_string();
        self.gets
            .run(key, move || async move { cache.get(&owned).await }.boxed())
            .await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let owned = key.to_string();
        self.sets
            .run(key, move || {
                async move { cache.set(&owned, value).await }.boxed()
            })
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let owned = key.to_string();
        self.deletes
            .run(key, move || async move { cache.delete(&owned).await }.boxed())
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================
