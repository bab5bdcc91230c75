//! Delayed Double-Delete Cache
//!
//! Cache-aside in front of a source of record, with writes invalidated twice.
//!
//! # Race
//!
//! ```text
//! reader:  get ── miss ── select (old) ─────────────── set(old) ─┐
//! writer:        delete ──────── upsert(new) ──┐                 │
//!                                              └── delay ──── delete
//! ```
//!
//! A reader that selected before the writer's upsert can put the old value
//! back after the writer's first delete. The second delete, run once the
//! delay has passed, removes it again; the next reader loads the new value.
//!
//! # Design
//!
//! - Writes never put the new value in the cache; readers repopulate it
//! - The second delete runs as a detached [`Task`] on the configured
//!   [`Scheduler`], so it outlives the request that triggered it
//! - The second delete has its own deadline; its failures go to the error
//!   handler and never to the caller

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::adapters::TokioScheduler;
use crate::domain::ports::{Cache, Database, Scheduler, Task};
use crate::error::{Error, Result};

/// Default wait before the second delete
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Default deadline for the second delete
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(500);

/// Sink for failures of the second delete, called with the key and error
pub type ErrorHandler = Arc<dyn Fn(&str, Error) + Send + Sync>;

/// Timing configuration for the double delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleDeleteConfig {
    /// Wait between the write and the second delete
    pub delay: Duration,
    /// Deadline for the second delete itself
    pub delete_timeout: Duration,
}

impl Default for DoubleDeleteConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }
}

fn log_error_handler() -> ErrorHandler {
    Arc::new(|key: &str, err: Error| {
        error!(key, error = %err, "Delayed cache delete failed");
    })
}

/// Cache-aside store that deletes twice on every write
pub struct DelayDoubleDeleteCache<V> {
    cache: Arc<dyn Cache<V>>,
    database: Arc<dyn Database<V>>,
    config: DoubleDeleteConfig,
    error_handler: ErrorHandler,
    scheduler: Arc<dyn Scheduler>,
}

impl<V> std::fmt::Debug for DelayDoubleDeleteCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayDoubleDeleteCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V> DelayDoubleDeleteCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create with default timing, logging error handler and tokio scheduler
    pub fn new(cache: Arc<dyn Cache<V>>, database: Arc<dyn Database<V>>) -> Self {
        Self::builder(cache, database).build()
    }

    /// Start building a store over `cache` and `database`
    pub fn builder(
        cache: Arc<dyn Cache<V>>,
        database: Arc<dyn Database<V>>,
    ) -> DelayDoubleDeleteBuilder<V> {
        DelayDoubleDeleteBuilder {
            cache,
            database,
            config: DoubleDeleteConfig::default(),
            error_handler: None,
            scheduler: None,
        }
    }

    /// Timing configuration in use
    pub fn config(&self) -> &DoubleDeleteConfig {
        &self.config
    }

    fn schedule_second_delete(&self, key: &str) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let handler = Arc::clone(&self.error_handler);
        let DoubleDeleteConfig {
            delay,
            delete_timeout,
        } = self.config.clone();
        let owned = key.to_string();

        let task: Task = async move {
            tokio::time::sleep(delay).await;
            let outcome = match tokio::time::timeout(delete_timeout, cache.delete(&owned)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    key: owned.clone(),
                    after: delete_timeout,
                }),
            };
            match outcome {
                Ok(()) => debug!(key = %owned, "Delayed cache delete done"),
                Err(err) => handler(owned.as_str(), err),
            }
        }
        .boxed();

        self.scheduler.submit(task)?;
        debug!(key, delay = ?delay, "Scheduled delayed cache delete");
        Ok(())
    }
}

#[async_trait]
impl<V> Cache<V> for DelayDoubleDeleteCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        match self.cache.get(key).await {
            Err(err) if err.is_miss() => {
                debug!(key, "Cache miss, selecting from source of record");
                let value = self.database.select(key).await?;
                self.cache.set(key, value.clone()).await?;
                Ok(value)
            }
            other => other,
        }
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, error = %e, "Set aborted: cache invalidation failed");
            return Err(e);
        }
        if let Err(e) = self.database.upsert(key, value).await {
            warn!(key, error = %e, "Set aborted: upsert failed");
            return Err(e);
        }
        self.schedule_second_delete(key)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, error = %e, "Delete aborted: cache invalidation failed");
            return Err(e);
        }
        if let Err(e) = self.database.delete(key).await {
            warn!(key, error = %e, "Delete aborted: source delete failed");
            return Err(e);
        }
        self.schedule_second_delete(key)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`DelayDoubleDeleteCache`]
pub struct DelayDoubleDeleteBuilder<V> {
    cache: Arc<dyn Cache<V>>,
    database: Arc<dyn Database<V>>,
    config: DoubleDeleteConfig,
    error_handler: Option<ErrorHandler>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl<V> DelayDoubleDeleteBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Replace the whole timing configuration
    pub fn config(mut self, config: DoubleDeleteConfig) -> Self {
        self.config = config;
        self
    }

    /// Wait before the second delete
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Deadline for the second delete
    pub fn delete_timeout(mut self, timeout: Duration) -> Self {
        self.config.delete_timeout = timeout;
        self
    }

    /// Sink for second-delete failures
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Where second deletes are submitted
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Build the store, filling in defaults for anything not set
    pub fn build(self) -> DelayDoubleDeleteCache<V> {
        DelayDoubleDeleteCache {
            cache: self.cache,
            database: self.database,
            config: self.config,
            error_handler: self.error_handler.unwrap_or_else(log_error_handler),
            scheduler: self
                .scheduler
                .unwrap_or_else(|| Arc::new(TokioScheduler::new())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
