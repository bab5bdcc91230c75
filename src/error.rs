//! Error types for the cache decorators

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed backend failure, shareable between coalesced callers
pub type BackendError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while talking to a cache or a source of record
///
/// The type is `Clone` so a single failed execution can be handed to every
/// caller that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The key is absent from the store that was asked
    #[error("key not found: {key}")]
    Miss { key: String },

    /// A cache or source-of-record backend failed
    #[error("backend error: {0}")]
    Backend(#[source] BackendError),

    /// A backend failed without a structured error
    #[error("backend error: {0}")]
    Message(String),

    /// Detached work could not be submitted
    #[error("failed to schedule task: {0}")]
    Scheduler(String),

    /// A delayed delete ran past its deadline
    #[error("delete of key {key} timed out after {after:?}")]
    Timeout { key: String, after: Duration },

    /// A sharded cache needs at least one bucket
    #[error("sharded cache requires at least one bucket")]
    NoBuckets,
}

impl Error {
    /// Build a miss for `key`
    pub fn miss(key: impl Into<String>) -> Self {
        Error::Miss { key: key.into() }
    }

    /// Wrap an arbitrary backend failure
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend(Arc::new(err))
    }

    /// Returns true if this is the miss indicator rather than a failure
    pub fn is_miss(&self) -> bool {
        matches!(self, Error::Miss { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::backend(err)
    }
}

// =============================================================================
// Tests
// =============================================================================
