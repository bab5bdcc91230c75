//! Cachewright - Cache-Consistency Decorators
//!
//! Composable wrappers that sit between an application and a pair of storage
//! backends, a fast volatile cache and an authoritative source of record, and
//! keep them observably consistent under concurrent readers and writers.
//!
//! # Architecture
//!
//! ```text
//! Ports (domain) → Decorators (cache) → Adapters (backends, schedulers)
//! ```
//!
//! Storage engines are not part of this crate. Anything implementing the
//! [`Cache`](domain::Cache) or [`Database`](domain::Database) port can be
//! wrapped.
//!
//! # Features
//!
//! - Read-through and write-through
//! - Delayed double-delete invalidation with detached, deadline-bound cleanup
//! - Single-flight request deduplication per key and operation
//! - Hash-based sharding with pluggable strategies
//!
//! # Modules
//!
//! - [`adapters`] - In-memory backends, schedulers, hash strategies
//! - [`cache`] - The decorators
//! - [`domain`] - Capability contracts (ports)
//! - [`error`] - Error types

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use cache::{
    DelayDoubleDeleteCache, DoubleDeleteConfig, ReadThroughCache, ShardedCache,
    SingleFlightCache, WriteThroughCache,
};
pub use domain::{Cache, Database, HashStrategy, Loader, Scheduler, Updater};
pub use error::{Error, Result};
