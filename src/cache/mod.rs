//! Cache Decorators
//!
//! Composable wrappers that enforce a coherence protocol between a cache and
//! a source of record. Each decorator owns an inner [`Cache`] and implements
//! the full contract itself, forwarding what it does not change.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ caller ──▶ SingleFlight ──▶ DelayDoubleDelete ──▶ Sharded         │
//! │                                  │                  │  │  │       │
//! │                                  ▼                  ▼  ▼  ▼       │
//! │                              Database            Cache × N        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stacks are assembled by the integrator:
//!
//! ```ignore
//! let buckets: Vec<Arc<dyn Cache<Bytes>>> =
//!     (0..4).map(|_| Arc::new(MemoryCache::new()) as _).collect();
//! let sharded = Arc::new(ShardedCache::new(buckets)?);
//! let ddd = Arc::new(DelayDoubleDeleteCache::new(sharded, database));
//! let cache = SingleFlightCache::new(ddd);
//! ```
//!
//! # Decorators
//!
//! - [`ReadThroughCache`] - loads misses through a [`Loader`]
//! - [`WriteThroughCache`] - persists writes through an [`Updater`]
//! - [`DelayDoubleDeleteCache`] - cache-aside with a delayed second delete
//! - [`SingleFlightCache`] - collapses concurrent identical calls
//! - [`ShardedCache`] - routes keys over independent buckets
//!
//! [`Cache`]: crate::domain::Cache
//! [`Loader`]: crate::domain::Loader
//! [`Updater`]: crate::domain::Updater

mod double_delete;
mod read_through;
mod sharded;
mod single_flight;
mod write_through;

#[cfg(test)]
pub(crate) mod testing;

pub use double_delete::{
    DelayDoubleDeleteBuilder, DelayDoubleDeleteCache, DoubleDeleteConfig, ErrorHandler,
    DEFAULT_DELAY, DEFAULT_DELETE_TIMEOUT,
};
pub use read_through::ReadThroughCache;
pub use sharded::ShardedCache;
pub use single_flight::{FlightGroup, SingleFlightCache};
pub use write_through::WriteThroughCache;
