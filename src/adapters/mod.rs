//! Infrastructure Adapters
//!
//! Implementations of the domain ports, following the Port/Adapter
//! (Hexagonal) architecture pattern.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use cachewright::adapters::{MemoryCache, MemoryDatabase, TokioScheduler};
//! use cachewright::cache::DelayDoubleDeleteCache;
//!
//! let cache = DelayDoubleDeleteCache::builder(
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(MemoryDatabase::new()),
//! )
//! .scheduler(Arc::new(TokioScheduler::new()))
//! .build();
//! ```

mod bridge;
mod hash;
mod memory;
mod scheduler;

pub use bridge::{DatabaseLoader, DatabaseUpdater};
pub use hash::{Fnv1a32, Fnv1a64};
pub use memory::{MemoryCache, MemoryDatabase, MemoryStats};
pub use scheduler::{QueuedScheduler, TokioScheduler};
