//! Domain Layer
//!
//! The capability contracts the decorators depend on.
//!
//! # Usage
//!
//! ```ignore
//! use cachewright::domain::{Cache, Database};
//!
//! async fn warm<C, D>(cache: &C, db: &D, key: &str) -> cachewright::Result<()>
//! where
//!     C: Cache<String>,
//!     D: Database<String>,
//! {
//!     let value = db.select(key).await?;
//!     cache.set(key, value).await
//! }
//! ```

pub mod ports;

pub use ports::{Cache, Database, HashStrategy, Loader, Scheduler, Task, Updater};
