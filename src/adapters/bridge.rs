//! Source-of-Record Bridges
//!
//! Adapt a [`Database`] to the [`Loader`] and [`Updater`] ports so the
//! read-through and write-through decorators can sit in front of it.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::domain::ports::{Database, Loader, Updater};
use crate::error::Result;

/// Loader that reads from a source of record with `select`
#[derive(Debug, Clone)]
pub struct DatabaseLoader<D, V> {
    database: D,
    _value: PhantomData<fn() -> V>,
}

impl<D, V> DatabaseLoader<D, V> {
    /// Wrap `database`
    pub fn new(database: D) -> Self {
        Self {
            database,
            _value: PhantomData,
        }
    }
}

#[async_trait]
impl<D, V> Loader<V> for DatabaseLoader<D, V>
where
    D: Database<V>,
    V: Send + 'static,
{
    async fn load(&self, key: &str) -> Result<V> {
        self.database.select(key).await
    }
}

/// Updater that writes to a source of record with `upsert`
#[derive(Debug, Clone)]
pub struct DatabaseUpdater<D, V> {
    database: D,
    _value: PhantomData<fn(V)>,
}

impl<D, V> DatabaseUpdater<D, V> {
    /// Wrap `database`
    pub fn new(database: D) -> Self {
        Self {
            database,
            _value: PhantomData,
        }
    }
}

#[async_trait]
impl<D, V> Updater<V> for DatabaseUpdater<D, V>
where
    D: Database<V>,
    V: Send + 'static,
{
    async fn update(&self, key: &str, value: V) -> Result<()> {
        self.database.upsert(key, value).await
    }
}
