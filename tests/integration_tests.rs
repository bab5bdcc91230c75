//! Decorator Stack Integration Tests
//!
//! Exercises composed stacks end to end:
//! - Round-trip through every stack
//! - Miss propagation through every decorator
//! - The stale-read race closed by the delayed double delete
//! - Deduplication across a full production-shaped stack

use std::sync::Arc;
use std::time::Duration;

use cachewright::adapters::{
    DatabaseLoader, DatabaseUpdater, MemoryCache, MemoryDatabase, QueuedScheduler, TokioScheduler,
};
use cachewright::{
    Cache, Database, DelayDoubleDeleteCache, ReadThroughCache, ShardedCache, SingleFlightCache,
    WriteThroughCache,
};

fn memory() -> Arc<MemoryCache<String>> {
    Arc::new(MemoryCache::new())
}

fn database() -> Arc<MemoryDatabase<String>> {
    Arc::new(MemoryDatabase::new())
}

fn sharded(n: usize) -> (Vec<Arc<MemoryCache<String>>>, Arc<ShardedCache<String>>) {
    let buckets: Vec<Arc<MemoryCache<String>>> = (0..n).map(|_| memory()).collect();
    let erased = buckets
        .iter()
        .map(|b| Arc::clone(b) as Arc<dyn Cache<String>>)
        .collect();
    (buckets, Arc::new(ShardedCache::new(erased).unwrap()))
}

// =============================================================================
// Round-Trip
// =============================================================================

mod round_trip {
    use super::*;

    #[tokio::test]
    async fn test_read_write_through_stack() {
        let db = database();
        let inner = memory();
        let write_through = Arc::new(WriteThroughCache::<String>::new(
            inner.clone(),
            Arc::new(DatabaseUpdater::new(db.clone())),
        ));
        let loader = Arc::new(DatabaseLoader::new(db.clone()));
        let cache = ReadThroughCache::<String>::new(write_through, loader);

        cache.set("k", "v".to_string()).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), "v");
        assert_eq!(db.stats().reads, 0, "served from cache");

        // evict behind the stack's back; the next read loads it again
        inner.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), "v");
        assert_eq!(db.stats().reads, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_delete_stack() {
        let db = database();
        let (_, shards) = sharded(4);
        let scheduler = TokioScheduler::new();
        let cache = SingleFlightCache::<String>::new(Arc::new(
            DelayDoubleDeleteCache::<String>::builder(shards, db.clone())
                .delay(Duration::from_millis(50))
                .scheduler(Arc::new(scheduler.clone()))
                .build(),
        ));

        for i in 0..20 {
            cache.set(&format!("k{}", i), format!("v{}", i)).await.unwrap();
        }
        scheduler.shutdown().await;

        for i in 0..20 {
            assert_eq!(cache.get(&format!("k{}", i)).await.unwrap(), format!("v{}", i));
        }
    }

    #[tokio::test]
    async fn test_sharded_read_through_stack() {
        let db = database();
        db.upsert("user:1", "alice".to_string()).await.unwrap();

        let (buckets, shards) = sharded(3);
        let index = shards.bucket_index("user:1");
        let loader = Arc::new(DatabaseLoader::new(db.clone()));
        let cache = ReadThroughCache::<String>::new(shards, loader);

        assert_eq!(cache.get("user:1").await.unwrap(), "alice");
        assert!(buckets[index].contains("user:1"));

        cache.set("user:2", "bob".to_string()).await.unwrap();
        assert_eq!(cache.get("user:2").await.unwrap(), "bob");
    }
}

// =============================================================================
// Miss Propagation
// =============================================================================

mod miss_propagation {
    use super::*;

    async fn assert_miss(cache: &dyn Cache<String>) {
        let err = cache.get("never-written").await.unwrap_err();
        assert!(err.is_miss(), "expected miss, got {:?}", err);
    }

    #[tokio::test]
    async fn test_every_decorator_reports_miss() {
        let db = database();
        let scheduler = Arc::new(QueuedScheduler::new());

        let (_, shards) = sharded(2);
        assert_miss(shards.as_ref()).await;

        let read_through =
            ReadThroughCache::<String>::new(memory(), Arc::new(DatabaseLoader::new(db.clone())));
        assert_miss(&read_through).await;

        let write_through =
            WriteThroughCache::<String>::new(memory(), Arc::new(DatabaseUpdater::new(db.clone())));
        assert_miss(&write_through).await;

        let double_delete = DelayDoubleDeleteCache::<String>::builder(memory(), db.clone())
            .scheduler(scheduler.clone())
            .build();
        assert_miss(&double_delete).await;

        let single_flight = SingleFlightCache::<String>::new(memory());
        assert_miss(&single_flight).await;
    }

    #[tokio::test]
    async fn test_full_stack_reports_miss() {
        let (_, shards) = sharded(4);
        let cache = SingleFlightCache::<String>::new(Arc::new(
            DelayDoubleDeleteCache::<String>::builder(shards, database())
                .scheduler(Arc::new(QueuedScheduler::new()))
                .build(),
        ));
        assert_miss(&cache).await;
    }
}

// =============================================================================
// Delayed Double Delete
// =============================================================================

mod double_delete {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stale_read_race_is_closed() {
        let inner = memory();
        let db: Arc<MemoryDatabase<String>> =
            Arc::new(MemoryDatabase::with_latency(Duration::from_millis(50)));
        db.upsert("k", "v0".to_string()).await.unwrap();

        let scheduler = Arc::new(QueuedScheduler::new());
        let store = Arc::new(
            DelayDoubleDeleteCache::<String>::builder(inner.clone(), db.clone())
                .delay(Duration::from_millis(100))
                .scheduler(scheduler.clone())
                .build(),
        );

        // reader misses and starts selecting the old value
        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get("k").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // writer invalidates and upserts while the reader is mid-select
        store.set("k", "v1".to_string()).await.unwrap();

        // the reader put the pre-write value back after the first delete
        assert_eq!(reader.await.unwrap().unwrap(), "v0");
        assert_eq!(inner.get("k").await.unwrap(), "v0");

        // the second delete clears it once the delay has passed
        scheduler.run_pending().await;
        assert!(!inner.contains("k"));
        assert_eq!(store.get("k").await.unwrap(), "v1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_absent_right_after_write() {
        let inner = memory();
        inner.set("k", "old".to_string()).await.unwrap();

        let store = DelayDoubleDeleteCache::<String>::builder(inner.clone(), database())
            .scheduler(Arc::new(QueuedScheduler::new()))
            .build();

        store.set("k", "new".to_string()).await.unwrap();
        assert!(!inner.contains("k"));
    }
}

// =============================================================================
// Single-Flight
// =============================================================================

mod single_flight {
    use super::*;
    use futures::future::join_all;

    #[tokio::test(start_paused = true)]
    async fn test_full_stack_collapses_concurrent_misses() {
        let db: Arc<MemoryDatabase<String>> =
            Arc::new(MemoryDatabase::with_latency(Duration::from_millis(20)));
        db.upsert("hot", "value".to_string()).await.unwrap();

        let (_, shards) = sharded(4);
        let cache = Arc::new(SingleFlightCache::<String>::new(Arc::new(
            DelayDoubleDeleteCache::<String>::builder(shards, db.clone())
                .scheduler(Arc::new(QueuedScheduler::new()))
                .build(),
        )));

        let results = join_all((0..32).map(|_| {
            let cache = Arc::clone(&cache);
            async move { cache.get("hot").await }
        }))
        .await;

        assert_eq!(db.stats().reads, 1);
        assert!(results.iter().all(|r| matches!(r, Ok(v) if v == "value")));
        assert_eq!(cache.in_flight(), 0);
    }
}
