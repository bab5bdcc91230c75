//! Cachewright Demo
//!
//! Assembles a full decorator stack over in-memory backends, drives it with
//! concurrent readers and writers, then checks that the cache and the source
//! of record agree once the delayed deletes have drained.
//!
//! ```text
//! SingleFlight ──▶ DelayDoubleDelete ──▶ Sharded ──▶ MemoryCache × N
//!                        │
//!                        └──▶ MemoryDatabase
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cachewright::adapters::{MemoryCache, MemoryDatabase, TokioScheduler};
use cachewright::{
    Cache, Database, DelayDoubleDeleteCache, DoubleDeleteConfig, ShardedCache, SingleFlightCache,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Drive a cache-consistency decorator stack and verify it converges
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of cache shards
    #[arg(long, env = "CACHEWRIGHT_SHARDS", default_value = "4")]
    shards: usize,

    /// Number of distinct keys
    #[arg(long, env = "CACHEWRIGHT_KEYS", default_value = "64")]
    keys: usize,

    /// Concurrent readers per round
    #[arg(long, env = "CACHEWRIGHT_READERS", default_value = "8")]
    readers: usize,

    /// Delay before the second delete, in milliseconds
    #[arg(long, env = "CACHEWRIGHT_DELAY_MS", default_value = "500")]
    delay_ms: u64,

    /// Deadline for the second delete, in seconds
    #[arg(long, env = "CACHEWRIGHT_DELETE_TIMEOUT_SECONDS", default_value = "500")]
    delete_timeout_seconds: u64,

    /// Simulated source-of-record latency, in milliseconds
    #[arg(long, env = "CACHEWRIGHT_DB_LATENCY_MS", default_value = "5")]
    db_latency_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("Starting cachewright demo");
    info!("  Shards: {}", args.shards);
    info!("  Keys: {}", args.keys);
    info!("  Readers: {}", args.readers);
    info!("  Second delete delay: {} ms", args.delay_ms);

    let buckets: Vec<Arc<dyn Cache<Bytes>>> = (0..args.shards)
        .map(|_| Arc::new(MemoryCache::new()) as Arc<dyn Cache<Bytes>>)
        .collect();
    let sharded = Arc::new(ShardedCache::new(buckets).context("building sharded cache")?);

    let database: Arc<MemoryDatabase<Bytes>> = Arc::new(MemoryDatabase::with_latency(
        Duration::from_millis(args.db_latency_ms),
    ));
    let scheduler = TokioScheduler::new();

    let double_delete = DelayDoubleDeleteCache::builder(sharded, database.clone())
        .config(DoubleDeleteConfig {
            delay: Duration::from_millis(args.delay_ms),
            delete_timeout: Duration::from_secs(args.delete_timeout_seconds),
        })
        .scheduler(Arc::new(scheduler.clone()))
        .build();
    let cache = Arc::new(SingleFlightCache::new(Arc::new(double_delete)));

    let keys: Vec<String> = (0..args.keys).map(|i| format!("item:{}", i)).collect();

    // Seed the source of record
    for key in &keys {
        database.upsert(key, value_for(key, 0)).await?;
    }
    info!(records = database.len(), "Source of record seeded");

    // Round 1: cold reads
    read_round(&cache, &keys, args.readers).await?;
    info!(
        selects = database.stats().reads,
        "Cold read round done (single-flight collapses duplicate misses)"
    );

    // Round 2: writes racing reads
    let writer = {
        let cache = Arc::clone(&cache);
        let keys = keys.clone();
        tokio::spawn(async move {
            for key in &keys {
                cache.set(key, value_for(key, 1)).await?;
            }
            cachewright::Result::Ok(())
        })
    };
    read_round(&cache, &keys, args.readers).await?;
    writer.await.context("writer task panicked")??;
    info!("Write round done");

    // Round 3: deletes
    for key in keys.iter().step_by(4) {
        cache.delete(key).await?;
    }
    info!(records = database.len(), "Delete round done");

    info!(outstanding = scheduler.len(), "Waiting for delayed deletes");
    scheduler.shutdown().await;

    let stale = verify(&cache, database.as_ref(), &keys).await?;
    if stale > 0 {
        bail!("{} keys disagree with the source of record", stale);
    }

    info!("Cache and source of record agree on all {} keys", keys.len());
    Ok(())
}

fn value_for(key: &str, version: u32) -> Bytes {
    Bytes::from(format!("{}@v{}", key, version))
}

async fn read_round(
    cache: &Arc<SingleFlightCache<Bytes>>,
    keys: &[String],
    readers: usize,
) -> anyhow::Result<()> {
    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let cache = Arc::clone(cache);
            let keys = keys.to_vec();
            tokio::spawn(async move {
                for key in &keys {
                    match cache.get(key).await {
                        Ok(_) => {}
                        Err(e) if e.is_miss() => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.await.context("reader task panicked")??;
    }
    Ok(())
}

async fn verify(
    cache: &SingleFlightCache<Bytes>,
    database: &MemoryDatabase<Bytes>,
    keys: &[String],
) -> anyhow::Result<usize> {
    let mut stale = 0;
    for key in keys {
        let cached = cache.get(key).await;
        let recorded = database.select(key).await;
        let agree = match (&cached, &recorded) {
            (Ok(a), Ok(b)) => a == b,
            (Err(a), Err(b)) => a.is_miss() && b.is_miss(),
            _ => false,
        };
        if !agree {
            warn!(key = %key, ?cached, ?recorded, "Cache disagrees with source of record");
            stale += 1;
        }
    }
    Ok(stale)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("tokio=warn".parse().context("invalid log directive")?);

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
    Ok(())
}
