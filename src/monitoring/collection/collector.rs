/*!
 * Trace Collector
 * Bounded, sharded intake for trace records
 *
 * Each shard is a fixed-capacity FIFO ring behind its own lock. Producers
 * pick a shard from their thread identity, so concurrent producers rarely
 * contend. A full shard silently evicts its oldest record.
 */

use super::observers::{Observer as ObserverFn, ObserverId, ObserverRegistry};
use crate::config::CollectorConfig;
use crate::core::shard_manager::ShardManager;
use crate::trace::TraceRecord;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Collector counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorStats {
    pub added: u64,
    pub evicted: u64,
    pub observers: usize,
}

#[repr(align(64))]
struct Shard {
    ring: Mutex<HeapRb<Arc<TraceRecord>>>,
}

impl Shard {
    fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(HeapRb::new(capacity)),
        }
    }
}

/// Concurrent trace collector
///
/// # Performance
///
/// `add` is O(1) under one shard lock; observers run after the lock is
/// released. `snapshot` locks shards one at a time and sorts the merged
/// records, so it is O(n log n) and meant for the scoring path only.
pub struct Collector {
    shards: Box<[Shard]>,
    shard_capacity: usize,
    observers: ObserverRegistry,
    added: AtomicU64,
    evicted: AtomicU64,
}

impl Collector {
    /// Create a collector holding at most `max_traces` records
    pub fn new(max_traces: usize) -> Self {
        Self::with_config(&CollectorConfig {
            max_traces,
            ..CollectorConfig::default()
        })
    }

    pub fn with_config(config: &CollectorConfig) -> Self {
        let capacity = config.max_traces.max(1);
        let shard_count = ShardManager::shards_for_capacity(
            capacity,
            config.sharding_threshold,
            config.shard_count,
        );
        let shard_capacity = ShardManager::shard_capacity(capacity, shard_count);

        tracing::debug!(
            capacity,
            shard_count,
            shard_capacity,
            "Creating trace collector"
        );

        Self {
            shards: (0..shard_count).map(|_| Shard::new(shard_capacity)).collect(),
            shard_capacity,
            observers: ObserverRegistry::new(),
            added: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// Store a record from the calling thread
    #[inline]
    pub fn add(&self, record: impl Into<Arc<TraceRecord>>) {
        self.add_from(ShardManager::current_producer_key(), record);
    }

    /// Store a record on behalf of an explicit producer
    pub fn add_from(&self, producer_key: u64, record: impl Into<Arc<TraceRecord>>) {
        let record = record.into();
        let index = ShardManager::select_shard(producer_key, self.shards.len());

        let evicted = {
            let mut ring = self.shards[index].ring.lock();
            ring.push_overwrite(Arc::clone(&record))
        };

        self.added.fetch_add(1, Ordering::Relaxed);
        if evicted.is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }

        self.observers.notify(&record);
    }

    /// All retained records ordered by start timestamp
    ///
    /// Records with equal timestamps keep shard order.
    pub fn snapshot(&self) -> Vec<Arc<TraceRecord>> {
        let mut records = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            let ring = shard.ring.lock();
            records.extend(ring.iter().cloned());
        }
        records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        records
    }

    /// Drop every retained record
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.ring.lock().clear();
        }
    }

    /// Register a callback run synchronously for every added record
    ///
    /// Callbacks must be cheap and must not add to this collector.
    pub fn register_observer<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&TraceRecord) + Send + Sync + 'static,
    {
        let observer: ObserverFn = Arc::new(observer);
        self.observers.register(observer)
    }

    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /// Records currently retained
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.ring.lock().occupied_len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Effective capacity (shard count x per-shard capacity)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shard_capacity * self.shards.len()
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn stats(&self) -> CollectorStats {
        CollectorStats {
            added: self.added.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            observers: self.observers.len(),
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::with_config(&CollectorConfig::default())
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("shards", &self.shards.len())
            .field("shard_capacity", &self.shard_capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
