/*!
 * Shard Selection
 *
 * Pure functions deciding how many shards the collector uses and which shard
 * a given producer writes to.
 *
 * # Design: Pure Functions Over Singleton
 *
 * Shard selection is a function of (producer key, shard count) only, so it
 * inlines into the collector hot path and is trivially testable. Affinity
 * reduces lock contention; no correctness property depends on it.
 */

use crate::core::limits::MAX_SHARD_COUNT;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::OnceLock;

/// Fixed seeds keep producer keys stable for the process lifetime
const PRODUCER_HASH_SEEDS: (u64, u64, u64, u64) = (
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
);

fn producer_hasher() -> &'static ahash::RandomState {
    static STATE: OnceLock<ahash::RandomState> = OnceLock::new();
    STATE.get_or_init(|| {
        let (k0, k1, k2, k3) = PRODUCER_HASH_SEEDS;
        ahash::RandomState::with_seeds(k0, k1, k2, k3)
    })
}

/// Shard configuration (pure functions)
pub struct ShardManager;

impl ShardManager {
    /// Number of shards for a collector of `capacity` records
    ///
    /// Below `sharding_threshold` a single shard is used.
    #[inline]
    pub fn shards_for_capacity(
        capacity: usize,
        sharding_threshold: usize,
        shard_count: usize,
    ) -> usize {
        if capacity < sharding_threshold {
            1
        } else {
            shard_count.clamp(1, MAX_SHARD_COUNT)
        }
    }

    /// Per-shard FIFO capacity: floor(capacity / shards), at least 1
    #[inline]
    pub fn shard_capacity(capacity: usize, shards: usize) -> usize {
        (capacity / shards.max(1)).max(1)
    }

    /// Stable key for the calling thread
    #[inline]
    pub fn current_producer_key() -> u64 {
        Self::producer_key(&std::thread::current().id())
    }

    /// Stable key for an arbitrary producer identity
    #[inline]
    pub fn producer_key<T: Hash + ?Sized>(identity: &T) -> u64 {
        let mut hasher = producer_hasher().build_hasher();
        identity.hash(&mut hasher);
        hasher.finish()
    }

    /// Select the shard a producer writes to
    #[inline(always)]
    pub fn select_shard(producer_key: u64, shard_count: usize) -> usize {
        if shard_count <= 1 {
            return 0;
        }
        if shard_count.is_power_of_two() {
            (producer_key as usize) & (shard_count - 1)
        } else {
            (producer_key % shard_count as u64) as usize
        }
    }
}
