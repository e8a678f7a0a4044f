/*!
 * Collector Tests
 */

use proptest::prelude::*;
use stability_kernel::config::CollectorConfig;
use stability_kernel::monitoring::Collector;
use stability_kernel::trace::{TraceBuilder, TraceRecord};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn record(id: usize) -> TraceRecord {
    TraceBuilder::new(format!("unit-{}", id), "m")
        .timestamp(id as f64)
        .build()
}

#[test]
fn test_set_equality_below_capacity() {
    let collector = Arc::new(Collector::new(50_000));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let collector = Arc::clone(&collector);
            thread::spawn(move || {
                for i in 0..1_000 {
                    collector.add(record(t * 1_000 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let names: BTreeSet<String> = collector.snapshot().iter().map(|r| r.name.clone()).collect();
    let expected: BTreeSet<String> = (0..4_000).map(|i| format!("unit-{}", i)).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_eviction_totals_with_many_producers() {
    let collector = Arc::new(Collector::with_config(&CollectorConfig {
        max_traces: 1_024,
        sharding_threshold: 1_000,
        shard_count: 8,
    }));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let collector = Arc::clone(&collector);
            thread::spawn(move || {
                for i in 0..2_000 {
                    collector.add(record(t * 2_000 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = collector.stats();
    assert_eq!(stats.added, 16_000);
    assert!(collector.len() <= collector.capacity());
    assert_eq!(stats.added - stats.evicted, collector.len() as u64);
}

#[test]
fn test_full_sharded_collector_retains_capacity() {
    let collector = Collector::with_config(&CollectorConfig {
        max_traces: 1_024,
        sharding_threshold: 1_000,
        shard_count: 8,
    });
    assert_eq!(collector.shard_count(), 8);
    assert_eq!(collector.capacity(), 1_024);

    let shards = collector.shard_count();
    let rounds = 300;
    for round in 0..rounds {
        for key in 0..shards {
            collector.add_from(key as u64, record(round * shards + key));
        }
    }

    let added = (rounds * shards) as u64;
    let stats = collector.stats();
    assert_eq!(collector.len(), collector.capacity());
    assert_eq!(stats.added, added);
    assert_eq!(stats.evicted, added - collector.capacity() as u64);

    // Each shard keeps its newest 128 records
    let kept_from = (rounds - collector.capacity() / shards) * shards;
    let names: BTreeSet<String> = collector.snapshot().iter().map(|r| r.name.clone()).collect();
    let expected: BTreeSet<String> = (kept_from..rounds * shards)
        .map(|i| format!("unit-{}", i))
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn test_observers_see_every_record() {
    let collector = Arc::new(Collector::new(10));
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    collector.register_observer(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let collector = Arc::clone(&collector);
            thread::spawn(move || {
                for i in 0..250 {
                    collector.add(record(t * 250 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Observers fire for evicted records too
    assert_eq!(seen.load(Ordering::Relaxed), 1_000);
    assert!(collector.len() <= 10);
}

proptest! {
    #[test]
    fn test_single_producer_keeps_newest(capacity in 1usize..200, count in 0usize..600) {
        let collector = Collector::new(capacity);
        for i in 0..count {
            collector.add(record(i));
        }

        let snapshot = collector.snapshot();
        let retained = count.min(collector.capacity());
        prop_assert_eq!(snapshot.len(), retained);

        // One producer maps to one shard, so the newest records survive in order
        if collector.shard_count() == 1 {
            let expected: Vec<String> =
                (count - retained..count).map(|i| format!("unit-{}", i)).collect();
            let names: Vec<String> = snapshot.iter().map(|r| r.name.clone()).collect();
            prop_assert_eq!(names, expected);
        }

        let stats = collector.stats();
        prop_assert_eq!(stats.added, count as u64);
        prop_assert_eq!(stats.evicted, (count - retained) as u64);
    }

    #[test]
    fn test_snapshot_sorted(timestamps in prop::collection::vec(0.0f64..1e6, 0..300)) {
        let collector = Collector::new(10_000);
        for (i, ts) in timestamps.iter().enumerate() {
            collector.add_from(i as u64, TraceBuilder::new("u", "m").timestamp(*ts).build());
        }
        let snapshot = collector.snapshot();
        prop_assert_eq!(snapshot.len(), timestamps.len());
        prop_assert!(snapshot.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
