/*!
 * Runtime Lifecycle Tests
 */

use stability_kernel::alerts::{HistoryStore, MemoryHistory};
use stability_kernel::config::{SamplingRule, SamplingStrategy, TunerConfig};
use stability_kernel::monitoring::{Collector, RuntimeBaseline};
use stability_kernel::trace::{SystemMetrics, TraceBuilder, TraceRecord};
use stability_kernel::{StabilityConfig, StabilityRuntime};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn fast_config(dir: &TempDir) -> StabilityConfig {
    let mut config = StabilityConfig::default();
    config.tuner.interval = Duration::from_millis(20);
    config.tuner.min_samples = 10;
    config.tuner.baseline_path = Some(dir.path().join("baseline.json"));
    config.error_observer.interval = Duration::from_millis(20);
    config.sampler.min_interval = Duration::ZERO;
    config
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_feedback_loops_run_while_started() {
    let dir = TempDir::new().unwrap();
    let runtime = StabilityRuntime::builder()
        .with_config(fast_config(&dir))
        .build()
        .unwrap();
    runtime.start();

    for _ in 0..50 {
        runtime.record(
            TraceBuilder::new("query", "svc.db")
                .duration(0.05)
                .wait_time(0.05)
                .build(),
        );
    }

    // Tuner: 1.2 x p95 of a constant 50 ms wait
    let shared = Arc::clone(runtime.shared());
    assert!(wait_for(|| (shared.concurrency_wait_threshold() - 0.06).abs() < 1e-9).await);
    assert!(dir.path().join("baseline.json").is_file());

    // Observer: a calm window backs the sampler off
    assert!(wait_for(|| shared.sample_rate() < 1.0).await);

    runtime.shutdown().await;
    assert!(!runtime.is_running());
    assert_eq!(runtime.collector().stats().observers, 0);
}

#[test]
fn test_baseline_survives_restart() {
    let dir = TempDir::new().unwrap();
    RuntimeBaseline::new(0.2)
        .save(&dir.path().join("baseline.json"))
        .unwrap();

    let runtime = StabilityRuntime::builder()
        .with_config(fast_config(&dir))
        .build()
        .unwrap();
    assert_eq!(runtime.shared().concurrency_wait_threshold(), 0.2);

    // Wait dispersion below the tuned threshold is not chaos
    let untuned = StabilityRuntime::builder()
        .with_config(StabilityConfig {
            tuner: TunerConfig {
                baseline_path: None,
                ..TunerConfig::default()
            },
            ..StabilityConfig::default()
        })
        .build()
        .unwrap();
    for i in 0..20 {
        let wait = if i % 2 == 0 { 0.05 } else { 0.15 };
        let record = TraceBuilder::new("f", "m")
            .duration(0.01)
            .wait_time(wait)
            .build();
        runtime.record(record.clone());
        untuned.record(record);
    }
    assert_eq!(runtime.report().breakdown.concurrency_chaos, 1.0);
    assert!(untuned.report().breakdown.concurrency_chaos < 1.0);
}

#[test]
fn test_producers_through_gate() {
    let dir = TempDir::new().unwrap();
    let mut config = fast_config(&dir);
    config.sample_rate = 0.5;
    config.context_sampling_rules = vec![SamplingRule {
        pattern: "health".to_string(),
        strategy: SamplingStrategy::Never,
        sample_rate: None,
    }];

    let runtime = Arc::new(
        StabilityRuntime::builder()
            .with_config(config)
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let runtime = Arc::clone(&runtime);
            thread::spawn(move || {
                let gate = runtime.gate();
                for i in 0..500 {
                    let name = if i % 2 == 0 { "health" } else { "work" };
                    let failed = i % 50 == 1;
                    let started = gate.should_start(name, "svc");
                    if gate.should_record(failed, started) {
                        let builder = TraceBuilder::new(name, format!("svc.{}", t)).duration(0.01);
                        let builder = if failed { builder.failed() } else { builder };
                        runtime.record(builder.build());
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = runtime.collector().snapshot();
    // Health units are never admitted, failures always are
    assert!(snapshot.iter().all(|r| r.name != "health"));
    assert_eq!(snapshot.iter().filter(|r| r.error).count(), 4 * 10);
    assert!(snapshot.len() < 4 * 250);
    assert_eq!(runtime.report_by_module().len(), 4);
}

#[test]
fn test_alert_history_and_shared_collector() {
    let dir = TempDir::new().unwrap();
    let mut config = fast_config(&dir);
    config.alerts.cooldown = Duration::ZERO;

    let collector = Arc::new(Collector::new(1_000));
    let history = Arc::new(MemoryHistory::new(16));
    let runtime = StabilityRuntime::builder()
        .with_config(config)
        .with_collector(Arc::clone(&collector))
        .with_history(history.clone())
        .build()
        .unwrap();

    for _ in 0..5 {
        collector.add(TraceBuilder::new("f", "m").duration(0.01).build());
        assert!(assert_ok!(runtime.evaluate_alerts()).is_empty());
    }
    assert_eq!(history.len(), 5);

    // A failing run against a clean history
    collector.clear();
    for i in 0..40 {
        let builder = TraceBuilder::new("f", "m").duration(0.01);
        let builder = if i % 3 == 0 { builder } else { builder.failed() };
        collector.add(builder.build());
    }
    let fired = assert_ok!(runtime.evaluate_alerts());
    let names: Vec<&str> = fired.iter().map(|a| a.rule_name.as_str()).collect();
    assert!(names.contains(&"Error Burst"));
    assert!(names.contains(&"Stability Regression"));

    let stored = assert_ok!(history.get_history(1, None));
    assert_eq!(stored[0].pss(), runtime.report().pss);
}

#[test]
fn test_system_lag_lowers_score() {
    let dir = TempDir::new().unwrap();
    let runtime = StabilityRuntime::builder()
        .with_config(fast_config(&dir))
        .build()
        .unwrap();

    for _ in 0..20 {
        runtime.record(TraceBuilder::new("f", "m").duration(0.01).build());
    }
    let calm = runtime.report();

    runtime.record(TraceRecord::system(
        0.0,
        SystemMetrics {
            lag: Some(0.5),
            ..SystemMetrics::default()
        },
    ));
    let lagging = runtime.report();

    assert!(lagging.breakdown.concurrency_chaos < calm.breakdown.concurrency_chaos);
    assert!(lagging.pss < calm.pss);
    assert!(!runtime.advise().summary.is_empty());
}
