/*!
 * Scoring Property Tests
 */

use stability_kernel::config::ScoringConfig;
use stability_kernel::monitoring::Collector;
use stability_kernel::scoring::{compute, Pillar, ScoreReport};
use stability_kernel::trace::{SystemMetrics, TraceBuilder, TraceRecord};

fn unit(duration: f64) -> TraceRecord {
    TraceBuilder::new("handler", "app")
        .duration(duration)
        .cpu_time(duration)
        .memory(4096, 0)
        .build()
}

fn with_errors(flags: &[bool]) -> Vec<TraceRecord> {
    flags
        .iter()
        .map(|&failed| {
            let builder = TraceBuilder::new("handler", "app").duration(0.01);
            if failed {
                builder.error("Timeout", "upstream timed out").build()
            } else {
                builder.build()
            }
        })
        .collect()
}

#[test]
fn test_uniform_input_scores_100() {
    let records: Vec<_> = (0..100)
        .map(|_| {
            TraceBuilder::new("handler", "app")
                .duration(0.1)
                .cpu_time(0.1)
                .wait_time(0.000_01)
                .memory(4096, 0)
                .branch_tag("hit")
                .build()
        })
        .collect();
    let report = compute(&records, &ScoringConfig::default());
    assert_eq!(report.pss, 100);
    for pillar in Pillar::ALL {
        assert!((report.breakdown.get(pillar) - 1.0).abs() < 1e-9, "{}", pillar);
    }
}

#[test]
fn test_struct_literal_negative_duration_clamped() {
    let at = |ts: f64, duration: f64| TraceRecord {
        timestamp: ts,
        ..unit(duration)
    };

    let collector = Collector::new(100);
    for i in 0..10 {
        collector.add(at(i as f64, 0.1));
    }
    collector.add(TraceRecord {
        duration: -5.0,
        ..at(10.0, 0.1)
    });

    let mut expected: Vec<_> = (0..10).map(|i| at(i as f64, 0.1)).collect();
    expected.push(at(10.0, 0.0));

    let config = ScoringConfig::default();
    let report = compute(&collector.snapshot(), &config);
    assert_eq!(report, compute(&expected, &config));
    assert!(report.breakdown.timing_stability < 1.0);
}

#[test]
fn test_empty_input_scores_0() {
    let records: Vec<TraceRecord> = Vec::new();
    assert_eq!(compute(&records, &ScoringConfig::default()), ScoreReport::zero());
}

#[test]
fn test_timing_outlier_lowers_timing() {
    let mut records: Vec<_> = (0..99).map(|_| unit(0.1)).collect();
    records.push(unit(10.0));
    let report = compute(&records, &ScoringConfig::default());
    assert!(report.breakdown.timing_stability < 1.0);
    assert!(report.pss < 100);
}

#[test]
fn test_burst_scores_below_spread() {
    let mut spread = vec![false; 100];
    for i in [10, 30, 50, 70, 90] {
        spread[i] = true;
    }
    let mut burst = vec![false; 100];
    for flag in &mut burst[40..45] {
        *flag = true;
    }

    let config = ScoringConfig::default();
    let spread_score = compute(&with_errors(&spread), &config).breakdown.error_volatility;
    let burst_score = compute(&with_errors(&burst), &config).breakdown.error_volatility;
    assert!(burst_score < spread_score);
}

#[test]
fn test_entropy_limits() {
    let config = ScoringConfig::default();

    let single: Vec<_> = (0..20)
        .map(|_| TraceBuilder::new("f", "m").branch_tag("hit").build())
        .collect();
    assert_eq!(compute(&single, &config).breakdown.branching_entropy, 1.0);

    let even: Vec<_> = (0..40)
        .map(|i| {
            TraceBuilder::new("f", "m")
                .branch_tag(["a", "b", "c", "d"][i % 4])
                .build()
        })
        .collect();
    assert!(compute(&even, &config).breakdown.branching_entropy.abs() < 1e-9);
}

#[test]
fn test_memory_spike_detected() {
    let mut records: Vec<_> = (0..19)
        .map(|_| TraceBuilder::new("f", "m").memory(1_000_000, 0).build())
        .collect();
    records.push(TraceBuilder::new("f", "m").memory(5_000_000, 4_000_000).build());
    let report = compute(&records, &ScoringConfig::default());
    assert!(report.breakdown.memory_stability < 0.01);
}

#[test]
fn test_lag_penalizes_concurrency() {
    let mut records: Vec<_> = (0..10).map(|_| unit(0.05)).collect();
    records.push(TraceRecord::system(
        1.0,
        SystemMetrics {
            lag: Some(0.1),
            active_tasks: Some(12.0),
            churn_rate: Some(3.0),
        },
    ));
    let report = compute(&records, &ScoringConfig::default());
    assert!((report.breakdown.concurrency_chaos - 0.5).abs() < 1e-9);
    // Other pillars ignore the system record
    assert!((report.breakdown.timing_stability - 1.0).abs() < 1e-9);
}

#[test]
fn test_malformed_json_records_score() {
    let records: Vec<TraceRecord> = [
        r#"{"name": "a", "module": "m", "duration": "0.1", "error": "false"}"#,
        r#"{"name": "b", "module": "m", "duration": null, "memory": "lots"}"#,
        r#"{"name": 7, "duration": 0.1, "wait_time": -3}"#,
    ]
    .iter()
    .map(|json| TraceRecord::from_json(json).unwrap())
    .collect();

    let report = compute(&records, &ScoringConfig::default());
    assert!(report.pss <= 100);
    for pillar in Pillar::ALL {
        let score = report.breakdown.get(pillar);
        assert!((0.0..=1.0).contains(&score));
    }
}

#[test]
fn test_report_serializes_stable_names() {
    let records: Vec<_> = (0..10).map(|_| unit(0.1)).collect();
    let json = serde_json::to_value(compute(&records, &ScoringConfig::default())).unwrap();
    assert_eq!(json["pss"], 100);
    assert!(json["breakdown"]["timing_stability"].is_number());
    assert!(json["breakdown"]["concurrency_chaos"].is_number());
}
