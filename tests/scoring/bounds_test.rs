/*!
 * Score Bounds (property-based)
 */

use proptest::prelude::*;
use stability_kernel::config::{PillarWeights, ScoringConfig};
use stability_kernel::scoring::{compute, compute_by_module, Pillar};
use stability_kernel::trace::{SystemMetrics, TraceBuilder, TraceRecord};

fn arb_unit() -> impl Strategy<Value = TraceRecord> {
    (
        0.0f64..5.0,
        0.0f64..1.0,
        0u64..1_000_000_000,
        any::<bool>(),
        prop::option::of(0usize..6),
        prop::sample::select(vec!["api", "db", "cache"]),
    )
        .prop_map(|(duration, wait, memory, failed, tag, module)| {
            let mut builder = TraceBuilder::new("op", module)
                .duration(duration)
                .wait_time(wait)
                .memory(memory, 0);
            if let Some(tag) = tag {
                builder = builder.branch_tag(format!("branch-{}", tag));
            }
            if failed {
                builder = builder.failed();
            }
            builder.build()
        })
}

fn arb_system() -> impl Strategy<Value = TraceRecord> {
    (0.0f64..2.0, 0.0f64..100.0).prop_map(|(lag, churn)| {
        TraceRecord::system(
            0.0,
            SystemMetrics {
                lag: Some(lag),
                active_tasks: None,
                churn_rate: Some(churn),
            },
        )
    })
}

fn arb_records() -> impl Strategy<Value = Vec<TraceRecord>> {
    prop::collection::vec(prop_oneof![4 => arb_unit(), 1 => arb_system()], 0..200)
}

fn arb_weights() -> impl Strategy<Value = PillarWeights> {
    (0.0f64..3.0, 0.0f64..3.0, 0.0f64..3.0, 0.0f64..3.0, 0.0f64..3.0).prop_map(
        |(ts, ms, ev, be, cc)| PillarWeights {
            timing_stability: ts,
            memory_stability: ms,
            error_volatility: ev,
            branching_entropy: be,
            concurrency_chaos: cc,
        },
    )
}

proptest! {
    #[test]
    fn test_scores_stay_in_range(records in arb_records(), weights in arb_weights()) {
        let config = ScoringConfig { weights, ..ScoringConfig::default() };
        let report = compute(&records, &config);

        prop_assert!(report.pss <= 100);
        for pillar in Pillar::ALL {
            let score = report.breakdown.get(pillar);
            prop_assert!((0.0..=1.0).contains(&score), "{} = {}", pillar, score);
        }
    }

    #[test]
    fn test_compute_is_deterministic(records in arb_records()) {
        let config = ScoringConfig::default();
        prop_assert_eq!(compute(&records, &config), compute(&records, &config));
    }

    #[test]
    fn test_module_reports_in_range(records in arb_records()) {
        let reports = compute_by_module(&records, &ScoringConfig::default());
        let units = records.iter().filter(|r| !r.system_metric).count();
        prop_assert_eq!(reports.is_empty(), units == 0);
        for report in reports.values() {
            prop_assert!(report.pss <= 100);
        }
    }
}
