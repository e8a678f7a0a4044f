/*!
 * Advisor and Alerting Tests
 */

use pretty_assertions::assert_eq;
use stability_kernel::alerts::{AlertEngine, AlertSeverity, HistoryStore, MemoryHistory};
use stability_kernel::config::{AdvisorConfig, AlertConfig, ScoringConfig};
use stability_kernel::scoring::{compute, compute_by_module, Advisor, Tier};
use stability_kernel::trace::{TraceBuilder, TraceRecord};
use std::collections::BTreeMap;

fn healthy() -> Vec<TraceRecord> {
    (0..50)
        .map(|_| TraceBuilder::new("f", "svc.api").duration(0.02).build())
        .collect()
}

fn failing_module() -> Vec<TraceRecord> {
    let mut records = healthy();
    records.extend((0..50).map(|i| {
        let builder = TraceBuilder::new("f", "svc.db").duration(0.02);
        if i % 3 != 0 {
            builder.failed().build()
        } else {
            builder.build()
        }
    }));
    records
}

#[test]
fn test_advisor_on_healthy_run() {
    let report = compute(&healthy(), &ScoringConfig::default());
    let advice = Advisor::analyze(&report, &AdvisorConfig::default());
    assert_eq!(advice.tier, Tier::Excellent);
    assert!(advice.diagnosis.is_empty());
}

#[test]
fn test_advisor_flags_errors() {
    let report = compute(&failing_module(), &ScoringConfig::default());
    let advice = Advisor::analyze(&report, &AdvisorConfig::default());
    assert!(advice
        .diagnosis
        .iter()
        .any(|line| line.contains("error volatility")));
}

#[test]
fn test_error_burst_alert_end_to_end() {
    let config = ScoringConfig::default();
    let records = failing_module();
    let report = compute(&records, &config);
    let modules = compute_by_module(&records, &config);

    let engine = AlertEngine::from_config(&AlertConfig::default()).unwrap();
    let alerts = engine.run(&report, &[], &modules);

    let burst = alerts
        .iter()
        .find(|alert| alert.rule_name == "Error Burst")
        .expect("error burst alert");
    assert_eq!(burst.severity, AlertSeverity::Critical);
    assert!(burst.current_value < burst.threshold);
}

#[test]
fn test_regression_uses_stored_history() {
    let history = MemoryHistory::new(10);
    let good = compute(&healthy(), &ScoringConfig::default());
    for _ in 0..5 {
        history.save(&good, BTreeMap::new()).unwrap();
    }

    let bad = compute(&failing_module(), &ScoringConfig::default());
    assert!(f64::from(bad.pss) < f64::from(good.pss) - 10.0);

    let past = history.get_history(5, None).unwrap();
    let engine = AlertEngine::from_config(&AlertConfig::default()).unwrap();
    let alerts = engine.run(&bad, &past, &BTreeMap::new());
    assert!(alerts
        .iter()
        .any(|alert| alert.rule_name == "Stability Regression"));
}

#[test]
fn test_custom_module_rule_from_config() {
    let config: AlertConfig = toml::from_str(
        r#"
        [[custom_rules]]
        name = "Database flaky"
        severity = "critical"
        module_pattern = "svc\\.db"
        conditions = [{ metric = "error_volatility", operator = "<", value = 0.5 }]
        "#,
    )
    .unwrap();

    let records = failing_module();
    let scoring = ScoringConfig::default();
    let engine = AlertEngine::from_config(&config).unwrap();
    let alerts = engine.run(
        &compute(&records, &scoring),
        &[],
        &compute_by_module(&records, &scoring),
    );

    let custom: Vec<_> = alerts
        .iter()
        .filter(|alert| alert.rule_name == "Database flaky")
        .collect();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].module.as_deref(), Some("svc.db"));
}
