/*!
 * Producer Gate Tests
 */

use stability_kernel::config::{ProducerGate, SamplerConfig, SharedTuning, StabilityConfig};
use stability_kernel::monitoring::{AdaptiveSampler, LoadMetrics};
use std::sync::Arc;
use std::time::Duration;

const RULES: &str = r#"
    sample_rate = 0.5
    error_sample_rate = 1.0

    [[context_sampling_rules]]
    pattern = "health"
    strategy = "never"

    [[context_sampling_rules]]
    pattern = "billing\\."
    strategy = "always"

    [[context_sampling_rules]]
    pattern = "billing\\.refunds"
    strategy = "never"

    [[context_sampling_rules]]
    pattern = "batch_"
    strategy = "random"
    sample_rate = 0.1

    [[context_sampling_rules]]
    pattern = "retry"
    strategy = "on_error"
"#;

fn gate() -> (ProducerGate, Arc<SharedTuning>) {
    let config = StabilityConfig::from_toml(RULES).unwrap().validate().unwrap();
    let shared = Arc::new(SharedTuning::new(config.sample_rate, 0.001));
    (ProducerGate::new(&config, Arc::clone(&shared)).unwrap(), shared)
}

#[test]
fn test_rules_from_config() {
    let (gate, _) = gate();

    assert_eq!(gate.effective_rate(false, "health_check", "svc.api"), 0.0);
    assert_eq!(gate.effective_rate(false, "charge", "billing.cards"), 1.0);
    assert_eq!(gate.effective_rate(false, "batch_import", "jobs"), 0.1);
    assert_eq!(gate.effective_rate(false, "retry", "jobs"), 0.0);
    assert_eq!(gate.effective_rate(false, "lookup", "svc.api"), 0.5);
}

#[test]
fn test_earlier_rule_shadows_later() {
    let (gate, _) = gate();
    // "billing\." matches before the more specific refunds rule
    assert_eq!(gate.effective_rate(false, "refund", "billing.refunds"), 1.0);
}

#[test]
fn test_patterns_match_from_start() {
    let (gate, _) = gate();
    assert_eq!(gate.effective_rate(false, "check_health", "svc.api"), 0.5);
    assert_eq!(gate.effective_rate(false, "f", "legacy.billing.cards"), 0.5);
}

#[test]
fn test_errors_bypass_rules() {
    let (gate, _) = gate();
    assert_eq!(gate.effective_rate(true, "health_check", "svc.api"), 1.0);
    assert!(gate.should_record(true, false));
    assert!(!gate.should_record(false, false));
    assert!(gate.should_record(false, true));

    // on_error units are never started but failures are still kept
    assert!(!gate.should_start("retry", "jobs"));
    assert!(gate.should_record(true, false));
}

#[test]
fn test_gate_follows_sampler() {
    let (gate, shared) = gate();
    let sampler = AdaptiveSampler::new(
        SamplerConfig {
            min_interval: Duration::ZERO,
            ..SamplerConfig::default()
        },
        Arc::clone(&shared),
    );

    sampler.update_metrics(LoadMetrics {
        lag: 1.0,
        churn_rate: 100.0,
        error_rate: 1.0,
        ..LoadMetrics::default()
    });
    assert!((gate.effective_rate(false, "lookup", "svc.api") - 0.8).abs() < 1e-9);

    // Rule rates are unaffected
    assert_eq!(gate.effective_rate(false, "health_check", "svc.api"), 0.0);
    assert_eq!(gate.effective_rate(false, "batch_import", "jobs"), 0.1);
}

#[test]
fn test_clones_share_rules_and_rate() {
    let (gate, shared) = gate();
    let clone = gate.clone();
    let handle = std::thread::spawn(move || {
        (0..1_000)
            .filter(|_| clone.should_start("health_check", "svc.api"))
            .count()
    });
    assert_eq!(handle.join().unwrap(), 0);

    shared.set_sample_rate(1.0);
    let clone = gate.clone();
    assert!((0..1_000).all(|_| clone.should_start("lookup", "svc.api")));
}
