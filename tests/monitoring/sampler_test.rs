/*!
 * Adaptive Sampler Tests
 */

use stability_kernel::config::{SamplerConfig, SharedTuning};
use stability_kernel::monitoring::{AdaptiveSampler, LoadMetrics, SamplerMode};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn sampler(mode: SamplerMode, initial: f64) -> (AdaptiveSampler, Arc<SharedTuning>) {
    let shared = Arc::new(SharedTuning::new(initial, 0.001));
    let config = SamplerConfig {
        mode,
        min_interval: Duration::ZERO,
        ..SamplerConfig::default()
    };
    (AdaptiveSampler::new(config, Arc::clone(&shared)), shared)
}

fn metrics(lag: f64, churn_rate: f64, error_rate: f64) -> LoadMetrics {
    LoadMetrics {
        lag,
        churn_rate,
        error_rate,
        ..LoadMetrics::default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_balanced_votes_and_backoff() {
    let (sampler, shared) = sampler(SamplerMode::Balanced, 0.5);

    // Two metrics above threshold: +0.2
    sampler.update_metrics(metrics(0.1, 50.0, 0.0));
    assert!(close(sampler.current_rate(), 0.7));
    assert!(close(shared.sample_rate(), 0.7));

    // Everything below half its threshold: -0.05
    sampler.update_metrics(metrics(0.0, 0.0, 0.0));
    assert!(close(sampler.current_rate(), 0.65));

    // In between: unchanged
    sampler.update_metrics(metrics(0.04, 0.0, 0.0));
    assert!(close(sampler.current_rate(), 0.65));
}

#[test]
fn test_rate_stays_in_bounds() {
    let (sampler, _) = sampler(SamplerMode::Balanced, 0.95);
    for _ in 0..5 {
        sampler.update_metrics(metrics(1.0, 100.0, 1.0));
    }
    assert_eq!(sampler.current_rate(), 1.0);

    for _ in 0..100 {
        sampler.update_metrics(metrics(0.0, 0.0, 0.0));
    }
    assert!(close(sampler.current_rate(), 0.01));
}

#[test]
fn test_min_interval_rate_limits() {
    let shared = Arc::new(SharedTuning::new(0.5, 0.001));
    let sampler = AdaptiveSampler::new(
        SamplerConfig {
            min_interval: Duration::from_secs(5),
            ..SamplerConfig::default()
        },
        Arc::clone(&shared),
    );
    let start = Instant::now();

    // Too soon after construction
    sampler.update_metrics_at(metrics(1.0, 0.0, 0.0), start);
    assert_eq!(sampler.current_rate(), 0.5);
    assert_eq!(sampler.last_metrics().lag, 1.0);

    sampler.update_metrics_at(metrics(1.0, 0.0, 0.0), start + Duration::from_secs(6));
    assert!(close(sampler.current_rate(), 0.6));

    sampler.update_metrics_at(metrics(1.0, 0.0, 0.0), start + Duration::from_secs(8));
    assert!(close(sampler.current_rate(), 0.6));
}

#[test]
fn test_mode_overrides() {
    let (high_load, _) = sampler(SamplerMode::HighLoad, 0.5);
    high_load.update_metrics(LoadMetrics {
        trace_count: 20_000,
        window: Duration::from_secs(5),
        ..LoadMetrics::default()
    });
    assert!(close(high_load.current_rate(), 0.01));

    let (errors, _) = sampler(SamplerMode::ErrorTriggered, 0.2);
    errors.update_metrics(metrics(0.0, 0.0, 0.5));
    assert_eq!(errors.current_rate(), 1.0);

    let (surge, _) = sampler(SamplerMode::Surge, 0.2);
    surge.update_metrics(metrics(0.5, 0.0, 0.0));
    assert_eq!(surge.current_rate(), 1.0);

    let (quiet, _) = sampler(SamplerMode::LowNoise, 0.8);
    quiet.update_metrics(metrics(0.0, 0.0, 0.0));
    assert!(close(quiet.current_rate(), 0.01));
}

#[test]
fn test_modes_parse_from_config_names() {
    for mode in SamplerMode::ALL {
        assert_eq!(mode.as_str().parse::<SamplerMode>().unwrap(), mode);
    }
    assert_eq!("high-load".parse::<SamplerMode>().unwrap(), SamplerMode::HighLoad);
    assert!("chaotic".parse::<SamplerMode>().is_err());
}
