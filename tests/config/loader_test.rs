/*!
 * Config Loading Tests
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use stability_kernel::config::{SamplingStrategy, StabilityConfig, CONFIG_FILE, PYPROJECT_FILE};
use stability_kernel::monitoring::SamplerMode;
use stability_kernel::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const ENV_VARS: [&str; 3] = [
    "STABILITY_SAMPLE_RATE",
    "STABILITY_MAX_TRACES",
    "STABILITY_SAMPLER_MODE",
];

/// Run `f` with `dir` as the working directory, restoring it afterwards
fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
    let previous: PathBuf = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir).unwrap();
    let result = f();
    std::env::set_current_dir(previous).unwrap();
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
    result
}

#[test]
fn test_full_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(
        &path,
        r#"
        sample_rate = 0.8
        error_sample_rate = 1.0

        [[context_sampling_rules]]
        pattern = "health_.*"
        strategy = "never"

        [[context_sampling_rules]]
        pattern = "payments"
        strategy = "random"
        sample_rate = 0.25

        [collector]
        max_traces = 2000

        [scoring.weights]
        timing_stability = 0.4
        memory_stability = 0.1
        error_volatility = 0.3
        branching_entropy = 0.1
        concurrency_chaos = 0.1

        [tuner]
        interval = 30
        baseline_path = "tuned.json"

        [alerts]
        threshold_ev = 0.4
        cooldown = 120
        "#,
    )
    .unwrap();

    let config = StabilityConfig::load_from_file(&path).unwrap();
    assert_eq!(config.sample_rate, 0.8);
    assert_eq!(config.context_sampling_rules.len(), 2);
    assert_eq!(config.context_sampling_rules[0].strategy, SamplingStrategy::Never);
    assert_eq!(config.context_sampling_rules[1].sample_rate, Some(0.25));
    assert_eq!(config.collector.max_traces, 2000);
    assert_eq!(config.scoring.weights.timing_stability, 0.4);
    assert_eq!(config.tuner.interval, Duration::from_secs(30));
    assert_eq!(config.tuner.baseline_path, Some(PathBuf::from("tuned.json")));
    assert_eq!(config.alerts.threshold_ev, 0.4);
    assert_eq!(config.alerts.cooldown, Duration::from_secs(120));
}

#[test]
fn test_out_of_range_values_normalized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(
        &path,
        r#"
        sample_rate = 3.0
        error_sample_rate = -1.0

        [collector]
        max_traces = 0
        "#,
    )
    .unwrap();

    let config = StabilityConfig::load_from_file(&path).unwrap();
    assert_eq!(config.sample_rate, 1.0);
    assert_eq!(config.error_sample_rate, 0.0);
    assert_eq!(config.collector.max_traces, 1);
}

#[test]
fn test_bad_rule_pattern_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(
        &path,
        "[[context_sampling_rules]]\npattern = \"(unclosed\"\nstrategy = \"always\"\n",
    )
    .unwrap();

    assert!(matches!(
        StabilityConfig::load_from_file(&path),
        Err(ConfigError::InvalidPattern { .. })
    ));
}

#[test]
fn test_pyproject_without_section_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(PYPROJECT_FILE),
        "[project]\nname = \"svc\"\n\n[tool.black]\nline-length = 100\n",
    )
    .unwrap();

    let config = StabilityConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config, StabilityConfig::default());
}

#[test]
#[serial]
fn test_load_reads_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(PYPROJECT_FILE),
        "[tool.stability]\nsample_rate = 0.6\n\n[tool.stability.sampler]\nmode = \"surge\"\n",
    )
    .unwrap();

    let config = in_dir(dir.path(), StabilityConfig::load).unwrap();
    assert_eq!(config.sample_rate, 0.6);
    assert_eq!(config.sampler.mode, SamplerMode::Surge);
}

#[test]
#[serial]
fn test_load_applies_environment_last() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        "sample_rate = 0.6\n\n[collector]\nmax_traces = 100\n",
    )
    .unwrap();

    let config = in_dir(dir.path(), || {
        std::env::set_var("STABILITY_SAMPLE_RATE", "0.3");
        std::env::set_var("STABILITY_MAX_TRACES", "250");
        std::env::set_var("STABILITY_SAMPLER_MODE", "error_triggered");
        StabilityConfig::load()
    })
    .unwrap();

    assert_eq!(config.sample_rate, 0.3);
    assert_eq!(config.collector.max_traces, 250);
    assert_eq!(config.sampler.mode, SamplerMode::ErrorTriggered);
}

#[test]
#[serial]
fn test_invalid_environment_ignored() {
    let dir = TempDir::new().unwrap();

    let config = in_dir(dir.path(), || {
        std::env::set_var("STABILITY_SAMPLE_RATE", "lots");
        std::env::set_var("STABILITY_SAMPLER_MODE", "chaotic");
        StabilityConfig::load()
    })
    .unwrap();

    assert_eq!(config, StabilityConfig::default());
}
