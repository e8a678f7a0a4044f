/*!
 * Limits and Defaults
 *
 * Centralized location for every default threshold, window size and constant
 * used by the collector, scoring engine and control loops.
 * Organized by component for maintainability and discoverability.
 *
 * - Performance-sensitive constants are marked with [PERF]
 * - Values that change scoring output are marked with [SCORE]
 */

use std::time::Duration;

// =============================================================================
// COLLECTOR
// =============================================================================

/// Default collector capacity (records retained across all shards)
pub const DEFAULT_MAX_TRACES: usize = 10_000;

/// Capacity below which the collector uses a single shard
/// [PERF] Contention only matters at scale
pub const DEFAULT_SHARDING_THRESHOLD: usize = 1_000;

/// Shard count used once capacity reaches the sharding threshold
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// Upper bound on configured shard count
pub const MAX_SHARD_COUNT: usize = 512;

// =============================================================================
// SCORING WEIGHTS
// =============================================================================

pub const DEFAULT_WEIGHT_TIMING: f64 = 0.30;
pub const DEFAULT_WEIGHT_MEMORY: f64 = 0.20;
pub const DEFAULT_WEIGHT_ERRORS: f64 = 0.20;
pub const DEFAULT_WEIGHT_BRANCHING: f64 = 0.15;
pub const DEFAULT_WEIGHT_CONCURRENCY: f64 = 0.15;

// =============================================================================
// SCORING SENSITIVITY
// =============================================================================

/// CV decay for timing and wait-time dispersion [SCORE]
pub const DEFAULT_ALPHA: f64 = 2.0;

/// Tail-ratio sensitivity [SCORE]
pub const DEFAULT_BETA: f64 = 1.0;

/// Memory metric decay [SCORE]
pub const DEFAULT_GAMMA: f64 = 2.0;

/// Peak/median ratio above which a memory spike is penalized again [SCORE]
pub const DEFAULT_MEM_SPIKE_THRESHOLD_RATIO: f64 = 1.5;

/// Error metric decay [SCORE]
pub const DEFAULT_DELTA: f64 = 1.0;

/// Mean error rate above which the spike penalty applies [SCORE]
pub const DEFAULT_ERROR_SPIKE_THRESHOLD: f64 = 0.1;

/// Error run length that starts the consecutive-error penalty [SCORE]
pub const DEFAULT_CONSECUTIVE_ERROR_THRESHOLD: usize = 3;

/// Initial mean wait (seconds) above which wait dispersion is penalized.
/// The runtime tuner replaces this with a value derived from observed p95.
pub const DEFAULT_CONCURRENCY_WAIT_THRESHOLD: f64 = 0.001;

/// Zero-based cut-point index used for the tail percentile (94 => p95)
pub const DEFAULT_LATENCY_TAIL_PERCENTILE: usize = 94;

/// Floor added to the memory median before division
pub const DEFAULT_MEMORY_EPSILON: f64 = 1e-9;

pub const DEFAULT_ERROR_VMR_MULTIPLIER: f64 = 0.5;
pub const DEFAULT_ERROR_SPIKE_IMPACT_MULTIPLIER: f64 = 0.5;
pub const DEFAULT_CONSECUTIVE_ERROR_DECAY_MULTIPLIER: f64 = 2.0;

/// Mean event-loop lag (seconds) above which concurrency chaos is penalized
pub const DEFAULT_LAG_PENALTY_FLOOR: f64 = 0.01;

/// Lag penalty slope: 0.2s of mean lag zeroes the lag modifier
pub const DEFAULT_LAG_PENALTY_SCALE: f64 = 5.0;

// =============================================================================
// ADAPTIVE SAMPLER
// =============================================================================

pub const DEFAULT_SAMPLE_RATE: f64 = 1.0;
pub const DEFAULT_ERROR_SAMPLE_RATE: f64 = 1.0;

/// Minimum time between two applied rate changes
pub const DEFAULT_SAMPLER_MIN_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_SAMPLER_LAG_THRESHOLD: f64 = 0.05;
pub const DEFAULT_SAMPLER_CHURN_THRESHOLD: f64 = 20.0;
pub const DEFAULT_SAMPLER_ERROR_THRESHOLD: f64 = 0.1;
pub const DEFAULT_SAMPLER_INCREASE_STEP: f64 = 0.1;
pub const DEFAULT_SAMPLER_DECREASE_STEP: f64 = 0.05;
pub const DEFAULT_SAMPLER_MAX_RATE: f64 = 1.0;
pub const DEFAULT_SAMPLER_MIN_RATE: f64 = 0.01;
pub const DEFAULT_SAMPLER_HIGH_QPS_THRESHOLD: f64 = 1_000.0;
pub const DEFAULT_SAMPLER_LOW_NOISE_RATE: f64 = 0.01;

// =============================================================================
// RUNTIME TUNER / ERROR-RATE OBSERVER
// =============================================================================

pub const DEFAULT_TUNER_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_TUNER_WINDOW: usize = 1_000;
pub const DEFAULT_TUNER_MIN_SAMPLES: usize = 100;

/// Threshold = multiplier x p95(wait_time window)
pub const DEFAULT_TUNER_MULTIPLIER: f64 = 1.2;

/// Minimum change before a new threshold is applied and persisted
pub const TUNER_CHANGE_EPSILON: f64 = 1e-4;

pub const DEFAULT_BASELINE_PATH: &str = ".stability_runtime_baseline.json";

pub const DEFAULT_OBSERVER_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_OBSERVER_WINDOW: usize = 100;

// =============================================================================
// ALERTS & ADVISOR
// =============================================================================

pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(3_600);
pub const DEFAULT_REGRESSION_THRESHOLD_DROP: f64 = 10.0;
pub const DEFAULT_REGRESSION_HISTORY_LIMIT: usize = 5;
