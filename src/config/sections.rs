/*!
 * Configuration Sections
 * Every tunable parameter, grouped by the component that reads it
 */

use super::gate::SamplingRule;
use crate::alerts::CustomRuleConfig;
use crate::core::errors::ConfigError;
use crate::core::limits::*;
use crate::core::serde::duration_secs;
use crate::monitoring::SamplerMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
///
/// Every field has a default, so a partial TOML file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Initial happy-path sample rate (the sampler adjusts it at runtime)
    pub sample_rate: f64,
    /// Sample rate applied to units that ended in error
    pub error_sample_rate: f64,
    /// Ordered per-name sampling overrides
    pub context_sampling_rules: Vec<SamplingRule>,
    pub collector: CollectorConfig,
    pub scoring: ScoringConfig,
    pub sampler: SamplerConfig,
    pub tuner: TunerConfig,
    pub error_observer: ObserverConfig,
    pub alerts: AlertConfig,
    pub advisor: AdvisorConfig,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            error_sample_rate: DEFAULT_ERROR_SAMPLE_RATE,
            context_sampling_rules: Vec::new(),
            collector: CollectorConfig::default(),
            scoring: ScoringConfig::default(),
            sampler: SamplerConfig::default(),
            tuner: TunerConfig::default(),
            error_observer: ObserverConfig::default(),
            alerts: AlertConfig::default(),
            advisor: AdvisorConfig::default(),
        }
    }
}

impl StabilityConfig {
    /// Normalize out-of-range values and check rule patterns
    ///
    /// Rates are clamped to [0, 1], weights to >= 0 and capacities to >= 1.
    /// Only an uncompilable sampling-rule or alert-rule pattern is reported
    /// as an error.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.sample_rate = unit(self.sample_rate);
        self.error_sample_rate = unit(self.error_sample_rate);

        for rule in &mut self.context_sampling_rules {
            rule.sample_rate = rule.sample_rate.map(unit);
            rule.compile()?;
        }

        self.collector.max_traces = self.collector.max_traces.max(1);
        self.collector.shard_count = self.collector.shard_count.clamp(1, MAX_SHARD_COUNT);

        self.scoring = self.scoring.normalized();

        let sampler = &mut self.sampler;
        sampler.min_rate = unit(sampler.min_rate);
        sampler.max_rate = unit(sampler.max_rate);
        if sampler.min_rate > sampler.max_rate {
            std::mem::swap(&mut sampler.min_rate, &mut sampler.max_rate);
        }
        sampler.low_noise_sample_rate = unit(sampler.low_noise_sample_rate);
        sampler.increase_step = positive(sampler.increase_step);
        sampler.decrease_step = positive(sampler.decrease_step);
        self.sample_rate = self.sample_rate.clamp(sampler.min_rate, sampler.max_rate);

        self.tuner.window_size = self.tuner.window_size.max(1);
        self.tuner.multiplier = positive(self.tuner.multiplier);
        self.error_observer.window_size = self.error_observer.window_size.max(1);

        for rule in &self.alerts.custom_rules {
            rule.compile()?;
        }

        Ok(self)
    }
}

/// Collector capacity and sharding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Total records retained across all shards
    pub max_traces: usize,
    /// Capacity below which a single shard is used
    pub sharding_threshold: usize,
    pub shard_count: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_traces: DEFAULT_MAX_TRACES,
            sharding_threshold: DEFAULT_SHARDING_THRESHOLD,
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

/// Relative pillar weights; re-normalized by their sum at scoring time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarWeights {
    pub timing_stability: f64,
    pub memory_stability: f64,
    pub error_volatility: f64,
    pub branching_entropy: f64,
    pub concurrency_chaos: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            timing_stability: DEFAULT_WEIGHT_TIMING,
            memory_stability: DEFAULT_WEIGHT_MEMORY,
            error_volatility: DEFAULT_WEIGHT_ERRORS,
            branching_entropy: DEFAULT_WEIGHT_BRANCHING,
            concurrency_chaos: DEFAULT_WEIGHT_CONCURRENCY,
        }
    }
}

impl PillarWeights {
    pub fn total(&self) -> f64 {
        self.timing_stability
            + self.memory_stability
            + self.error_volatility
            + self.branching_entropy
            + self.concurrency_chaos
    }
}

/// Scoring sensitivities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: PillarWeights,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub mem_spike_threshold_ratio: f64,
    pub delta: f64,
    pub error_spike_threshold: f64,
    pub consecutive_error_threshold: usize,
    /// Seed value; the runtime tuner owns the live threshold
    pub concurrency_wait_threshold: f64,
    /// Zero-based index into the 99 percentile cut points (94 => p95)
    pub latency_tail_percentile: usize,
    pub memory_epsilon: f64,
    pub error_vmr_multiplier: f64,
    pub error_spike_impact_multiplier: f64,
    pub consecutive_error_decay_multiplier: f64,
    pub lag_penalty_floor: f64,
    pub lag_penalty_scale: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: PillarWeights::default(),
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            gamma: DEFAULT_GAMMA,
            mem_spike_threshold_ratio: DEFAULT_MEM_SPIKE_THRESHOLD_RATIO,
            delta: DEFAULT_DELTA,
            error_spike_threshold: DEFAULT_ERROR_SPIKE_THRESHOLD,
            consecutive_error_threshold: DEFAULT_CONSECUTIVE_ERROR_THRESHOLD,
            concurrency_wait_threshold: DEFAULT_CONCURRENCY_WAIT_THRESHOLD,
            latency_tail_percentile: DEFAULT_LATENCY_TAIL_PERCENTILE,
            memory_epsilon: DEFAULT_MEMORY_EPSILON,
            error_vmr_multiplier: DEFAULT_ERROR_VMR_MULTIPLIER,
            error_spike_impact_multiplier: DEFAULT_ERROR_SPIKE_IMPACT_MULTIPLIER,
            consecutive_error_decay_multiplier: DEFAULT_CONSECUTIVE_ERROR_DECAY_MULTIPLIER,
            lag_penalty_floor: DEFAULT_LAG_PENALTY_FLOOR,
            lag_penalty_scale: DEFAULT_LAG_PENALTY_SCALE,
        }
    }
}

impl ScoringConfig {
    /// Clamp every constant into the range the pillar formulas expect
    pub fn normalized(mut self) -> Self {
        let w = &mut self.weights;
        w.timing_stability = positive(w.timing_stability);
        w.memory_stability = positive(w.memory_stability);
        w.error_volatility = positive(w.error_volatility);
        w.branching_entropy = positive(w.branching_entropy);
        w.concurrency_chaos = positive(w.concurrency_chaos);

        self.alpha = positive(self.alpha);
        self.beta = positive(self.beta);
        self.gamma = positive(self.gamma);
        self.delta = positive(self.delta);
        self.mem_spike_threshold_ratio = positive(self.mem_spike_threshold_ratio);
        self.error_spike_threshold = unit(self.error_spike_threshold);
        self.consecutive_error_threshold = self.consecutive_error_threshold.max(1);
        self.concurrency_wait_threshold = positive(self.concurrency_wait_threshold);
        self.latency_tail_percentile = self.latency_tail_percentile.clamp(49, 98);
        self.memory_epsilon = positive(self.memory_epsilon);
        self.error_vmr_multiplier = positive(self.error_vmr_multiplier);
        self.error_spike_impact_multiplier = positive(self.error_spike_impact_multiplier);
        self.consecutive_error_decay_multiplier = positive(self.consecutive_error_decay_multiplier);
        self.lag_penalty_floor = positive(self.lag_penalty_floor);
        self.lag_penalty_scale = positive(self.lag_penalty_scale);
        self
    }
}

/// Adaptive sampler thresholds and steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub mode: SamplerMode,
    #[serde(with = "duration_secs")]
    pub min_interval: Duration,
    pub lag_threshold: f64,
    pub churn_threshold: f64,
    pub error_threshold: f64,
    pub increase_step: f64,
    pub decrease_step: f64,
    pub max_rate: f64,
    pub min_rate: f64,
    pub high_qps_threshold: f64,
    pub low_noise_sample_rate: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            mode: SamplerMode::default(),
            min_interval: DEFAULT_SAMPLER_MIN_INTERVAL,
            lag_threshold: DEFAULT_SAMPLER_LAG_THRESHOLD,
            churn_threshold: DEFAULT_SAMPLER_CHURN_THRESHOLD,
            error_threshold: DEFAULT_SAMPLER_ERROR_THRESHOLD,
            increase_step: DEFAULT_SAMPLER_INCREASE_STEP,
            decrease_step: DEFAULT_SAMPLER_DECREASE_STEP,
            max_rate: DEFAULT_SAMPLER_MAX_RATE,
            min_rate: DEFAULT_SAMPLER_MIN_RATE,
            high_qps_threshold: DEFAULT_SAMPLER_HIGH_QPS_THRESHOLD,
            low_noise_sample_rate: DEFAULT_SAMPLER_LOW_NOISE_RATE,
        }
    }
}

/// Runtime tuner schedule, window and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    #[serde(with = "duration_secs")]
    pub interval: Duration,
    pub window_size: usize,
    pub min_samples: usize,
    /// Threshold = multiplier x p95(wait_time)
    pub multiplier: f64,
    /// Baseline file; `None` keeps tuned state in memory only
    pub baseline_path: Option<PathBuf>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TUNER_INTERVAL,
            window_size: DEFAULT_TUNER_WINDOW,
            min_samples: DEFAULT_TUNER_MIN_SAMPLES,
            multiplier: DEFAULT_TUNER_MULTIPLIER,
            baseline_path: Some(PathBuf::from(DEFAULT_BASELINE_PATH)),
        }
    }
}

/// Error-rate observer schedule and window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    #[serde(with = "duration_secs")]
    pub interval: Duration,
    pub window_size: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_OBSERVER_INTERVAL,
            window_size: DEFAULT_OBSERVER_WINDOW,
        }
    }
}

/// Alert rule thresholds (pillar scores are in [0, 1])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub enabled: bool,
    pub threshold_pss: f64,
    pub threshold_ts: f64,
    pub threshold_ms: f64,
    pub threshold_ev: f64,
    pub threshold_be: f64,
    pub threshold_cc: f64,
    pub regression_threshold_drop: f64,
    pub regression_history_limit: usize,
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,
    pub custom_rules: Vec<CustomRuleConfig>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_pss: 0.60,
            threshold_ts: 0.70,
            threshold_ms: 0.70,
            threshold_ev: 0.80,
            threshold_be: 0.70,
            threshold_cc: 0.70,
            regression_threshold_drop: DEFAULT_REGRESSION_THRESHOLD_DROP,
            regression_history_limit: DEFAULT_REGRESSION_HISTORY_LIMIT,
            cooldown: DEFAULT_ALERT_COOLDOWN,
            custom_rules: Vec::new(),
        }
    }
}

/// Advisor tiers and per-pillar diagnosis thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub threshold_excellent: u8,
    pub threshold_good: u8,
    pub threshold_warning: u8,
    pub metric_score_critical: f64,
    pub metric_score_warning: f64,
    pub error_critical: f64,
    pub error_warning: f64,
    pub entropy_threshold: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            threshold_excellent: 90,
            threshold_good: 75,
            threshold_warning: 50,
            metric_score_critical: 0.6,
            metric_score_warning: 0.85,
            error_critical: 0.7,
            error_warning: 0.9,
            entropy_threshold: 0.8,
        }
    }
}

#[inline]
fn unit(value: f64) -> f64 {
    crate::core::stats::clamp_unit(value)
}

#[inline]
fn positive(value: f64) -> f64 {
    crate::core::stats::non_negative(value)
}
