/*!
 * Adaptive Sampling
 * Feedback control of the shared sample rate
 *
 * Strategy: observe lag, task churn and error rate; sample more while the
 * system looks unstable and back off while it is calm. Adjustments are
 * rate-limited by a minimum interval and clamped to [min_rate, max_rate].
 */

use crate::config::{SamplerConfig, SharedTuning};
use crate::core::stats::non_negative;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Rate adjustment policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerMode {
    /// Vote per metric above threshold; back off when everything is calm
    #[default]
    Balanced,
    /// Drop to the minimum rate under high throughput
    HighLoad,
    /// Sample everything while the error rate is elevated
    ErrorTriggered,
    /// Sample everything while lag is elevated
    Surge,
    /// Drop to the low-noise rate when every metric is near zero
    LowNoise,
}

impl SamplerMode {
    pub const ALL: [SamplerMode; 5] = [
        SamplerMode::Balanced,
        SamplerMode::HighLoad,
        SamplerMode::ErrorTriggered,
        SamplerMode::Surge,
        SamplerMode::LowNoise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplerMode::Balanced => "balanced",
            SamplerMode::HighLoad => "high_load",
            SamplerMode::ErrorTriggered => "error_triggered",
            SamplerMode::Surge => "surge",
            SamplerMode::LowNoise => "low_noise",
        }
    }

    /// Next sample rate, clamped to the configured bounds
    pub fn next_rate(&self, current: f64, metrics: &LoadMetrics, config: &SamplerConfig) -> f64 {
        let rate = match self {
            SamplerMode::Balanced => balanced(current, metrics, config),
            SamplerMode::HighLoad => {
                if metrics.qps() > config.high_qps_threshold {
                    config.min_rate
                } else {
                    balanced(current, metrics, config)
                }
            }
            SamplerMode::ErrorTriggered => {
                if metrics.error_rate > config.error_threshold {
                    config.max_rate
                } else {
                    balanced(current, metrics, config)
                }
            }
            SamplerMode::Surge => {
                if metrics.lag > config.lag_threshold {
                    config.max_rate
                } else {
                    balanced(current, metrics, config)
                }
            }
            SamplerMode::LowNoise => {
                if metrics.lag < config.lag_threshold / 4.0
                    && metrics.churn_rate < config.churn_threshold / 4.0
                    && metrics.error_rate < config.error_threshold / 4.0
                {
                    config.low_noise_sample_rate
                } else {
                    balanced(current, metrics, config)
                }
            }
        };
        bounded(rate, config)
    }
}

impl fmt::Display for SamplerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| format!("unknown sampler mode: {}", s))
    }
}

/// Clamp without panicking on inverted or NaN bounds
#[inline]
fn bounded(rate: f64, config: &SamplerConfig) -> f64 {
    rate.max(config.min_rate).min(config.max_rate)
}

fn balanced(current: f64, metrics: &LoadMetrics, config: &SamplerConfig) -> f64 {
    let votes = [
        metrics.lag > config.lag_threshold,
        metrics.churn_rate > config.churn_threshold,
        metrics.error_rate > config.error_threshold,
    ]
    .into_iter()
    .filter(|&above| above)
    .count();

    let calm = metrics.lag < config.lag_threshold / 2.0
        && metrics.churn_rate < config.churn_threshold / 2.0
        && metrics.error_rate < config.error_threshold / 2.0;

    if votes > 0 {
        (current + config.increase_step * votes as f64).min(config.max_rate)
    } else if calm {
        (current - config.decrease_step).max(config.min_rate)
    } else {
        current
    }
}

/// Metrics pushed by the observers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadMetrics {
    /// Event-loop lag in seconds
    pub lag: f64,
    /// Task churn per second
    pub churn_rate: f64,
    /// Fraction of recent units that failed
    pub error_rate: f64,
    /// Units observed during `window`
    pub trace_count: u64,
    #[serde(with = "crate::core::serde::duration_secs")]
    pub window: Duration,
}

impl LoadMetrics {
    /// Units per second over the window, 0 for an empty window
    pub fn qps(&self) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs > 0.0 {
            self.trace_count as f64 / secs
        } else {
            0.0
        }
    }

    fn sanitized(mut self) -> Self {
        self.lag = non_negative(self.lag);
        self.churn_rate = non_negative(self.churn_rate);
        self.error_rate = non_negative(self.error_rate);
        self
    }
}

struct SamplerState {
    rate: f64,
    last_adjustment: Instant,
    last_metrics: LoadMetrics,
}

/// Adaptive sampler
///
/// Sole writer of the shared sample rate.
pub struct AdaptiveSampler {
    config: SamplerConfig,
    shared: Arc<SharedTuning>,
    state: Mutex<SamplerState>,
}

impl AdaptiveSampler {
    /// Create a sampler starting from the current shared rate
    pub fn new(config: SamplerConfig, shared: Arc<SharedTuning>) -> Self {
        let rate = bounded(shared.sample_rate(), &config);
        shared.set_sample_rate(rate);
        Self {
            config,
            shared,
            state: Mutex::new(SamplerState {
                rate,
                last_adjustment: Instant::now(),
                last_metrics: LoadMetrics::default(),
            }),
        }
    }

    /// Record metrics and adjust the rate if the minimum interval elapsed
    pub fn update_metrics(&self, metrics: LoadMetrics) -> f64 {
        self.update_metrics_at(metrics, Instant::now())
    }

    /// [`update_metrics`](Self::update_metrics) with an explicit clock reading
    pub fn update_metrics_at(&self, metrics: LoadMetrics, now: Instant) -> f64 {
        let metrics = metrics.sanitized();
        let mut state = self.state.lock();
        state.last_metrics = metrics;

        if now.saturating_duration_since(state.last_adjustment) < self.config.min_interval {
            return state.rate;
        }

        let next = self.config.mode.next_rate(state.rate, &metrics, &self.config);
        if next != state.rate {
            info!(
                mode = %self.config.mode,
                from = state.rate,
                to = next,
                lag = metrics.lag,
                churn_rate = metrics.churn_rate,
                error_rate = metrics.error_rate,
                "Adjusting sample rate"
            );
            state.rate = next;
            state.last_adjustment = now;
            self.shared.set_sample_rate(next);
        } else {
            debug!(rate = next, "Sample rate unchanged");
        }
        state.rate
    }

    #[inline]
    pub fn current_rate(&self) -> f64 {
        self.state.lock().rate
    }

    pub fn last_metrics(&self) -> LoadMetrics {
        self.state.lock().last_metrics
    }

    #[inline]
    pub fn mode(&self) -> SamplerMode {
        self.config.mode
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

impl fmt::Debug for AdaptiveSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveSampler")
            .field("mode", &self.config.mode)
            .field("rate", &self.current_rate())
            .finish()
    }
}
