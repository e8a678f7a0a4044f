/*!
 * Producer Gate
 * Per-unit sampling decisions for instrumentation
 *
 * Precedence: `error_sample_rate` for failed units, then the first matching
 * context rule, then the live shared sample rate.
 */

use super::sections::StabilityConfig;
use super::shared::SharedTuning;
use crate::core::errors::ConfigError;
use crate::core::stats::clamp_unit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::Arc;

/// How a matching rule decides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    Always,
    Never,
    /// Rule's own `sample_rate`, or the shared rate when unset
    #[default]
    Random,
    /// Only failed units are kept
    OnError,
}

/// Context sampling override keyed by a name/module pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingRule {
    /// Regex matched at the start of the unit name or module
    pub pattern: String,
    #[serde(default)]
    pub strategy: SamplingStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

impl SamplingRule {
    /// Compile the pattern anchored at the start of the subject
    pub fn compile(&self) -> Result<Regex, ConfigError> {
        Regex::new(&format!("^(?:{})", self.pattern)).map_err(|e| ConfigError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })
    }
}

struct CompiledRule {
    regex: Regex,
    rule: SamplingRule,
}

/// Sampling decisions for one producer
///
/// Cheap to clone; the rule set is shared.
#[derive(Clone)]
pub struct ProducerGate {
    shared: Arc<SharedTuning>,
    error_sample_rate: f64,
    rules: Arc<[CompiledRule]>,
}

impl ProducerGate {
    /// Build a gate from validated config and the live tuning handle
    pub fn new(config: &StabilityConfig, shared: Arc<SharedTuning>) -> Result<Self, ConfigError> {
        let rules = config
            .context_sampling_rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    regex: rule.compile()?,
                    rule: rule.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self {
            shared,
            error_sample_rate: clamp_unit(config.error_sample_rate),
            rules: rules.into(),
        })
    }

    /// Effective sample rate for a unit
    pub fn effective_rate(&self, is_error: bool, name: &str, module: &str) -> f64 {
        if is_error {
            return self.error_sample_rate;
        }

        let matched = self
            .rules
            .iter()
            .find(|compiled| compiled.regex.is_match(name) || compiled.regex.is_match(module));

        match matched {
            Some(compiled) => match compiled.rule.strategy {
                SamplingStrategy::Always => 1.0,
                SamplingStrategy::Never => 0.0,
                // Decided before the outcome is known, so only errors pass
                SamplingStrategy::OnError => 0.0,
                SamplingStrategy::Random => compiled
                    .rule
                    .sample_rate
                    .map(clamp_unit)
                    .unwrap_or_else(|| self.shared.sample_rate()),
            },
            None => self.shared.sample_rate(),
        }
    }

    /// Decide at the start of a unit whether to time it
    #[inline]
    pub fn should_start(&self, name: &str, module: &str) -> bool {
        admit(self.effective_rate(false, name, module))
    }

    /// Decide at the end of a unit whether to keep its record
    ///
    /// Failed units are re-drawn against `error_sample_rate` so errors can be
    /// kept even when the happy path was sampled out.
    #[inline]
    pub fn should_record(&self, is_error: bool, started_sampled: bool) -> bool {
        if is_error {
            admit(self.error_sample_rate)
        } else {
            started_sampled
        }
    }
}

impl std::fmt::Debug for ProducerGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerGate")
            .field("error_sample_rate", &self.error_sample_rate)
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[inline]
fn admit(rate: f64) -> bool {
    if rate >= 1.0 {
        return true;
    }
    if rate <= 0.0 {
        return false;
    }
    random_unit() < rate
}

/// Uniform draw in [0, 1) from a thread-local xorshift
#[inline]
fn random_unit() -> f64 {
    thread_local! {
        static STATE: Cell<u64> = Cell::new(seed());
    }

    STATE.with(|state| {
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        (x >> 11) as f64 / (1u64 << 53) as f64
    })
}

fn seed() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1);
    // xorshift must never start at zero
    (nanos ^ crate::core::shard_manager::ShardManager::current_producer_key()) | 1
}
