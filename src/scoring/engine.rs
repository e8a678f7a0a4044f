/*!
 * Scoring Engine
 * Pure computation of a score report from a batch of trace records
 *
 * Unit records feed the duration, memory, wait, error and branch-tag
 * sequences. System records only contribute lag samples (active tasks and
 * churn are gathered but not scored).
 */

use super::pillars;
use super::report::{Breakdown, ScoreReport};
use crate::config::{PillarWeights, ScoringConfig, SharedTuning};
use crate::core::stats::{clamp_unit, non_negative};
use crate::trace::TraceRecord;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sequences extracted from one batch of records
#[derive(Debug, Default)]
pub(crate) struct Samples<'a> {
    pub durations: Vec<f64>,
    pub memory: Vec<f64>,
    pub waits: Vec<f64>,
    pub errors: Vec<bool>,
    pub tags: BTreeMap<&'a str, usize>,
    pub lags: Vec<f64>,
    pub active_tasks: Vec<f64>,
    pub churn_rates: Vec<f64>,
}

impl<'a> Samples<'a> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            durations: Vec::with_capacity(capacity),
            memory: Vec::with_capacity(capacity),
            waits: Vec::with_capacity(capacity),
            errors: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, record: &'a TraceRecord) {
        if let Some(system) = record.system_metrics() {
            self.push_system(system.lag, system.active_tasks, system.churn_rate);
            return;
        }

        self.durations.push(non_negative(record.duration));
        self.memory.push(record.memory as f64);
        self.waits.push(non_negative(record.wait_time));
        self.errors.push(record.error);
        if let Some(tag) = record.branch_tag.as_deref() {
            *self.tags.entry(tag).or_insert(0) += 1;
        }
    }

    fn push_system(&mut self, lag: Option<f64>, active: Option<f64>, churn: Option<f64>) {
        self.lags.extend(lag.map(non_negative));
        self.active_tasks.extend(active.map(non_negative));
        self.churn_rates.extend(churn.map(non_negative));
    }

    /// Number of unit records
    #[inline]
    pub(crate) fn units(&self) -> usize {
        self.durations.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.units() == 0 && self.lags.is_empty()
    }
}

/// Score a batch of records
///
/// Pure and reentrant. An input with no unit records and no lag samples
/// scores 0 with an all-zero breakdown. Negative or non-finite durations,
/// waits and lags count as 0, and `config` is normalized before use.
pub fn compute<R: AsRef<TraceRecord>>(records: &[R], config: &ScoringConfig) -> ScoreReport {
    let mut samples = Samples::with_capacity(records.len());
    for record in records {
        samples.push(record.as_ref());
    }
    score_samples(&samples, config)
}

pub(crate) fn score_samples(samples: &Samples<'_>, config: &ScoringConfig) -> ScoreReport {
    if samples.is_empty() {
        return ScoreReport::zero();
    }
    let config = &config.clone().normalized();

    let breakdown = Breakdown {
        timing_stability: clamp_unit(pillars::timing_stability(&samples.durations, config)),
        memory_stability: clamp_unit(pillars::memory_stability(&samples.memory, config)),
        error_volatility: clamp_unit(pillars::error_volatility(&samples.errors, config)),
        branching_entropy: clamp_unit(pillars::branching_entropy(
            samples.tags.values().copied().collect::<Vec<_>>(),
        )),
        concurrency_chaos: clamp_unit(pillars::concurrency_chaos(
            &samples.waits,
            &samples.lags,
            config,
        )),
    };

    ScoreReport {
        pss: combine(&breakdown, &config.weights),
        breakdown,
    }
}

/// Weighted mean of the pillars scaled to 0..=100
fn combine(breakdown: &Breakdown, weights: &PillarWeights) -> u8 {
    let weights = [
        weights.timing_stability,
        weights.memory_stability,
        weights.error_volatility,
        weights.branching_entropy,
        weights.concurrency_chaos,
    ]
    .map(|w| w.max(0.0));

    let raw: f64 = breakdown
        .iter()
        .zip(weights)
        .map(|((_, score), weight)| score * weight)
        .sum();
    let total: f64 = weights.iter().sum();
    let normalized = if total > 0.0 { raw / total } else { raw };

    (clamp_unit(normalized) * 100.0).round() as u8
}

/// Scoring front end bound to the live tuning state
///
/// Each call copies the static config, substitutes the current concurrency
/// wait threshold, and runs the pure computation.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    shared: Arc<SharedTuning>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, shared: Arc<SharedTuning>) -> Self {
        Self {
            config: config.normalized(),
            shared,
        }
    }

    /// Config with the live threshold applied
    pub fn effective_config(&self) -> ScoringConfig {
        let mut config = self.config.clone();
        let live = self.shared.concurrency_wait_threshold();
        if live.is_finite() && live >= 0.0 {
            config.concurrency_wait_threshold = live;
        }
        config
    }

    pub fn compute<R: AsRef<TraceRecord>>(&self, records: &[R]) -> ScoreReport {
        compute(records, &self.effective_config())
    }

    /// One report per module
    pub fn compute_by_module<R: AsRef<TraceRecord>>(
        &self,
        records: &[R],
    ) -> BTreeMap<String, ScoreReport> {
        super::modules::compute_by_module(records, &self.effective_config())
    }
}
