/*!
 * Stability Pillars
 * One scoring function per instability dimension
 *
 * Every function maps its samples onto [0, 1] where 1 is perfectly stable,
 * and returns 1 when there is not enough data to judge.
 */

use crate::config::ScoringConfig;
use crate::core::stats::{
    coefficient_of_variation, exponential_decay, mean, median_sorted, quantile_exclusive,
    shannon_entropy, sorted, stddev, variance,
};

/// Number of quantile intervals used for the latency tail
const QUANTILE_INTERVALS: usize = 100;
/// Cut point of the median among the 99 percentile cut points
const MEDIAN_CUT: usize = 50;

/// Timing stability from duration dispersion and tail heaviness
///
/// `exp(-alpha * CV) / (1 + beta * max(0, p_tail / p50 - 1))`
pub fn timing_stability(durations: &[f64], config: &ScoringConfig) -> f64 {
    if durations.len() < 2 {
        return 1.0;
    }

    let cv = coefficient_of_variation(durations);

    let ordered = sorted(durations);
    let p50 = quantile_exclusive(&ordered, MEDIAN_CUT, QUANTILE_INTERVALS);
    let tail = quantile_exclusive(
        &ordered,
        config.latency_tail_percentile.saturating_add(1),
        QUANTILE_INTERVALS,
    );
    let tail_ratio = if p50 > 0.0 { tail / p50 } else { 1.0 };

    let dispersion = exponential_decay(cv, config.alpha);
    let heaviness = 1.0 / (1.0 + config.beta * (tail_ratio - 1.0).max(0.0));
    dispersion * heaviness
}

/// Memory stability from spread and peak relative to the median
///
/// A peak above `mem_spike_threshold_ratio` x median adds an extra
/// exponential penalty.
pub fn memory_stability(samples: &[f64], config: &ScoringConfig) -> f64 {
    if samples.len() < 2 {
        return 1.0;
    }

    let ordered = sorted(samples);
    let peak = ordered.last().copied().unwrap_or(0.0);
    let median = median_sorted(&ordered) + config.memory_epsilon;

    if median <= config.memory_epsilon {
        return if peak == 0.0 { 1.0 } else { 0.0 };
    }

    let peak_ratio = peak / median;
    let metric = stddev(samples) / median + (peak_ratio - 1.0);
    let mut score = exponential_decay(metric, config.gamma);

    if peak_ratio > config.mem_spike_threshold_ratio {
        score *= exponential_decay(peak_ratio - config.mem_spike_threshold_ratio, config.gamma);
    }
    score
}

/// Error volatility from the error rate, its burstiness and error runs
///
/// Penalties compose multiplicatively: the base decay over mean and
/// variance-to-mean ratio, a linear spike penalty above
/// `error_spike_threshold`, and an exponential penalty for the longest run
/// of consecutive errors.
pub fn error_volatility(errors: &[bool], config: &ScoringConfig) -> f64 {
    if errors.is_empty() {
        return 1.0;
    }

    let flags: Vec<f64> = errors.iter().map(|&e| if e { 1.0 } else { 0.0 }).collect();
    let rate = mean(&flags);

    let vmr = if flags.len() > 1 && rate > 0.0 {
        variance(&flags) / rate
    } else {
        0.0
    };

    let mut score = exponential_decay(rate + config.error_vmr_multiplier * vmr, config.delta);

    if rate > config.error_spike_threshold && config.error_spike_threshold < 1.0 {
        let impact = (rate - config.error_spike_threshold) / (1.0 - config.error_spike_threshold);
        score *= (1.0 - impact * config.error_spike_impact_multiplier).max(0.0);
    }

    let run = longest_run(errors);
    if run >= config.consecutive_error_threshold {
        let excess = (run - config.consecutive_error_threshold + 1) as f64;
        score *= exponential_decay(
            excess,
            config.delta * config.consecutive_error_decay_multiplier,
        );
    }
    score
}

/// Branching predictability: 1 - H / log2(distinct tags)
pub fn branching_entropy<I>(tag_counts: I) -> f64
where
    I: IntoIterator<Item = usize> + Clone,
{
    let distinct = tag_counts.clone().into_iter().filter(|&c| c > 0).count();
    if distinct <= 1 {
        return 1.0;
    }
    let max_entropy = (distinct as f64).log2();
    1.0 - shannon_entropy(tag_counts) / max_entropy
}

/// Concurrency chaos from wait-time dispersion and event-loop lag
///
/// Wait dispersion only counts once the mean wait exceeds the live
/// threshold. Mean lag above the floor scales the score down linearly.
pub fn concurrency_chaos(waits: &[f64], lags: &[f64], config: &ScoringConfig) -> f64 {
    let mut score = 1.0;

    if waits.len() >= 2 && mean(waits) > config.concurrency_wait_threshold {
        score = exponential_decay(coefficient_of_variation(waits), config.alpha);
    }

    if !lags.is_empty() {
        let mean_lag = mean(lags);
        if mean_lag > config.lag_penalty_floor {
            score *= 1.0 - (config.lag_penalty_scale * mean_lag).min(1.0);
        }
    }

    score.max(0.0)
}

/// Length of the longest run of `true`
fn longest_run(flags: &[bool]) -> usize {
    flags
        .iter()
        .fold((0usize, 0usize), |(current, best), &flag| {
            let current = if flag { current + 1 } else { 0 };
            (current, best.max(current))
        })
        .1
}
