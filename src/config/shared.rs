/*!
 * Shared Tuning State
 * Live values written by the control loops and read by producers and scoring
 */

use crate::core::sync::AtomicF64;
use std::fmt;

/// Runtime-tuned values
///
/// Each value has exactly one writer: the adaptive sampler owns
/// `sample_rate` and the runtime tuner owns `concurrency_wait_threshold`.
/// Readers never block.
pub struct SharedTuning {
    sample_rate: AtomicF64,
    concurrency_wait_threshold: AtomicF64,
}

impl SharedTuning {
    pub fn new(sample_rate: f64, concurrency_wait_threshold: f64) -> Self {
        Self {
            sample_rate: AtomicF64::new(sample_rate),
            concurrency_wait_threshold: AtomicF64::new(concurrency_wait_threshold),
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate.load()
    }

    #[inline]
    pub fn set_sample_rate(&self, rate: f64) {
        self.sample_rate.store(rate);
    }

    #[inline]
    pub fn concurrency_wait_threshold(&self) -> f64 {
        self.concurrency_wait_threshold.load()
    }

    #[inline]
    pub fn set_concurrency_wait_threshold(&self, threshold: f64) {
        self.concurrency_wait_threshold.store(threshold);
    }
}

impl Default for SharedTuning {
    fn default() -> Self {
        Self::new(
            crate::core::limits::DEFAULT_SAMPLE_RATE,
            crate::core::limits::DEFAULT_CONCURRENCY_WAIT_THRESHOLD,
        )
    }
}

impl fmt::Debug for SharedTuning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTuning")
            .field("sample_rate", &self.sample_rate())
            .field("concurrency_wait_threshold", &self.concurrency_wait_threshold())
            .finish()
    }
}
