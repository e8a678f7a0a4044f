/*!
 * Runtime Tuner
 * Recalibrates the concurrency wait threshold from recent wait times
 *
 * threshold = multiplier x p95(wait_time) over a rolling window, written to
 * the shared tuning state and persisted as a JSON baseline.
 */

use super::baseline::RuntimeBaseline;
use super::window::RollingWindow;
use crate::config::{SharedTuning, TunerConfig};
use crate::core::errors::{Result, TuningError};
use crate::core::limits::TUNER_CHANGE_EPSILON;
use crate::core::stats::{percentile_linear, sorted};
use crate::monitoring::collection::{Collector, ObserverId};
use crate::monitoring::task::ControlLoop;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Percentile of the wait-time window the threshold is derived from
const WAIT_PERCENTILE: f64 = 0.95;

/// Periodic wait-threshold tuner
///
/// Sole writer of the shared concurrency wait threshold.
pub struct RuntimeTuner {
    config: TunerConfig,
    shared: Arc<SharedTuning>,
    collector: Arc<Collector>,
    window: Arc<RollingWindow<f64>>,
    observer: Mutex<Option<ObserverId>>,
}

impl RuntimeTuner {
    /// Create a tuner and start observing `collector`
    ///
    /// A readable baseline file seeds the shared threshold.
    pub fn new(config: TunerConfig, collector: Arc<Collector>, shared: Arc<SharedTuning>) -> Self {
        if let Some(path) = &config.baseline_path {
            match RuntimeBaseline::load(path) {
                Ok(Some(baseline)) => {
                    info!(
                        path = %path.display(),
                        threshold = baseline.concurrency_wait_threshold,
                        "Loaded runtime baseline"
                    );
                    shared.set_concurrency_wait_threshold(baseline.concurrency_wait_threshold);
                }
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring runtime baseline"),
            }
        }

        let window = Arc::new(RollingWindow::new(config.window_size));
        let sink = Arc::clone(&window);
        let observer = collector.register_observer(move |record| {
            if !record.system_metric {
                sink.push(record.wait_time);
            }
        });

        Self {
            config,
            shared,
            collector,
            window,
            observer: Mutex::new(Some(observer)),
        }
    }

    /// Run one tuning cycle
    ///
    /// Returns the new threshold when it moved, `None` when the window is
    /// too small or the change is below epsilon.
    pub fn tune_once(&self) -> Result<Option<f64>> {
        let samples = self.window.values();
        if samples.len() < self.config.min_samples {
            debug!(
                "{}",
                TuningError::InsufficientData {
                    have: samples.len(),
                    need: self.config.min_samples,
                }
            );
            return Ok(None);
        }

        let p95 = percentile_linear(&sorted(&samples), WAIT_PERCENTILE);
        let threshold = p95 * self.config.multiplier;
        if !threshold.is_finite() {
            return Err(TuningError::NonFinite(format!("wait threshold {}", threshold)).into());
        }

        let current = self.shared.concurrency_wait_threshold();
        if (current - threshold).abs() <= TUNER_CHANGE_EPSILON {
            debug!(current, candidate = threshold, "Wait threshold unchanged");
            return Ok(None);
        }

        info!(from = current, to = threshold, p95, "Adjusting concurrency wait threshold");
        self.shared.set_concurrency_wait_threshold(threshold);

        if let Some(path) = &self.config.baseline_path {
            if let Err(e) = RuntimeBaseline::new(threshold).save(path) {
                warn!(path = %path.display(), error = %e, "Failed to persist runtime baseline");
            }
        }

        Ok(Some(threshold))
    }

    /// Samples currently in the window
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Stop observing the collector; idempotent
    pub fn detach(&self) {
        if let Some(id) = self.observer.lock().take() {
            self.collector.unregister_observer(id);
        }
    }
}

impl ControlLoop for RuntimeTuner {
    fn name(&self) -> &'static str {
        "runtime_tuner"
    }

    fn interval(&self) -> Duration {
        self.config.interval
    }

    fn run_cycle(&self) -> Result<()> {
        self.tune_once().map(|_| ())
    }

    fn on_shutdown(&self) {
        self.detach();
    }
}

impl Drop for RuntimeTuner {
    fn drop(&mut self) {
        self.detach();
    }
}
