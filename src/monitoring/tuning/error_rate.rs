/*!
 * Error-Rate Observer
 * Feeds the adaptive sampler from a rolling window of outcomes
 *
 * Unit records append their error flag to the window. System records update
 * the latest lag and churn readings, which persist until the next sample.
 */

use super::window::RollingWindow;
use crate::config::ObserverConfig;
use crate::core::errors::Result;
use crate::core::sync::AtomicF64;
use crate::monitoring::collection::{Collector, ObserverId};
use crate::monitoring::sampler::{AdaptiveSampler, LoadMetrics};
use crate::monitoring::task::ControlLoop;
use crate::trace::TraceRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// State written by the collector observer
struct Observed {
    errors: RollingWindow<bool>,
    traces: AtomicU64,
    lag: AtomicF64,
    churn_rate: AtomicF64,
}

impl Observed {
    fn record(&self, record: &TraceRecord) {
        match record.system_metrics() {
            Some(metrics) => {
                if let Some(lag) = metrics.lag {
                    self.lag.store(lag);
                }
                if let Some(churn) = metrics.churn_rate {
                    self.churn_rate.store(churn);
                }
            }
            None => {
                self.errors.push(record.error);
                self.traces.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Periodic error-rate monitor
pub struct ErrorRateObserver {
    config: ObserverConfig,
    sampler: Arc<AdaptiveSampler>,
    collector: Arc<Collector>,
    observed: Arc<Observed>,
    last_cycle: Mutex<Instant>,
    observer: Mutex<Option<ObserverId>>,
}

impl ErrorRateObserver {
    /// Create an observer and start watching `collector`
    pub fn new(
        config: ObserverConfig,
        collector: Arc<Collector>,
        sampler: Arc<AdaptiveSampler>,
    ) -> Self {
        let observed = Arc::new(Observed {
            errors: RollingWindow::new(config.window_size),
            traces: AtomicU64::new(0),
            lag: AtomicF64::new(0.0),
            churn_rate: AtomicF64::new(0.0),
        });
        let sink = Arc::clone(&observed);
        let observer = collector.register_observer(move |record| sink.record(record));

        Self {
            config,
            sampler,
            collector,
            observed,
            last_cycle: Mutex::new(Instant::now()),
            observer: Mutex::new(Some(observer)),
        }
    }

    /// Fraction of failed units in the window, 0 when empty
    pub fn error_rate(&self) -> f64 {
        let outcomes = self.observed.errors.values();
        if outcomes.is_empty() {
            return 0.0;
        }
        let failed = outcomes.iter().filter(|&&failed| failed).count();
        failed as f64 / outcomes.len() as f64
    }

    /// Push current metrics to the sampler and reset the trace counter
    pub fn observe_once(&self) -> LoadMetrics {
        let window = {
            let mut last = self.last_cycle.lock();
            let now = Instant::now();
            let elapsed = now.saturating_duration_since(*last);
            *last = now;
            elapsed
        };

        let metrics = LoadMetrics {
            lag: self.observed.lag.load(),
            churn_rate: self.observed.churn_rate.load(),
            error_rate: self.error_rate(),
            trace_count: self.observed.traces.swap(0, Ordering::Relaxed),
            window,
        };

        let rate = self.sampler.update_metrics(metrics);
        debug!(
            error_rate = metrics.error_rate,
            trace_count = metrics.trace_count,
            sample_rate = rate,
            "Observed error rate"
        );
        metrics
    }

    /// Stop observing the collector; idempotent
    pub fn detach(&self) {
        if let Some(id) = self.observer.lock().take() {
            self.collector.unregister_observer(id);
        }
    }
}

impl ControlLoop for ErrorRateObserver {
    fn name(&self) -> &'static str {
        "error_rate_observer"
    }

    fn interval(&self) -> Duration {
        self.config.interval
    }

    fn run_cycle(&self) -> Result<()> {
        self.observe_once();
        Ok(())
    }

    fn on_shutdown(&self) {
        self.detach();
    }
}

impl Drop for ErrorRateObserver {
    fn drop(&mut self) {
        self.detach();
    }
}
