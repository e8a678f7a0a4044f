/*!
 * Stability Runtime
 * Owns the collector, the feedback loops and the scoring front end
 *
 * Producers talk to the runtime through [`ProducerGate`] and
 * [`Collector::add`]. The tuner and error-rate observer run as background
 * control tasks between [`start`](StabilityRuntime::start) and
 * [`shutdown`](StabilityRuntime::shutdown).
 */

mod builder;

pub use builder::StabilityRuntimeBuilder;

use crate::alerts::{Alert, AlertEngine, HistoryStore};
use crate::config::{ProducerGate, SharedTuning, StabilityConfig};
use crate::core::errors::Result;
use crate::monitoring::{
    AdaptiveSampler, Collector, ControlTask, ErrorRateObserver, RuntimeTuner,
};
use crate::scoring::{Advice, Advisor, ScoreReport, ScoringEngine};
use crate::trace::TraceRecord;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct StabilityRuntime {
    config: StabilityConfig,
    shared: Arc<SharedTuning>,
    collector: Arc<Collector>,
    sampler: Arc<AdaptiveSampler>,
    tuner: Arc<RuntimeTuner>,
    observer: Arc<ErrorRateObserver>,
    gate: ProducerGate,
    scoring: ScoringEngine,
    alerts: AlertEngine,
    history: Arc<dyn HistoryStore>,
    tasks: Mutex<Vec<ControlTask>>,
    stopped: AtomicBool,
}

impl StabilityRuntime {
    pub fn builder() -> StabilityRuntimeBuilder {
        StabilityRuntimeBuilder::new()
    }

    /// Spawn the tuner and observer loops on the current tokio runtime
    ///
    /// Calling `start` on a running or stopped runtime does nothing.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return;
        }
        if self.stopped.load(Ordering::Acquire) {
            warn!("Stability runtime already shut down; not restarting");
            return;
        }
        tasks.push(ControlTask::spawn(Arc::clone(&self.tuner)));
        tasks.push(ControlTask::spawn(Arc::clone(&self.observer)));
        info!(tasks = tasks.len(), "Stability runtime started");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Stop the control loops and wait for them to exit
    ///
    /// The loops detach from the collector on the way out, so a stopped
    /// runtime stays stopped; build a new one to resume tuning.
    pub async fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.shutdown().await;
        }
        info!("Stability runtime stopped");
    }

    /// Admit a finished record
    pub fn record(&self, record: impl Into<Arc<TraceRecord>>) {
        self.collector.add(record);
    }

    /// Score the current buffer with the live wait threshold
    pub fn report(&self) -> ScoreReport {
        self.scoring.compute(&self.collector.snapshot())
    }

    pub fn report_by_module(&self) -> BTreeMap<String, ScoreReport> {
        self.scoring.compute_by_module(&self.collector.snapshot())
    }

    pub fn advise(&self) -> Advice {
        Advisor::analyze(&self.report(), &self.config.advisor)
    }

    /// Score the buffer, evaluate alert rules against history, then store
    /// the report
    pub fn evaluate_alerts(&self) -> Result<Vec<Alert>> {
        let snapshot = self.collector.snapshot();
        let report = self.scoring.compute(&snapshot);
        let modules = self.scoring.compute_by_module(&snapshot);

        let history = self
            .history
            .get_history(self.config.alerts.regression_history_limit, None)?;
        let fired = self.alerts.run(&report, &history, &modules);

        self.history.save(&report, BTreeMap::new())?;
        Ok(fired)
    }

    /// Producer-side sampling gate bound to the live rate
    pub fn gate(&self) -> ProducerGate {
        self.gate.clone()
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    pub fn sampler(&self) -> &Arc<AdaptiveSampler> {
        &self.sampler
    }

    pub fn tuner(&self) -> &Arc<RuntimeTuner> {
        &self.tuner
    }

    pub fn error_observer(&self) -> &Arc<ErrorRateObserver> {
        &self.observer
    }

    pub fn shared(&self) -> &Arc<SharedTuning> {
        &self.shared
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }
}

impl std::fmt::Debug for StabilityRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityRuntime")
            .field("collector", &self.collector)
            .field("shared", &self.shared)
            .field("running", &self.is_running())
            .finish()
    }
}
