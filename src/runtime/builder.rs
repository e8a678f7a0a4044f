/*!
 * Stability Runtime Builder
 * Builder pattern for StabilityRuntime construction
 */

use super::StabilityRuntime;
use crate::alerts::{AlertEngine, HistoryStore, MemoryHistory};
use crate::config::{ProducerGate, SharedTuning, StabilityConfig};
use crate::core::errors::Result;
use crate::monitoring::{AdaptiveSampler, Collector, ErrorRateObserver, RuntimeTuner};
use crate::scoring::ScoringEngine;
use log::info;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Builder for StabilityRuntime
pub struct StabilityRuntimeBuilder {
    config: StabilityConfig,
    collector: Option<Arc<Collector>>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl StabilityRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: StabilityConfig::default(),
            collector: None,
            history: None,
        }
    }

    /// Use `config` instead of the defaults
    pub fn with_config(mut self, config: StabilityConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing collector instead of creating one
    pub fn with_collector(mut self, collector: Arc<Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Report history backend (in-memory by default)
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Validate the config and wire every component
    ///
    /// Control loops are not started; call
    /// [`StabilityRuntime::start`](super::StabilityRuntime::start).
    pub fn build(self) -> Result<StabilityRuntime> {
        let config = self.config.validate()?;

        let shared = Arc::new(SharedTuning::new(
            config.sample_rate,
            config.scoring.concurrency_wait_threshold,
        ));
        let collector = self
            .collector
            .unwrap_or_else(|| Arc::new(Collector::with_config(&config.collector)));
        let sampler = Arc::new(AdaptiveSampler::new(
            config.sampler.clone(),
            Arc::clone(&shared),
        ));
        let tuner = Arc::new(RuntimeTuner::new(
            config.tuner.clone(),
            Arc::clone(&collector),
            Arc::clone(&shared),
        ));
        let observer = Arc::new(ErrorRateObserver::new(
            config.error_observer.clone(),
            Arc::clone(&collector),
            Arc::clone(&sampler),
        ));

        let gate = ProducerGate::new(&config, Arc::clone(&shared))?;
        let scoring = ScoringEngine::new(config.scoring.clone(), Arc::clone(&shared));
        let alerts = AlertEngine::from_config(&config.alerts)?;
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(MemoryHistory::default()));

        info!(
            "Stability runtime built: capacity {}, {} shards, sampler mode {}",
            collector.capacity(),
            collector.shard_count(),
            sampler.mode()
        );

        Ok(StabilityRuntime {
            config,
            shared,
            collector,
            sampler,
            tuner,
            observer,
            gate,
            scoring,
            alerts,
            history,
            tasks: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        })
    }
}

impl Default for StabilityRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
