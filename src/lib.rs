/*!
 * Stability Kernel Library
 * Runtime stability scoring for instrumented applications
 *
 * Producers emit [`TraceRecord`]s into a bounded, sharded [`Collector`].
 * The scoring engine turns a snapshot into a 0..=100 stability score with a
 * five-pillar breakdown, while two control loops keep the sample rate and
 * the concurrency wait threshold tuned to current load.
 */

pub mod alerts;
pub mod config;
pub mod core;
pub mod monitoring;
pub mod runtime;
pub mod scoring;
pub mod trace;

// Re-exports
pub use crate::core::errors::{ConfigError, Result, StabilityError, TuningError};
pub use alerts::{Alert, AlertEngine, AlertSeverity, HistoryStore, MemoryHistory};
pub use config::{ProducerGate, SharedTuning, StabilityConfig};
pub use monitoring::{init_tracing, AdaptiveSampler, Collector, SamplerMode};
pub use runtime::{StabilityRuntime, StabilityRuntimeBuilder};
pub use scoring::{compute, compute_by_module, Advisor, ScoreReport, ScoringEngine};
pub use trace::{TraceBuilder, TraceRecord};
