/*!
 * Stability Monitoring
 * Trace intake, adaptive sampling and the runtime control loops
 */

pub mod collection;
mod sampler;
mod task;
mod tracer;
pub mod tuning;

pub use collection::{Collector, CollectorStats, Observer, ObserverId};
pub use sampler::{AdaptiveSampler, LoadMetrics, SamplerMode};
pub use task::{ControlCommand, ControlLoop, ControlTask};
pub use tracer::{init_tracing, span_cycle, CycleSpan};
pub use tuning::{ErrorRateObserver, RollingWindow, RuntimeBaseline, RuntimeTuner};
