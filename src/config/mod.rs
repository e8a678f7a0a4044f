/*!
 * Configuration
 *
 * Static configuration loaded once at startup (TOML + environment), the
 * live tuned values shared between control loops and readers, and the
 * producer-side sampling gate.
 */

mod gate;
mod loader;
mod sections;
mod shared;

pub use gate::{ProducerGate, SamplingRule, SamplingStrategy};
pub use loader::{CONFIG_FILE, PYPROJECT_FILE};
pub use sections::{
    AdvisorConfig, AlertConfig, CollectorConfig, ObserverConfig, PillarWeights, SamplerConfig,
    ScoringConfig, StabilityConfig, TunerConfig,
};
pub use shared::SharedTuning;
