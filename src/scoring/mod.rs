/*!
 * Scoring
 * Pure stability scoring over batches of trace records
 *
 * Five pillar scores in [0, 1] are combined into a weighted 0..=100 PSS.
 * The same input and config always produce the same report.
 */

mod advisor;
mod engine;
mod modules;
mod pillars;
mod report;

pub use advisor::{Advice, Advisor, Tier};
pub use engine::{compute, ScoringEngine};
pub use modules::compute_by_module;
pub use pillars::{
    branching_entropy, concurrency_chaos, error_volatility, memory_stability, timing_stability,
};
pub use report::{Breakdown, Pillar, ScoreReport};
