/*!
 * Trace Collection
 * Sharded record intake with synchronous observers
 */

mod collector;
mod observers;

pub use collector::{Collector, CollectorStats};
pub use observers::{Observer, ObserverId};
