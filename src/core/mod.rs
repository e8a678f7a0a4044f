/*!
 * Core Module
 * Error types, limits, statistics and synchronization primitives
 */

pub mod errors;
pub mod limits;
pub mod serde;
pub mod shard_manager;
pub mod stats;
pub mod sync;

// Re-export for convenience
pub use errors::*;
pub use shard_manager::ShardManager;
pub use sync::{AtomicF64, RcuCell};
