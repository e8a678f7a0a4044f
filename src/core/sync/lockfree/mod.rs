/*!
 * Lock-Free Synchronization Primitives
 *
 * RCU (Read-Copy-Update) for zero-contention reads of rarely changed data
 */

mod rcu;

pub use rcu::RcuCell;
