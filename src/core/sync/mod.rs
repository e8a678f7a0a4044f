/*!
 * Synchronization Primitives
 *
 * Read-mostly shared state for the collector and the control loops:
 * - RCU cell for the observer list (lock-free reads on every `add`)
 * - Atomic f64 for tuned values (single writer, non-blocking readers)
 */

mod atomic_f64;
pub mod lockfree;

pub use atomic_f64::AtomicF64;
pub use lockfree::RcuCell;
