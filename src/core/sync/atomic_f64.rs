/*!
 * Atomic f64
 * Lock-free float cell stored as raw bits in an AtomicU64
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic f64 for single-writer, many-reader tuned values
///
/// # Performance
/// All operations use relaxed ordering. Readers may observe a value one
/// control cycle stale; nothing orders other memory against these values.
#[repr(C, align(64))]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    #[inline]
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    #[inline(always)]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline(always)]
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Store and return the previous value
    #[inline]
    pub fn swap(&self, value: f64) -> f64 {
        f64::from_bits(self.bits.swap(value.to_bits(), Ordering::Relaxed))
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl std::fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicF64").field(&self.load()).finish()
    }
}
