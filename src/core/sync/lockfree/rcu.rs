/*!
 * Read-Copy-Update (RCU) Pattern
 * Zero-contention reads for read-heavy data structures
 */

use arc_swap::ArcSwap;
use std::sync::Arc;

/// RCU-protected value with zero-contention reads
///
/// # Performance
///
/// - **Reads**: atomic pointer load, no lock
/// - **Writes**: clone-modify-swap
/// - **Best for**: data read on every hot-path call and written rarely,
///   such as the collector's observer list
pub struct RcuCell<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> RcuCell<T> {
    /// Create new RCU cell
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(value)),
        }
    }

    /// Load current value (zero-contention)
    #[inline(always)]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Borrow the current value for the duration of `f` without cloning the Arc
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.load();
        f(&guard)
    }

    /// Update value using a function
    ///
    /// The function receives the current value and returns its replacement.
    /// It may be called more than once under write contention.
    #[inline]
    pub fn update<F>(&self, mut f: F)
    where
        F: FnMut(&T) -> T,
    {
        self.inner.rcu(|old| f(old));
    }

    /// Replace value entirely
    #[inline]
    pub fn store(&self, new_value: T) {
        self.inner.store(Arc::new(new_value));
    }
}

impl<T> Clone for RcuCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for RcuCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
