/*!
 * Rolling Window
 * Bounded FIFO of recent samples fed by collector observers
 */

use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};

/// Fixed-capacity window; the oldest sample is dropped when full
pub struct RollingWindow<T> {
    samples: Mutex<HeapRb<T>>,
    capacity: usize,
}

impl<T: Copy> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    #[inline]
    pub fn push(&self, sample: T) {
        self.samples.lock().push_overwrite(sample);
    }

    /// Copy of the current samples, oldest first
    pub fn values(&self) -> Vec<T> {
        self.samples.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}
