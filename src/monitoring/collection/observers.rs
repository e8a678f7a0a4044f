/*!
 * Collector Observers
 * Synchronous per-record callbacks held in an RCU list
 *
 * `notify` only loads an `Arc` of the current list, so `add` never takes an
 * observer lock. Register and unregister copy the list.
 */

use crate::core::sync::RcuCell;
use crate::trace::TraceRecord;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked once per added record
pub type Observer = Arc<dyn Fn(&TraceRecord) + Send + Sync>;

/// Handle returned by registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(u64);

impl ObserverId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

thread_local! {
    static NOTIFYING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks one registry as notifying on the current thread
///
/// Keyed by registry address, so an observer on one collector may add to
/// another.
struct NotifyScope {
    key: usize,
}

impl NotifyScope {
    /// `None` when this registry is already notifying (re-entrant add)
    fn enter(registry: &ObserverRegistry) -> Option<Self> {
        let key = registry as *const ObserverRegistry as usize;
        NOTIFYING.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&key) {
                None
            } else {
                active.push(key);
                Some(NotifyScope { key })
            }
        })
    }
}

impl Drop for NotifyScope {
    fn drop(&mut self) {
        NOTIFYING.with(|active| active.borrow_mut().retain(|key| *key != self.key));
    }
}

/// Observer list
pub(crate) struct ObserverRegistry {
    entries: RcuCell<Vec<(ObserverId, Observer)>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: RcuCell::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn register(&self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.update(|current| {
            let mut next = current.clone();
            next.push((id, Arc::clone(&observer)));
            next
        });
        id
    }

    pub(crate) fn unregister(&self, id: ObserverId) -> bool {
        let mut removed = false;
        self.entries.update(|current| {
            removed = current.iter().any(|(existing, _)| *existing == id);
            current
                .iter()
                .filter(|(existing, _)| *existing != id)
                .cloned()
                .collect()
        });
        removed
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.read(Vec::len)
    }

    /// Run every observer against `record` on the calling thread
    ///
    /// A callback that adds to the same collector trips a debug assertion;
    /// release builds skip the nested notification. Adding to a different
    /// collector notifies that collector's observers as usual.
    #[inline]
    pub(crate) fn notify(&self, record: &TraceRecord) {
        let entries = self.entries.load();
        if entries.is_empty() {
            return;
        }

        let Some(_scope) = NotifyScope::enter(self) else {
            debug_assert!(false, "collector observer re-entered Collector::add");
            return;
        };

        for (_, observer) in entries.iter() {
            observer(record);
        }
    }
}
