/*!
 * Score History
 * Storage interface for past score reports and an in-memory implementation
 */

use crate::core::errors::Result;
use crate::scoring::ScoreReport;
use crate::trace::now_secs;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One stored report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Seconds since UNIX epoch
    pub timestamp: f64,
    pub report: ScoreReport,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl HistoryEntry {
    #[inline]
    pub fn pss(&self) -> u8 {
        self.report.pss
    }
}

/// Report history backend
pub trait HistoryStore: Send + Sync {
    /// Append a report
    fn save(&self, report: &ScoreReport, meta: BTreeMap<String, String>) -> Result<()>;

    /// Up to `limit` entries, newest first, optionally limited to the last
    /// `days` days
    fn get_history(&self, limit: usize, days: Option<u32>) -> Result<Vec<HistoryEntry>>;
}

/// Bounded in-memory history; the oldest entry is dropped when full
pub struct MemoryHistory {
    entries: Mutex<HeapRb<HistoryEntry>>,
}

impl MemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HeapRb::new(capacity.max(1))),
        }
    }

    /// Append with an explicit timestamp
    pub fn save_at(&self, timestamp: f64, report: &ScoreReport, meta: BTreeMap<String, String>) {
        self.entries.lock().push_overwrite(HistoryEntry {
            timestamp,
            report: *report,
            meta,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn history_since(&self, limit: usize, cutoff: Option<f64>) -> Vec<HistoryEntry> {
        let entries = self.entries.lock();
        let mut out: Vec<HistoryEntry> = entries
            .iter()
            .filter(|entry| cutoff.map_or(true, |cutoff| entry.timestamp >= cutoff))
            .cloned()
            .collect();
        drop(entries);

        out.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
        out.truncate(limit);
        out
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl HistoryStore for MemoryHistory {
    fn save(&self, report: &ScoreReport, meta: BTreeMap<String, String>) -> Result<()> {
        self.save_at(now_secs(), report, meta);
        Ok(())
    }

    fn get_history(&self, limit: usize, days: Option<u32>) -> Result<Vec<HistoryEntry>> {
        let cutoff = days.map(|days| now_secs() - f64::from(days) * SECONDS_PER_DAY);
        Ok(self.history_since(limit, cutoff))
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("len", &self.len())
            .finish()
    }
}
