/*!
 * Trace Builder
 * Producer-side helpers for finalizing exactly one record per unit of work
 */

use super::record::TraceRecord;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current wall-clock time as seconds since UNIX epoch
#[inline]
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Measures one unit of work; the timestamp is captured at start
pub struct WorkTimer {
    name: String,
    module: String,
    timestamp: f64,
    started: Instant,
}

impl WorkTimer {
    /// Start timing a unit of work
    pub fn start(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            timestamp: now_secs(),
            started: Instant::now(),
        }
    }

    /// Start timestamp (seconds since UNIX epoch)
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Stop the timer and hand over a builder with duration filled in
    pub fn finish(self) -> TraceBuilder {
        let duration = self.started.elapsed().as_secs_f64();
        TraceBuilder::new(self.name, self.module)
            .timestamp(self.timestamp)
            .duration(duration)
    }
}

/// Builder for [`TraceRecord`]
///
/// `wait_time` is derived at `build()`: `max(0, duration - cpu_time)` for
/// synchronous work, the full duration for asynchronous work.
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    record: TraceRecord,
    explicit_wait: Option<f64>,
}

impl TraceBuilder {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            record: TraceRecord {
                name: name.into(),
                module: module.into(),
                timestamp: now_secs(),
                ..TraceRecord::default()
            },
            explicit_wait: None,
        }
    }

    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.record.duration = seconds;
        self
    }

    pub fn cpu_time(mut self, seconds: f64) -> Self {
        self.record.cpu_time = seconds;
        self
    }

    /// Override the derived wait time
    pub fn wait_time(mut self, seconds: f64) -> Self {
        self.explicit_wait = Some(seconds);
        self
    }

    pub fn memory(mut self, bytes: u64, diff: i64) -> Self {
        self.record.memory = bytes;
        self.record.memory_diff = diff;
        self
    }

    pub fn branch_tag(mut self, tag: impl Into<String>) -> Self {
        self.record.branch_tag = Some(tag.into());
        self
    }

    /// Mark the unit as failed
    pub fn error(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.record.error = true;
        self.record.exception_type = Some(kind.into());
        self.record.exception_message = Some(message.into());
        self
    }

    /// Mark the unit as failed without exception details
    pub fn failed(mut self) -> Self {
        self.record.error = true;
        self
    }

    /// Mark the unit as asynchronous (I/O bound: all time is wait time)
    pub fn asynchronous(mut self, yield_count: u64) -> Self {
        self.record.is_async = true;
        self.record.yield_count = yield_count;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: f64) -> Self {
        self.record.metadata.insert(key.into(), value);
        self
    }

    pub fn trace_id(mut self, id: impl Into<String>) -> Self {
        self.record.trace_id = Some(id.into());
        self
    }

    /// Finalize the record
    pub fn build(self) -> TraceRecord {
        let mut record = self.record;
        if record.is_async {
            record.cpu_time = 0.0;
            record.wait_time = record.duration;
        } else {
            record.wait_time = (record.duration - record.cpu_time).max(0.0);
        }
        if let Some(wait) = self.explicit_wait {
            record.wait_time = wait;
        }
        if record.trace_id.is_none() {
            record.trace_id = Some(Uuid::new_v4().to_string());
        }
        record.sanitized()
    }
}
