/*!
 * Trace Record
 * Immutable execution record for one unit of work or one system sample
 */

use crate::core::serde::{is_false, is_none, is_zero_u64, lenient_bool, lenient_f64, lenient_string};
use crate::core::stats::non_negative;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Metadata key: event-loop lag in seconds
pub const METRIC_LAG: &str = "lag";
/// Metadata key: number of active tasks
pub const METRIC_ACTIVE_TASKS: &str = "active_tasks";
/// Metadata key: task churn per second
pub const METRIC_CHURN_RATE: &str = "churn_rate";

/// One observed unit of work
///
/// Timing fields are seconds. `timestamp` is taken at the *start* of the
/// work so that snapshots sort by when work began, not when it was recorded.
/// Records are shared as `Arc<TraceRecord>` once added to a collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(default, with = "lenient_string", skip_serializing_if = "is_none")]
    pub trace_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_name")]
    pub module: String,

    /// Free-form control-flow label
    #[serde(default, with = "lenient_string", skip_serializing_if = "is_none")]
    pub branch_tag: Option<String>,

    #[serde(default, with = "lenient_f64")]
    pub duration: f64,

    #[serde(default, with = "lenient_f64")]
    pub cpu_time: f64,

    #[serde(default, with = "lenient_f64")]
    pub wait_time: f64,

    /// Absolute memory at completion (bytes)
    #[serde(default, deserialize_with = "lenient_u64")]
    pub memory: u64,

    /// Memory delta across the unit of work (bytes)
    #[serde(default, deserialize_with = "lenient_i64")]
    pub memory_diff: i64,

    #[serde(default, with = "lenient_bool")]
    pub error: bool,

    #[serde(default, with = "lenient_string", skip_serializing_if = "is_none")]
    pub exception_type: Option<String>,

    #[serde(default, with = "lenient_string", skip_serializing_if = "is_none")]
    pub exception_message: Option<String>,

    /// Start of work, seconds since UNIX epoch
    #[serde(default, with = "lenient_f64")]
    pub timestamp: f64,

    #[serde(default, with = "lenient_bool", skip_serializing_if = "is_false")]
    pub is_async: bool,

    #[serde(default, skip_serializing_if = "is_zero_u64", deserialize_with = "lenient_u64")]
    pub yield_count: u64,

    /// Marks an infrastructure sample rather than a unit of work
    #[serde(default, with = "lenient_bool", skip_serializing_if = "is_false")]
    pub system_metric: bool,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "lenient_metrics"
    )]
    pub metadata: BTreeMap<String, f64>,
}

impl TraceRecord {
    /// Start building a unit-of-work record
    pub fn builder(name: impl Into<String>, module: impl Into<String>) -> super::TraceBuilder {
        super::TraceBuilder::new(name, module)
    }

    /// Build a system-metric sample (event-loop lag, task counts, churn)
    pub fn system(timestamp: f64, metrics: SystemMetrics) -> Self {
        let mut metadata = BTreeMap::new();
        if let Some(lag) = metrics.lag {
            metadata.insert(METRIC_LAG.to_string(), lag);
        }
        if let Some(active) = metrics.active_tasks {
            metadata.insert(METRIC_ACTIVE_TASKS.to_string(), active);
        }
        if let Some(churn) = metrics.churn_rate {
            metadata.insert(METRIC_CHURN_RATE.to_string(), churn);
        }
        Self {
            name: "system".to_string(),
            module: "system".to_string(),
            timestamp,
            system_metric: true,
            metadata,
            ..Self::default()
        }
        .sanitized()
    }

    /// Parse a record from JSON, substituting defaults for malformed fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Clamp every numeric field to a finite, non-negative value
    pub fn sanitized(mut self) -> Self {
        self.duration = non_negative(self.duration);
        self.cpu_time = non_negative(self.cpu_time);
        self.wait_time = non_negative(self.wait_time);
        self.timestamp = non_negative(self.timestamp);
        self.metadata.retain(|_, v| v.is_finite());
        for value in self.metadata.values_mut() {
            *value = value.max(0.0);
        }
        self
    }

    /// Read one numeric metadata value
    #[inline]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).copied()
    }

    /// System metrics carried by this record, if it is a system sample
    pub fn system_metrics(&self) -> Option<SystemMetrics> {
        if !self.system_metric {
            return None;
        }
        Some(SystemMetrics {
            lag: self.metric(METRIC_LAG),
            active_tasks: self.metric(METRIC_ACTIVE_TASKS),
            churn_rate: self.metric(METRIC_CHURN_RATE),
        })
    }
}

impl AsRef<TraceRecord> for TraceRecord {
    #[inline]
    fn as_ref(&self) -> &TraceRecord {
        self
    }
}

/// Infrastructure sample carried by a system-metric record
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemMetrics {
    pub lag: Option<f64>,
    pub active_tasks: Option<f64>,
    pub churn_rate: Option<f64>,
}

fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    lenient_string::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = lenient_f64::deserialize(deserializer)?;
    Ok(if value.is_finite() && value > 0.0 {
        value.min(u64::MAX as f64) as u64
    } else {
        0
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = lenient_f64::deserialize(deserializer)?;
    Ok(if value.is_finite() {
        value.clamp(i64::MIN as f64, i64::MAX as f64) as i64
    } else {
        0
    })
}

fn lenient_metrics<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, f64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| {
            let number = match value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            number.map(|n| (key, n))
        })
        .collect())
}
