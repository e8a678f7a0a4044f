/*!
 * Trace Records
 * The atomic unit of data: one record per observed unit of work
 */

mod builder;
mod record;

pub use builder::{now_secs, TraceBuilder, WorkTimer};
pub use record::{SystemMetrics, TraceRecord, METRIC_ACTIVE_TASKS, METRIC_CHURN_RATE, METRIC_LAG};
