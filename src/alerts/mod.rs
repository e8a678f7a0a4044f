/*!
 * Alerts
 * Rule evaluation over score reports and their history
 *
 * Delivery to external channels is left to the embedding application.
 */

mod engine;
mod history;
mod rules;
mod types;

pub use engine::AlertEngine;
pub use history::{HistoryEntry, HistoryStore, MemoryHistory};
pub use rules::{
    AlertRule, Condition, CustomRule, CustomRuleConfig, MetricStabilityRule, Operator, RuleMetric,
    StabilityRegressionRule,
};
pub use types::{Alert, AlertSeverity};
