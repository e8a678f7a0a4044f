/*!
 * Alert Types
 */

use crate::trace::now_secs;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        })
    }
}

/// A fired alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub rule_name: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub metric_name: String,
    pub current_value: f64,
    pub threshold: f64,
    /// Seconds since UNIX epoch
    pub timestamp: f64,
    /// Module the alert is scoped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Alert {
    pub fn new(
        rule_name: impl Into<String>,
        severity: AlertSeverity,
        metric_name: impl Into<String>,
        current_value: f64,
        threshold: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            message: message.into(),
            metric_name: metric_name.into(),
            current_value,
            threshold,
            timestamp: now_secs(),
            module: None,
        }
    }

    pub fn for_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Cooldown key: the rule name, scoped by module when present
    pub fn dedup_key(&self) -> String {
        match &self.module {
            Some(module) => format!("{}:{}", self.rule_name, module),
            None => self.rule_name.clone(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}
