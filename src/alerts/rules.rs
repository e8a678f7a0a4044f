/*!
 * Alert Rules
 * Threshold, regression and user-defined conditions over score reports
 */

use super::history::HistoryEntry;
use super::types::{Alert, AlertSeverity};
use crate::config::AlertConfig;
use crate::core::errors::ConfigError;
use crate::scoring::{Pillar, ScoreReport};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Detection logic evaluated against each new report
pub trait AlertRule: Send + Sync {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    /// Alerts raised by this report; empty when the rule does not fire
    ///
    /// `history` is ordered newest first. `module_scores` may be empty.
    fn evaluate(
        &self,
        report: &ScoreReport,
        history: &[HistoryEntry],
        module_scores: &BTreeMap<String, ScoreReport>,
    ) -> Vec<Alert>;
}

/// Metric watched by a threshold rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMetric {
    /// Overall score, compared on a [0, 1] scale
    Pss,
    Pillar(Pillar),
}

impl RuleMetric {
    pub fn name(&self) -> &'static str {
        match self {
            RuleMetric::Pss => "pss",
            RuleMetric::Pillar(pillar) => pillar.as_str(),
        }
    }

    fn value(&self, report: &ScoreReport) -> f64 {
        match self {
            RuleMetric::Pss => f64::from(report.pss) / 100.0,
            RuleMetric::Pillar(pillar) => report.breakdown.get(*pillar),
        }
    }
}

/// Fires when one metric drops below its threshold
#[derive(Debug, Clone)]
pub struct MetricStabilityRule {
    name: String,
    metric: RuleMetric,
    threshold: f64,
    severity: AlertSeverity,
    enabled: bool,
}

impl MetricStabilityRule {
    pub fn new(
        name: impl Into<String>,
        metric: RuleMetric,
        threshold: f64,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            name: name.into(),
            metric,
            threshold,
            severity,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The standard per-pillar rules plus the overall score rule
    pub fn defaults(config: &AlertConfig) -> Vec<Self> {
        use AlertSeverity::{Critical, Warning};
        use Pillar::*;

        vec![
            Self::new("Timing Stability Surge", RuleMetric::Pillar(TimingStability), config.threshold_ts, Warning),
            Self::new("Memory Stability Spike", RuleMetric::Pillar(MemoryStability), config.threshold_ms, Warning),
            Self::new("Error Burst", RuleMetric::Pillar(ErrorVolatility), config.threshold_ev, Critical),
            Self::new("Entropy Anomaly", RuleMetric::Pillar(BranchingEntropy), config.threshold_be, Warning),
            Self::new("Concurrency Variance Spike", RuleMetric::Pillar(ConcurrencyChaos), config.threshold_cc, Warning),
            Self::new("Overall Stability Drop", RuleMetric::Pss, config.threshold_pss, Warning),
        ]
    }
}

impl AlertRule for MetricStabilityRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn evaluate(
        &self,
        report: &ScoreReport,
        _history: &[HistoryEntry],
        _module_scores: &BTreeMap<String, ScoreReport>,
    ) -> Vec<Alert> {
        let value = self.metric.value(report);
        if value >= self.threshold {
            return Vec::new();
        }
        vec![Alert::new(
            &self.name,
            self.severity,
            self.metric.name(),
            value,
            self.threshold,
            format!(
                "{} detected. Score {:.2} is below threshold {:.2}.",
                self.name, value, self.threshold
            ),
        )]
    }
}

/// Fires when the PSS falls well below its recent average
#[derive(Debug, Clone)]
pub struct StabilityRegressionRule {
    history_limit: usize,
    threshold_drop: f64,
}

impl StabilityRegressionRule {
    pub const NAME: &'static str = "Stability Regression";

    pub fn new(history_limit: usize, threshold_drop: f64) -> Self {
        Self {
            history_limit,
            threshold_drop,
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(config.regression_history_limit, config.regression_threshold_drop)
    }
}

impl AlertRule for StabilityRegressionRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        report: &ScoreReport,
        history: &[HistoryEntry],
        _module_scores: &BTreeMap<String, ScoreReport>,
    ) -> Vec<Alert> {
        let recent = &history[..history.len().min(self.history_limit)];
        if recent.is_empty() {
            return Vec::new();
        }

        let average =
            recent.iter().map(|entry| f64::from(entry.pss())).sum::<f64>() / recent.len() as f64;
        let floor = average - self.threshold_drop;
        let current = f64::from(report.pss);
        if current >= floor {
            return Vec::new();
        }

        vec![Alert::new(
            Self::NAME,
            AlertSeverity::Critical,
            "pss",
            current,
            floor,
            format!(
                "Regression detected. PSS {:.1} is significantly lower than average {:.1} (-{}).",
                current, average, self.threshold_drop
            ),
        )]
    }
}

/// Comparison used by a custom condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl Operator {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Lt => value < threshold,
            Operator::Le => value <= threshold,
            Operator::Gt => value > threshold,
            Operator::Ge => value >= threshold,
            Operator::Eq => value == threshold,
        }
    }
}

/// `metric operator value`; metric is `pss` (0..=100) or a pillar name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub metric: String,
    pub operator: Operator,
    pub value: f64,
}

impl Condition {
    /// Unknown metrics read as 0
    fn holds(&self, report: &ScoreReport) -> bool {
        let value = report.metric(&self.metric).unwrap_or(0.0);
        self.operator.holds(value, self.value)
    }
}

/// User-defined rule as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRuleConfig {
    pub name: String,
    pub enabled: bool,
    pub severity: AlertSeverity,
    /// Regex matched at the start of module names; evaluates module scores
    /// instead of the global report when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_pattern: Option<String>,
    pub conditions: Vec<Condition>,
}

impl Default for CustomRuleConfig {
    fn default() -> Self {
        Self {
            name: "Custom Rule".to_string(),
            enabled: true,
            severity: AlertSeverity::Warning,
            module_pattern: None,
            conditions: Vec::new(),
        }
    }
}

impl CustomRuleConfig {
    /// Check condition values and compile the module pattern
    pub fn compile(&self) -> Result<Option<Regex>, ConfigError> {
        if let Some(cond) = self.conditions.iter().find(|cond| !cond.value.is_finite()) {
            return Err(ConfigError::InvalidValue(format!(
                "rule '{}': {} {:?} {}",
                self.name, cond.metric, cond.operator, cond.value
            )));
        }

        self.module_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
                    ConfigError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()
    }
}

/// All conditions must hold for the rule to fire
#[derive(Debug, Clone)]
pub struct CustomRule {
    config: CustomRuleConfig,
    module_pattern: Option<Regex>,
}

impl CustomRule {
    pub fn new(config: CustomRuleConfig) -> Result<Self, ConfigError> {
        let module_pattern = config.compile()?;
        Ok(Self {
            config,
            module_pattern,
        })
    }

    fn matches(&self, report: &ScoreReport) -> bool {
        self.config.conditions.iter().all(|cond| cond.holds(report))
    }

    fn alert(&self, scope: &str) -> Alert {
        Alert::new(
            &self.config.name,
            self.config.severity,
            "custom",
            0.0,
            0.0,
            format!("{}: {} matched conditions.", self.config.name, scope),
        )
    }
}

impl AlertRule for CustomRule {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(
        &self,
        report: &ScoreReport,
        _history: &[HistoryEntry],
        module_scores: &BTreeMap<String, ScoreReport>,
    ) -> Vec<Alert> {
        if self.config.conditions.is_empty() {
            return Vec::new();
        }

        match &self.module_pattern {
            Some(pattern) => module_scores
                .iter()
                .filter(|(module, scores)| pattern.is_match(module) && self.matches(scores))
                .map(|(module, _)| {
                    self.alert(&format!("Module '{}'", module)).for_module(module.as_str())
                })
                .collect(),
            None if self.matches(report) => vec![self.alert("Global metrics")],
            None => Vec::new(),
        }
    }
}
