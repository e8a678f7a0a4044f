/*!
 * Alert Engine
 * Runs every enabled rule and suppresses repeats within a cooldown
 *
 * Cooldown state lives in memory only; a restart forgets it.
 */

use super::history::HistoryEntry;
use super::rules::{AlertRule, CustomRule, MetricStabilityRule, StabilityRegressionRule};
use super::types::Alert;
use crate::config::AlertConfig;
use crate::core::errors::ConfigError;
use crate::scoring::ScoreReport;
use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct AlertEngine {
    enabled: bool,
    cooldown: Duration,
    rules: Vec<Box<dyn AlertRule>>,
    last_fired: Mutex<AHashMap<String, Instant>>,
}

impl AlertEngine {
    /// Engine with no rules
    pub fn new(cooldown: Duration) -> Self {
        Self {
            enabled: true,
            cooldown,
            rules: Vec::new(),
            last_fired: Mutex::new(AHashMap::new()),
        }
    }

    /// Standard rules plus configured custom rules
    pub fn from_config(config: &AlertConfig) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config.cooldown);
        engine.enabled = config.enabled;

        for rule in MetricStabilityRule::defaults(config) {
            engine.add_rule(rule);
        }
        engine.add_rule(StabilityRegressionRule::from_config(config));
        for custom in &config.custom_rules {
            engine.add_rule(CustomRule::new(custom.clone())?);
        }

        debug!(rules = engine.rules.len(), "Alert engine configured");
        Ok(engine)
    }

    pub fn add_rule<R: AlertRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate all rules and return the alerts that fire
    pub fn run(
        &self,
        report: &ScoreReport,
        history: &[HistoryEntry],
        module_scores: &BTreeMap<String, ScoreReport>,
    ) -> Vec<Alert> {
        self.run_at(Instant::now(), report, history, module_scores)
    }

    /// [`run`](Self::run) with an explicit clock
    pub fn run_at(
        &self,
        now: Instant,
        report: &ScoreReport,
        history: &[HistoryEntry],
        module_scores: &BTreeMap<String, ScoreReport>,
    ) -> Vec<Alert> {
        if !self.enabled {
            return Vec::new();
        }

        let mut fired = Vec::new();
        let mut last_fired = self.last_fired.lock();

        for rule in self.rules.iter().filter(|rule| rule.enabled()) {
            for alert in rule.evaluate(report, history, module_scores) {
                let key = alert.dedup_key();
                let cooling = last_fired
                    .get(&key)
                    .is_some_and(|&at| now.saturating_duration_since(at) < self.cooldown);

                if cooling {
                    info!(alert = %key, "Alert suppressed (cooldown)");
                    continue;
                }

                last_fired.insert(key, now);
                info!(
                    rule = %alert.rule_name,
                    severity = %alert.severity,
                    metric = %alert.metric_name,
                    value = alert.current_value,
                    "Alert fired"
                );
                fired.push(alert);
            }
        }

        fired
    }

    /// Forget cooldown state
    pub fn reset(&self) {
        self.last_fired.lock().clear();
    }
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEngine")
            .field("enabled", &self.enabled)
            .field("cooldown", &self.cooldown)
            .field("rules", &self.rules.len())
            .finish()
    }
}
