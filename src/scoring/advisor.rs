/*!
 * Stability Advisor
 * Turns a score report into a diagnosis and remediation hints
 */

use super::report::{Pillar, ScoreReport};
use crate::config::AdvisorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall stability tier derived from the PSS
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Critical,
    Warning,
    Good,
    Excellent,
}

impl Tier {
    pub fn from_pss(pss: u8, config: &AdvisorConfig) -> Self {
        if pss >= config.threshold_excellent {
            Tier::Excellent
        } else if pss >= config.threshold_good {
            Tier::Good
        } else if pss >= config.threshold_warning {
            Tier::Warning
        } else {
            Tier::Critical
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Tier::Excellent => "System is performing with exceptional stability.",
            Tier::Good => "System is stable, with minor variance in specific areas.",
            Tier::Warning => "System is exhibiting significant flakiness. Reliability is at risk.",
            Tier::Critical => "System is critically unstable. Immediate remediation required.",
        }
    }
}

/// Advisor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub tier: Tier,
    pub summary: String,
    pub diagnosis: Vec<String>,
    pub advice: Vec<String>,
}

impl Advice {
    fn observe(&mut self, diagnosis: &str, advice: &[&str]) {
        self.diagnosis.push(diagnosis.to_string());
        self.advice.extend(advice.iter().map(|a| a.to_string()));
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stability Diagnosis")?;
        writeln!(f, "===================")?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "Observations:")?;
        for line in &self.diagnosis {
            writeln!(f, "- {}", line)?;
        }
        writeln!(f)?;
        writeln!(f, "Recommendations:")?;
        for line in &self.advice {
            writeln!(f, "- {}", line)?;
        }
        Ok(())
    }
}

/// Rule-based analysis of score reports
pub struct Advisor;

impl Advisor {
    pub fn analyze(report: &ScoreReport, config: &AdvisorConfig) -> Advice {
        let tier = Tier::from_pss(report.pss, config);
        let mut out = Advice {
            tier,
            summary: tier.summary().to_string(),
            diagnosis: Vec::new(),
            advice: Vec::new(),
        };

        let score = |pillar| report.breakdown.get(pillar);
        let critical = config.metric_score_critical;
        let warning = config.metric_score_warning;

        let correlated = critical + 0.1;
        if score(Pillar::TimingStability) < correlated && score(Pillar::MemoryStability) < correlated {
            out.observe(
                "Correlated volatility in timing and memory.",
                &["Allocation pressure may be causing pauses. Profile memory allocation."],
            );
        }

        let timing = score(Pillar::TimingStability);
        if timing < critical {
            out.observe(
                "Severe latency jitter (high variance or heavy tail).",
                &[
                    "Check for blocking I/O on the hot path.",
                    "Consider a timeout budget or circuit breaker.",
                ],
            );
        } else if timing < warning {
            out.observe(
                "Moderate timing inconsistency.",
                &["Investigate resource contention (CPU or disk) causing sporadic delays."],
            );
        }

        let memory = score(Pillar::MemoryStability);
        if memory < critical {
            out.observe(
                "Critical memory instability (spikes or rapid growth).",
                &["Possible leak or oversized allocations."],
            );
        } else if memory < warning {
            out.observe(
                "Memory usage fluctuates more than expected.",
                &["Review batch sizes; they may be inconsistent."],
            );
        }

        let errors = score(Pillar::ErrorVolatility);
        if errors < config.error_critical {
            out.observe(
                "High error volatility: failures are bursty and unpredictable.",
                &["Suggests failing external dependencies or race conditions."],
            );
        } else if errors < config.error_warning {
            out.observe("Occasional errors are impacting stability.", &[]);
        }

        if score(Pillar::BranchingEntropy) < config.entropy_threshold {
            out.observe(
                "High branching entropy: execution paths are unpredictable.",
                &["Control flow is strongly data-dependent. Make sure edge cases are tested."],
            );
        }

        let concurrency = score(Pillar::ConcurrencyChaos);
        if concurrency < critical {
            out.observe(
                "Severe concurrency chaos: wait times are highly inconsistent.",
                &["Contention on locks or shared resources. Review critical sections."],
            );
        } else if concurrency < warning {
            out.observe("Mild locking overhead.", &[]);
        }

        out
    }
}
