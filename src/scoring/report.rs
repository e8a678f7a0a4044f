/*!
 * Score Report
 * Overall stability score with its five-pillar breakdown
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// One scored stability dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    TimingStability,
    MemoryStability,
    ErrorVolatility,
    BranchingEntropy,
    ConcurrencyChaos,
}

impl Pillar {
    pub const ALL: [Pillar; 5] = [
        Pillar::TimingStability,
        Pillar::MemoryStability,
        Pillar::ErrorVolatility,
        Pillar::BranchingEntropy,
        Pillar::ConcurrencyChaos,
    ];

    /// Field name used in serialized reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::TimingStability => "timing_stability",
            Pillar::MemoryStability => "memory_stability",
            Pillar::ErrorVolatility => "error_volatility",
            Pillar::BranchingEntropy => "branching_entropy",
            Pillar::ConcurrencyChaos => "concurrency_chaos",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pillar| pillar.as_str() == name)
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pillar scores in [0, 1]; 1 is perfectly stable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub timing_stability: f64,
    pub memory_stability: f64,
    pub error_volatility: f64,
    pub branching_entropy: f64,
    pub concurrency_chaos: f64,
}

impl Breakdown {
    #[inline]
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::TimingStability => self.timing_stability,
            Pillar::MemoryStability => self.memory_stability,
            Pillar::ErrorVolatility => self.error_volatility,
            Pillar::BranchingEntropy => self.branching_entropy,
            Pillar::ConcurrencyChaos => self.concurrency_chaos,
        }
    }

    /// (pillar, score) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Pillar, f64)> + '_ {
        Pillar::ALL.into_iter().map(move |pillar| (pillar, self.get(pillar)))
    }
}

/// Result of one scoring run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Overall score, 0..=100
    pub pss: u8,
    pub breakdown: Breakdown,
}

impl ScoreReport {
    /// Report for an input with nothing to score
    pub fn zero() -> Self {
        Self::default()
    }

    /// Look up `pss` or a pillar by its serialized name
    ///
    /// `pss` is returned on its 0..=100 scale.
    pub fn metric(&self, name: &str) -> Option<f64> {
        if name == "pss" {
            return Some(f64::from(self.pss));
        }
        Pillar::from_name(name).map(|pillar| self.breakdown.get(pillar))
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PSS {}/100", self.pss)?;
        for (pillar, score) in self.breakdown.iter() {
            write!(f, " {}={:.2}", pillar, score)?;
        }
        Ok(())
    }
}
