/*!
 * Runtime Baseline
 * JSON file carrying tuned values across restarts
 */

use crate::core::errors::TuningError;
use crate::core::serde::lenient_f64;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persisted tuner state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeBaseline {
    #[serde(default, with = "lenient_f64")]
    pub concurrency_wait_threshold: f64,
}

impl RuntimeBaseline {
    pub fn new(concurrency_wait_threshold: f64) -> Self {
        Self {
            concurrency_wait_threshold,
        }
    }

    /// Read a baseline file; `Ok(None)` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, TuningError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| TuningError::Persistence(e.to_string()))?;
        let baseline: Self = serde_json::from_str(&contents)?;
        if !baseline.concurrency_wait_threshold.is_finite()
            || baseline.concurrency_wait_threshold <= 0.0
        {
            return Ok(None);
        }
        Ok(Some(baseline))
    }

    /// Write the baseline as pretty JSON, replacing any previous file
    pub fn save(&self, path: &Path) -> Result<(), TuningError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| TuningError::Persistence(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| TuningError::Persistence(e.to_string()))
    }
}
