/*!
 * Configuration Loader
 * TOML files plus environment overrides
 *
 * Search order: `stability.toml`, then `[tool.stability]` inside
 * `pyproject.toml`, then defaults. Environment variables are applied last.
 */

use super::sections::StabilityConfig;
use crate::core::errors::ConfigError;
use crate::monitoring::SamplerMode;
use std::path::Path;
use tracing::{debug, warn};

/// Dedicated config file name
pub const CONFIG_FILE: &str = "stability.toml";
/// Shared project file holding a `[tool.stability]` table
pub const PYPROJECT_FILE: &str = "pyproject.toml";

const ENV_SAMPLE_RATE: &str = "STABILITY_SAMPLE_RATE";
const ENV_MAX_TRACES: &str = "STABILITY_MAX_TRACES";
const ENV_SAMPLER_MODE: &str = "STABILITY_SAMPLER_MODE";

impl StabilityConfig {
    /// Parse a config from TOML text
    ///
    /// Accepts either top-level keys or a single `[stability]` table.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(toml_str)?;
        match table.remove("stability") {
            Some(toml::Value::Table(inner)) => Ok(inner.try_into()?),
            Some(other) => {
                table.insert("stability".to_string(), other);
                Ok(table.try_into()?)
            }
            None => Ok(table.try_into()?),
        }
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and validate a config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)?.validate()
    }

    /// Write the config as TOML
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load from the current directory and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let dir = std::env::current_dir()?;
        Self::load_from_dir(&dir)?
            .with_overrides(|key| std::env::var(key).ok())
            .validate()
    }

    /// Search `dir` for a config file, falling back to defaults
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let dedicated = dir.join(CONFIG_FILE);
        if dedicated.is_file() {
            debug!(path = %dedicated.display(), "Loading stability config");
            return Self::load_from_file(&dedicated);
        }

        let project = dir.join(PYPROJECT_FILE);
        if project.is_file() {
            let contents = std::fs::read_to_string(&project)?;
            let mut table: toml::Table = toml::from_str(&contents)?;
            let section = table
                .remove("tool")
                .and_then(|tool| match tool {
                    toml::Value::Table(mut tool) => tool.remove("stability"),
                    _ => None,
                });
            if let Some(toml::Value::Table(section)) = section {
                debug!(path = %project.display(), "Loading [tool.stability]");
                let config: Self = section.try_into()?;
                return config.validate();
            }
        }

        Ok(Self::default())
    }

    /// Apply `STABILITY_*` overrides read through `lookup`
    ///
    /// Unparseable values are logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_SAMPLE_RATE) {
            match raw.trim().parse::<f64>() {
                Ok(rate) => self.sample_rate = rate,
                Err(_) => warn!(var = ENV_SAMPLE_RATE, value = %raw, "Ignoring invalid override"),
            }
        }
        if let Some(raw) = lookup(ENV_MAX_TRACES) {
            match raw.trim().parse::<usize>() {
                Ok(max) => self.collector.max_traces = max,
                Err(_) => warn!(var = ENV_MAX_TRACES, value = %raw, "Ignoring invalid override"),
            }
        }
        if let Some(raw) = lookup(ENV_SAMPLER_MODE) {
            match raw.parse::<SamplerMode>() {
                Ok(mode) => self.sampler.mode = mode,
                Err(_) => warn!(var = ENV_SAMPLER_MODE, value = %raw, "Ignoring invalid override"),
            }
        }
        self
    }
}
