/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    #[diagnostic(
        code(config::io),
        help("Check that the configuration file exists and is readable.")
    )]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    #[diagnostic(
        code(config::parse),
        help("The file must be valid TOML. Unknown keys are ignored, wrong types are not.")
    )]
    Parse(String),

    #[error("Invalid configuration value: {0}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Review the value against the documented range for this field.")
    )]
    InvalidValue(String),

    #[error("Invalid sampling rule pattern '{pattern}': {reason}")]
    #[diagnostic(
        code(config::invalid_pattern),
        help("Sampling rule patterns are regular expressions anchored at the start of the name.")
    )]
    InvalidPattern { pattern: String, reason: String },
}

/// Runtime tuning errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum TuningError {
    #[error("Not enough samples to tune: have {have}, need {need}")]
    #[diagnostic(
        code(tuning::insufficient_data),
        help("The window fills as traces arrive. The next cycle will retry.")
    )]
    InsufficientData { have: usize, need: usize },

    #[error("Failed to persist baseline state: {0}")]
    #[diagnostic(
        code(tuning::persistence),
        help("The in-memory threshold is still applied. Check the baseline path permissions.")
    )]
    Persistence(String),

    #[error("Failed to encode baseline state: {0}")]
    #[diagnostic(code(tuning::serialization))]
    Serialization(String),

    #[error("Non-finite statistic computed: {0}")]
    #[diagnostic(
        code(tuning::non_finite),
        help("The window contained values that produced NaN or infinity.")
    )]
    NonFinite(String),
}

/// Unified error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum StabilityError {
    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Tuning error: {0}")]
    #[diagnostic(transparent)]
    Tuning(#[from] TuningError),

    #[error("Control loop error: {0}")]
    #[diagnostic(
        code(stability::control_loop),
        help("The loop logs the failure and continues with its next cycle.")
    )]
    ControlLoop(String),

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(stability::internal_error),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Serialization(err.to_string())
    }
}

impl From<String> for StabilityError {
    fn from(msg: String) -> Self {
        StabilityError::Internal(msg)
    }
}

impl From<&str> for StabilityError {
    fn from(msg: &str) -> Self {
        StabilityError::Internal(msg.to_string())
    }
}

/// Result type for stability operations
pub type Result<T> = std::result::Result<T, StabilityError>;
