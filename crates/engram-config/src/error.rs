//! Error types for config loading.

use thiserror::Error;

/// Errors returned when loading or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading a config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON5 parse failure.
    #[error("parse error: {0}")]
    Parse(String),
    /// A config value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}
