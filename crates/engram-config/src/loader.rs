//! JSON5 config file loading.

use crate::error::ConfigError;
use crate::model::EngramConfig;
use log::info;
use std::path::Path;

/// Load a config file, validating bounds that the schema cannot express.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngramConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let config: EngramConfig =
        json5::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
    validate(&config)?;
    info!("loaded config (path={})", path.display());
    Ok(config)
}

fn validate(config: &EngramConfig) -> Result<(), ConfigError> {
    if config.context.budget_chars == 0 {
        return Err(ConfigError::Invalid(
            "context.budget_chars must be greater than zero".to_string(),
        ));
    }
    if config.memory.candidate_pool_size == 0 {
        return Err(ConfigError::Invalid(
            "memory.candidate_pool_size must be greater than zero".to_string(),
        ));
    }
    if config.memory.reflection_interval == 0 {
        return Err(ConfigError::Invalid(
            "memory.reflection_interval must be greater than zero".to_string(),
        ));
    }
    if config.memory.eviction_cap <= config.memory.recent_turn_guard {
        return Err(ConfigError::Invalid(
            "memory.eviction_cap must exceed memory.recent_turn_guard".to_string(),
        ));
    }
    Ok(())
}
