//! Configuration schema for Engram.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root config for the Engram runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngramConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl EngramConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> EngramConfigBuilder {
        EngramConfigBuilder::new()
    }
}

/// Builder for assembling an `EngramConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct EngramConfigBuilder {
    config: EngramConfig,
}

impl EngramConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: EngramConfig::default(),
        }
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the context assembly configuration.
    pub fn context(mut self, context: ContextConfig) -> Self {
        self.config.context = context;
        self
    }

    /// Replace the model provider configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Replace the snapshot storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Finalize and return the built `EngramConfig`.
    pub fn build(self) -> EngramConfig {
        self.config
    }
}

/// Memory scoring, pooling, reflection, and eviction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Most recent items considered per assembly; bounds scoring cost.
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,
    /// Maximum stored items per agent before capacity eviction runs.
    #[serde(default = "default_eviction_cap")]
    pub eviction_cap: usize,
    /// Newest conversation turns that eviction must never remove.
    #[serde(default = "default_recent_turn_guard")]
    pub recent_turn_guard: usize,
    /// Exchanges between reflection syntheses.
    #[serde(default = "default_reflection_interval")]
    pub reflection_interval: u64,
    /// Half-life in seconds for the recency decay term.
    #[serde(default = "default_recency_half_life_secs")]
    pub recency_half_life_secs: u64,
    #[serde(default)]
    pub weights: ScoreWeightsConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            candidate_pool_size: default_candidate_pool_size(),
            eviction_cap: default_eviction_cap(),
            recent_turn_guard: default_recent_turn_guard(),
            reflection_interval: default_reflection_interval(),
            recency_half_life_secs: default_recency_half_life_secs(),
            weights: ScoreWeightsConfig::default(),
        }
    }
}

fn default_candidate_pool_size() -> usize {
    64
}

fn default_eviction_cap() -> usize {
    512
}

fn default_recent_turn_guard() -> usize {
    8
}

fn default_reflection_interval() -> u64 {
    5
}

fn default_recency_half_life_secs() -> u64 {
    3600
}

/// Relative weights for the scoring terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeightsConfig {
    #[serde(default = "default_overlap_weight")]
    pub overlap: f64,
    #[serde(default = "default_importance_weight")]
    pub importance: f64,
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
}

impl Default for ScoreWeightsConfig {
    fn default() -> Self {
        Self {
            overlap: default_overlap_weight(),
            importance: default_importance_weight(),
            recency: default_recency_weight(),
        }
    }
}

fn default_overlap_weight() -> f64 {
    0.5
}

fn default_importance_weight() -> f64 {
    0.3
}

fn default_recency_weight() -> f64 {
    0.2
}

/// Context assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Character ceiling for the assembled context block.
    #[serde(default = "default_budget_chars")]
    pub budget_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            budget_chars: default_budget_chars(),
        }
    }
}

fn default_budget_chars() -> usize {
    4000
}

/// Model provider configuration for completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider label, informational.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name sent with each request.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Base URL for the chat completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Wall-clock bound for one completion call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model_name(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for agent snapshot files.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/agents")
}
