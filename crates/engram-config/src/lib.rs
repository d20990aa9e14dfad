//! Configuration models for Engram.
//!
//! This crate owns the Engram config schema, serde defaults, and the JSON5
//! file loader used by binaries embedding the agent runtime.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading APIs.
pub use error::ConfigError;
/// File loading helpers.
pub use loader::load_config;
/// Configuration schema models.
pub use model::*;
