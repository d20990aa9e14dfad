//! Public SDK surface for Engram.
//!
//! This crate re-exports the core building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use engram_config as config;
pub use engram_core as core;
/// Re-export for convenience.
pub use engram_memory as memory;

pub use engram_core::{AgentRegistry, AgentSession, ContextAssembler, EngramCoreError};
pub use engram_memory::{MemoryItem, MemoryKind, MemoryScorer, MemoryStore};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
