//! Error types for the core orchestration crate.

use crate::llm::ModelError;
use crate::tools::ToolError;
use engram_memory::MemoryError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by session and registry operations.
#[derive(Debug, Error)]
pub enum EngramCoreError {
    /// Agent id is unknown to the registry.
    #[error("unknown agent: {0}")]
    UnknownAgent(Uuid),
    /// Memory store or snapshot persistence error.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
    /// External model call failed; memory was left unmutated.
    #[error("model call failed: {0}")]
    ModelCall(#[from] ModelError),
    /// Tool registry error.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
