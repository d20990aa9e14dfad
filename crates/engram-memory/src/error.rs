//! Error types for memory operations.

use uuid::Uuid;

/// Errors returned by memory stores and snapshot persistence.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Item id already present in the store.
    #[error("duplicate memory id: {0}")]
    DuplicateId(Uuid),
    /// Item id absent from the store.
    #[error("memory item not found: {0}")]
    NotFound(Uuid),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
