//! Durable structured memory for Engram agents.

pub mod error;
pub mod model;
pub mod score;
pub mod snapshot;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// Memory item model and agent snapshot types.
pub use model::{AgentProfile, MemoryItem, MemoryKind, MemorySnapshot};
/// Relevance scoring and ranking.
pub use score::{MemoryScorer, ScoreWeights, recency_decay};
/// Snapshot persistence interface and default file implementation.
pub use snapshot::{FileSnapshotStore, SnapshotStore};
/// Per-agent memory store and query types.
pub use store::{MemoryQuery, MemoryStore, QueryOrder};
