//! Test helpers shared across Engram crates.

pub mod llm;
pub mod snapshot;

pub use llm::{FailingModel, FixedModel, RecordingModel, ScriptedModel, SlowModel};
pub use snapshot::MemorySnapshotStore;
