//! Turn orchestration for Engram agents.
//!
//! This crate owns context assembly, the per-agent session state machine,
//! the process-wide agent registry, and the model-client boundary used to
//! reach a completion provider.

pub mod context;
pub mod error;
pub mod llm;
pub mod registry;
pub mod session;
pub mod tools;
pub mod types;
pub mod viz;

/// Context assembly under a character budget.
pub use context::{AssembledContext, ContextAssembler};
/// Core error type.
pub use error::EngramCoreError;
/// Model boundary and default OpenAI-compatible client.
pub use llm::{CompletionRequest, ModelClient, ModelError, OpenAiClient};
/// Process-wide agent ownership.
pub use registry::AgentRegistry;
/// Per-agent turn orchestration.
pub use session::AgentSession;
/// Capability interface for agent tools.
pub use tools::{Tool, ToolError, ToolRegistry};
/// Agent summaries.
pub use types::AgentInfo;
/// Read-only memory projections.
pub use viz::{MemoryItemView, MemoryStats, MemoryView, ReasoningTrace};
