//! Read-only projections of agent memory for inspection frontends.

use chrono::{DateTime, Utc};
use engram_memory::{MemoryItem, MemoryKind, MemoryQuery, MemoryStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Projection of one memory item; carries no mutation capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryItemView {
    /// Item identifier.
    pub id: Uuid,
    /// Item kind.
    pub kind: MemoryKind,
    /// Text payload.
    pub content: String,
    /// Relevance weight.
    pub importance: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&MemoryItem> for MemoryItemView {
    fn from(item: &MemoryItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            content: item.content.clone(),
            importance: item.importance,
            created_at: item.created_at,
        }
    }
}

/// Per-kind counts for an agent's store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MemoryStats {
    /// Total stored items.
    pub total: usize,
    /// Fact count.
    pub facts: usize,
    /// Conversation turn count.
    pub conversation_turns: usize,
    /// Reflection count.
    pub reflections: usize,
}

/// Full memory projection for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryView {
    /// Agent identifier.
    pub agent_id: Uuid,
    /// Every item, in insertion order.
    pub items: Vec<MemoryItemView>,
    /// Per-kind counts.
    pub stats: MemoryStats,
}

impl MemoryView {
    /// Build a view from a store using its query operation only.
    pub fn from_store(agent_id: Uuid, store: &MemoryStore) -> Self {
        let items: Vec<MemoryItemView> = store
            .query(&MemoryQuery::all())
            .iter()
            .map(MemoryItemView::from)
            .collect();
        let stats = MemoryStats {
            total: items.len(),
            facts: items.iter().filter(|item| item.kind == MemoryKind::Fact).count(),
            conversation_turns: items
                .iter()
                .filter(|item| item.kind == MemoryKind::ConversationTurn)
                .count(),
            reflections: items
                .iter()
                .filter(|item| item.kind == MemoryKind::Reflection)
                .count(),
        };
        Self {
            agent_id,
            items,
            stats,
        }
    }
}

/// Record of one turn's assembly, for reasoning inspection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasoningTrace {
    /// Agent identifier.
    pub agent_id: Uuid,
    /// The user message that opened the turn.
    pub user_input: String,
    /// The reply produced by the model.
    pub reply: String,
    /// The assembled context sent as the system prompt.
    pub context_used: String,
    /// Ids of the memory items included in the context.
    pub item_ids: Vec<Uuid>,
    /// Turn timestamp.
    pub created_at: DateTime<Utc>,
}
