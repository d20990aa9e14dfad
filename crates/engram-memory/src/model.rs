//! Memory item model shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key linking the two turns of one exchange.
pub const EXCHANGE_KEY: &str = "exchange";
/// Metadata key recording who produced a conversation turn.
pub const SPEAKER_KEY: &str = "speaker";

/// Kind of a stored memory item. Closed set; drives default importance and
/// context formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Factual knowledge inserted explicitly.
    Fact,
    /// One side of a recorded conversation exchange.
    ConversationTurn,
    /// Synthesized summary derived from prior exchanges.
    Reflection,
}

impl MemoryKind {
    /// Default importance assigned to new items of this kind.
    pub fn default_importance(self) -> f64 {
        match self {
            MemoryKind::Fact => 1.0,
            MemoryKind::ConversationTurn => 0.7,
            MemoryKind::Reflection => 0.9,
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryKind::Fact => "fact",
            MemoryKind::ConversationTurn => "conversation_turn",
            MemoryKind::Reflection => "reflection",
        }
    }
}

/// One atomic unit of stored agent knowledge.
///
/// `id`, `kind`, `content`, and `created_at` are immutable after creation;
/// only `importance` and `metadata` may change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryItem {
    /// Item identifier, unique within an agent's store.
    pub id: Uuid,
    /// Item kind.
    pub kind: MemoryKind,
    /// Text payload.
    pub content: String,
    /// Creation timestamp; used for recency scoring and tie-breaks.
    pub created_at: DateTime<Utc>,
    /// Mutable relevance weight in [0, 1].
    pub importance: f64,
    /// Open string-keyed metadata (speaker, exchange id, source).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MemoryItem {
    /// Create a new item with a fresh id, the current time, and the kind's
    /// default importance.
    pub fn new(kind: MemoryKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            created_at: Utc::now(),
            importance: kind.default_importance(),
            metadata: Map::new(),
        }
    }

    /// Override the importance weight, clamped to [0, 1].
    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Exchange id linking this turn to its pair, if present.
    pub fn exchange_id(&self) -> Option<Uuid> {
        self.metadata
            .get(EXCHANGE_KEY)
            .and_then(Value::as_str)
            .and_then(|value| Uuid::parse_str(value).ok())
    }

    /// Speaker label for a conversation turn, if present.
    pub fn speaker(&self) -> Option<&str> {
        self.metadata.get(SPEAKER_KEY).and_then(Value::as_str)
    }
}

/// Agent identity and the persona steering model behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    /// Agent identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Free-text persona included in every assembled context.
    pub persona: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent completed turn.
    pub last_active_at: DateTime<Utc>,
}

impl AgentProfile {
    /// Create a fresh profile.
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            persona: persona.into(),
            created_at: now,
            last_active_at: now,
        }
    }
}

/// Full persisted state for one agent; the unit of snapshot round-trips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemorySnapshot {
    /// Agent metadata.
    pub agent: AgentProfile,
    /// Every stored memory item, in insertion order.
    pub items: Vec<MemoryItem>,
    /// Completed exchanges; drives the reflection trigger across restarts.
    pub exchange_count: u64,
}
