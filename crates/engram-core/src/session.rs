//! Per-agent turn orchestration.
//!
//! One session owns one agent's memory store. A turn moves through
//! assembling context, awaiting the model, and recording the exchange; the
//! async mutex around the state serializes turns for the agent while leaving
//! other agents fully parallel.

use crate::context::ContextAssembler;
use crate::error::EngramCoreError;
use crate::llm::{CompletionRequest, ModelClient, ModelError};
use crate::tools::ToolRegistry;
use crate::viz::{MemoryView, ReasoningTrace};
use chrono::Utc;
use engram_config::EngramConfig;
use engram_memory::model::{EXCHANGE_KEY, SPEAKER_KEY};
use engram_memory::{
    AgentProfile, MemoryError, MemoryItem, MemoryKind, MemorySnapshot, MemoryStore, SnapshotStore,
};
use log::{debug, info, warn};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Importance for recorded user messages.
const USER_TURN_IMPORTANCE: f64 = 0.8;
/// Importance for recorded agent replies.
const AGENT_TURN_IMPORTANCE: f64 = 0.7;
/// Elevated importance for synthesized reflections.
const REFLECTION_IMPORTANCE: f64 = 0.9;

/// Mutable per-agent state guarded by the turn lock.
struct AgentState {
    profile: AgentProfile,
    store: MemoryStore,
    exchange_count: u64,
    dirty: bool,
}

/// Orchestrates turns for a single agent.
pub struct AgentSession {
    state: Arc<Mutex<AgentState>>,
    model: Arc<dyn ModelClient>,
    snapshots: Arc<dyn SnapshotStore>,
    tools: ToolRegistry,
    assembler: ContextAssembler,
    config: EngramConfig,
    pending_reflection: Mutex<Option<JoinHandle<()>>>,
    pending_flush: Mutex<Option<JoinHandle<()>>>,
    last_trace: parking_lot::Mutex<Option<ReasoningTrace>>,
}

impl AgentSession {
    /// Create a session for a fresh agent with an empty store.
    pub fn new(
        profile: AgentProfile,
        model: Arc<dyn ModelClient>,
        snapshots: Arc<dyn SnapshotStore>,
        config: EngramConfig,
    ) -> Self {
        Self::with_state(profile, MemoryStore::new(), 0, model, snapshots, config)
    }

    /// Rebuild a session from a persisted snapshot.
    pub fn from_snapshot(
        snapshot: MemorySnapshot,
        model: Arc<dyn ModelClient>,
        snapshots: Arc<dyn SnapshotStore>,
        config: EngramConfig,
    ) -> Result<Self, EngramCoreError> {
        let store = MemoryStore::from_items(snapshot.items)?;
        Ok(Self::with_state(
            snapshot.agent,
            store,
            snapshot.exchange_count,
            model,
            snapshots,
            config,
        ))
    }

    fn with_state(
        profile: AgentProfile,
        store: MemoryStore,
        exchange_count: u64,
        model: Arc<dyn ModelClient>,
        snapshots: Arc<dyn SnapshotStore>,
        config: EngramConfig,
    ) -> Self {
        let assembler = ContextAssembler::new(&config.context, &config.memory);
        Self {
            state: Arc::new(Mutex::new(AgentState {
                profile,
                store,
                exchange_count,
                // A fresh or reloaded session is persisted on the next flush.
                dirty: true,
            })),
            model,
            snapshots,
            tools: ToolRegistry::new(),
            assembler,
            config,
            pending_reflection: Mutex::new(None),
            pending_flush: Mutex::new(None),
            last_trace: parking_lot::Mutex::new(None),
        }
    }

    /// The agent's current profile.
    pub async fn profile(&self) -> AgentProfile {
        self.state.lock().await.profile.clone()
    }

    /// Tools registered for this agent.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one user message and return the reply.
    ///
    /// On any model failure the store is left untouched; on success both
    /// turns of the exchange are recorded, never just one.
    pub async fn handle_message(&self, user_text: &str) -> Result<String, EngramCoreError> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let agent_id = state.profile.id;

        let context = self.assembler.assemble(
            &state.profile,
            &self.tools.list(),
            &state.store,
            user_text,
            now,
        );

        let request = CompletionRequest {
            system: context.text.clone(),
            user: user_text.to_string(),
            temperature: self.config.model.temperature,
        };
        let timeout_secs = self.config.model.timeout_secs;
        let reply = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.model.complete(request),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => return Err(EngramCoreError::ModelCall(err)),
            Err(_) => {
                return Err(EngramCoreError::ModelCall(ModelError::Timeout(timeout_secs)));
            }
        };

        let exchange = Uuid::new_v4();
        let user_item = turn_item(user_text, "user", exchange, USER_TURN_IMPORTANCE);
        let reply_item = turn_item(&reply, "agent", exchange, AGENT_TURN_IMPORTANCE);
        record_exchange(&mut state.store, user_item, reply_item)?;
        state.exchange_count += 1;
        state.profile.last_active_at = now;
        state.dirty = true;

        let memory = &self.config.memory;
        state.store.evict_to_cap(
            memory.eviction_cap,
            memory.recent_turn_guard,
            memory.recency_half_life_secs,
            now,
        );

        *self.last_trace.lock() = Some(ReasoningTrace {
            agent_id,
            user_input: user_text.to_string(),
            reply: reply.clone(),
            context_used: context.text,
            item_ids: context.included,
            created_at: now,
        });

        let exchange_count = state.exchange_count;
        let reflect_due = exchange_count % memory.reflection_interval == 0;
        let recent = reflect_due.then(|| recent_turns(&state.store, memory.reflection_interval));
        drop(state);

        debug!(
            "turn completed (agent_id={}, exchange_count={})",
            agent_id, exchange_count
        );

        if let Some(exchanges) = recent {
            self.schedule_reflection(exchanges).await;
        }
        self.schedule_flush().await;

        Ok(reply)
    }

    /// Insert a fact directly into the agent's memory.
    pub async fn insert_fact(
        &self,
        content: &str,
        importance: Option<f64>,
        metadata: Map<String, Value>,
    ) -> Result<Uuid, EngramCoreError> {
        let mut state = self.state.lock().await;
        let mut item = MemoryItem::new(MemoryKind::Fact, content);
        if let Some(importance) = importance {
            item = item.with_importance(importance);
        }
        item.metadata = metadata;
        let id = state.store.add(item)?;
        state.dirty = true;
        Ok(id)
    }

    /// Boost or decay a memory item's importance.
    pub async fn update_importance(&self, item_id: Uuid, delta: f64) -> Result<(), EngramCoreError> {
        let mut state = self.state.lock().await;
        state.store.update_importance(item_id, delta)?;
        state.dirty = true;
        Ok(())
    }

    /// Read-only projection of the agent's memory.
    pub async fn memory_view(&self) -> MemoryView {
        let state = self.state.lock().await;
        MemoryView::from_store(state.profile.id, &state.store)
    }

    /// Trace of the most recent turn's assembly, if any.
    pub fn last_trace(&self) -> Option<ReasoningTrace> {
        self.last_trace.lock().clone()
    }

    /// Await the in-flight reflection task, if one exists.
    pub async fn await_reflection(&self) {
        let handle = self.pending_reflection.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Persist the agent's state if it changed since the last flush.
    ///
    /// Any scheduled flush is awaited first, so the snapshot on disk after
    /// this returns reflects every completed turn.
    pub async fn flush(&self) -> Result<(), EngramCoreError> {
        let handle = self.pending_flush.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        flush_state(self.state.clone(), self.snapshots.clone()).await
    }

    /// Schedule the flush off the reply path.
    ///
    /// Each scheduled flush awaits its predecessor before cloning the state,
    /// so saves reach the store in turn order and a slow earlier save can
    /// never overwrite a newer snapshot.
    async fn schedule_flush(&self) {
        let state = self.state.clone();
        let snapshots = self.snapshots.clone();
        let mut pending = self.pending_flush.lock().await;
        let previous = pending.take();
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            if let Err(err) = flush_state(state, snapshots).await {
                warn!("snapshot flush failed (err={})", err);
            }
        });
        *pending = Some(handle);
    }

    /// Spawn reflection synthesis as a background task; its failure never
    /// reaches the reply path.
    async fn schedule_reflection(&self, exchanges: Vec<MemoryItem>) {
        let state = self.state.clone();
        let model = self.model.clone();
        let timeout_secs = self.config.model.timeout_secs;
        let temperature = self.config.model.temperature;
        let handle = tokio::spawn(async move {
            if let Err(err) =
                synthesize_reflection(state, model, exchanges, timeout_secs, temperature).await
            {
                warn!("reflection synthesis failed (err={})", err);
            }
        });

        let mut pending = self.pending_reflection.lock().await;
        if let Some(previous) = pending.take() {
            let _ = previous.await;
        }
        *pending = Some(handle);
    }
}

/// Build a conversation turn item linked to its exchange.
fn turn_item(content: &str, speaker: &str, exchange: Uuid, importance: f64) -> MemoryItem {
    MemoryItem::new(MemoryKind::ConversationTurn, content)
        .with_importance(importance)
        .with_metadata(EXCHANGE_KEY, json!(exchange.to_string()))
        .with_metadata(SPEAKER_KEY, json!(speaker))
}

/// Record both turns of an exchange, or neither.
fn record_exchange(
    store: &mut MemoryStore,
    user_item: MemoryItem,
    reply_item: MemoryItem,
) -> Result<(), MemoryError> {
    let user_id = store.add(user_item)?;
    if let Err(err) = store.add(reply_item) {
        store.evict(|item| item.id == user_id);
        return Err(err);
    }
    Ok(())
}

/// The turns of the last `exchanges` exchanges, oldest first.
fn recent_turns(store: &MemoryStore, exchanges: u64) -> Vec<MemoryItem> {
    let limit = (exchanges as usize).saturating_mul(2);
    let query = engram_memory::MemoryQuery::all()
        .kind(MemoryKind::ConversationTurn)
        .limit(limit);
    store.query(&query)
}

/// Condense recent exchanges into one elevated-importance reflection.
async fn synthesize_reflection(
    state: Arc<Mutex<AgentState>>,
    model: Arc<dyn ModelClient>,
    exchanges: Vec<MemoryItem>,
    timeout_secs: u64,
    temperature: f64,
) -> Result<(), EngramCoreError> {
    if exchanges.is_empty() {
        return Ok(());
    }
    let transcript: Vec<String> = exchanges
        .iter()
        .map(|item| {
            format!(
                "{}: {}",
                item.speaker().unwrap_or("participant"),
                item.content
            )
        })
        .collect();
    let request = CompletionRequest {
        system: "You are creating internal reflections for an AI assistant to help its memory. \
                 Be concise but insightful."
            .to_string(),
        user: format!(
            "Consider the following exchanges:\n{}\n\nWrite a brief internal reflection about \
             what the user might be trying to accomplish, what they might ask next, and what is \
             worth remembering for future interactions.",
            transcript.join("\n")
        ),
        temperature,
    };

    let content = match tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        model.complete(request),
    )
    .await
    {
        Ok(Ok(content)) => content,
        Ok(Err(err)) => return Err(EngramCoreError::ModelCall(err)),
        Err(_) => return Err(EngramCoreError::ModelCall(ModelError::Timeout(timeout_secs))),
    };

    let related: Vec<String> = exchanges.iter().map(|item| item.id.to_string()).collect();
    let item = MemoryItem::new(MemoryKind::Reflection, content)
        .with_importance(REFLECTION_IMPORTANCE)
        .with_metadata("related", json!(related));

    let mut state = state.lock().await;
    let agent_id = state.profile.id;
    state.store.add(item)?;
    state.dirty = true;
    info!(
        "reflection recorded (agent_id={}, source_turns={})",
        agent_id,
        exchanges.len()
    );
    Ok(())
}

/// Clone a snapshot under the lock, then write outside it so the flush never
/// races a concurrent turn for the same agent.
async fn flush_state(
    state: Arc<Mutex<AgentState>>,
    snapshots: Arc<dyn SnapshotStore>,
) -> Result<(), EngramCoreError> {
    let snapshot = {
        let mut state = state.lock().await;
        if !state.dirty {
            return Ok(());
        }
        state.dirty = false;
        MemorySnapshot {
            agent: state.profile.clone(),
            items: state.store.items().to_vec(),
            exchange_count: state.exchange_count,
        }
    };
    if let Err(err) = snapshots.save(&snapshot).await {
        state.lock().await.dirty = true;
        return Err(err.into());
    }
    Ok(())
}

