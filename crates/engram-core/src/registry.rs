//! Process-wide agent registry.
//!
//! The registry is the sole owner of agent sessions: it creates them, loads
//! them lazily from the snapshot store, and flushes every dirty store on
//! shutdown.

use crate::error::EngramCoreError;
use crate::llm::ModelClient;
use crate::session::AgentSession;
use crate::types::AgentInfo;
use crate::viz::MemoryView;
use engram_config::EngramConfig;
use engram_memory::{AgentProfile, SnapshotStore};
use log::{info, warn};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Registry of live agent sessions keyed by agent id.
pub struct AgentRegistry {
    agents: RwLock<HashMap<Uuid, Arc<AgentSession>>>,
    model: Arc<dyn ModelClient>,
    snapshots: Arc<dyn SnapshotStore>,
    config: EngramConfig,
}

impl AgentRegistry {
    /// Create an empty registry around the model and snapshot collaborators.
    pub fn new(
        model: Arc<dyn ModelClient>,
        snapshots: Arc<dyn SnapshotStore>,
        config: EngramConfig,
    ) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            model,
            snapshots,
            config,
        }
    }

    /// Create a new agent and persist its initial snapshot.
    pub async fn create_agent(
        &self,
        name: &str,
        persona: &str,
    ) -> Result<AgentProfile, EngramCoreError> {
        let profile = AgentProfile::new(name, persona);
        let session = Arc::new(AgentSession::new(
            profile.clone(),
            self.model.clone(),
            self.snapshots.clone(),
            self.config.clone(),
        ));
        session.flush().await?;
        info!("created agent (agent_id={}, name={})", profile.id, profile.name);
        self.agents.write().insert(profile.id, session);
        Ok(profile)
    }

    /// Fetch a live session, loading it from the snapshot store if needed.
    pub async fn get_session(&self, agent_id: Uuid) -> Result<Arc<AgentSession>, EngramCoreError> {
        if let Some(session) = self.agents.read().get(&agent_id).cloned() {
            return Ok(session);
        }

        let Some(snapshot) = self.snapshots.load(agent_id).await? else {
            return Err(EngramCoreError::UnknownAgent(agent_id));
        };
        info!("loaded agent from snapshot (agent_id={})", agent_id);
        let session = Arc::new(AgentSession::from_snapshot(
            snapshot,
            self.model.clone(),
            self.snapshots.clone(),
            self.config.clone(),
        )?);

        let mut agents = self.agents.write();
        // A concurrent caller may have loaded the same agent first.
        let session = agents.entry(agent_id).or_insert(session).clone();
        Ok(session)
    }

    /// Route one user message to an agent and return the reply.
    pub async fn handle_message(
        &self,
        agent_id: Uuid,
        user_text: &str,
    ) -> Result<String, EngramCoreError> {
        let session = self.get_session(agent_id).await?;
        session.handle_message(user_text).await
    }

    /// Insert a fact into an agent's memory.
    pub async fn insert_fact(
        &self,
        agent_id: Uuid,
        content: &str,
        importance: Option<f64>,
        metadata: Map<String, Value>,
    ) -> Result<Uuid, EngramCoreError> {
        let session = self.get_session(agent_id).await?;
        session.insert_fact(content, importance, metadata).await
    }

    /// Read-only memory projection for an agent.
    pub async fn memory_view(&self, agent_id: Uuid) -> Result<MemoryView, EngramCoreError> {
        let session = self.get_session(agent_id).await?;
        Ok(session.memory_view().await)
    }

    /// List all agents, live and persisted, oldest first.
    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>, EngramCoreError> {
        let mut by_id: HashMap<Uuid, AgentInfo> = HashMap::new();
        for profile in self.snapshots.list().await? {
            by_id.insert(profile.id, AgentInfo::from(&profile));
        }
        let sessions: Vec<Arc<AgentSession>> = self.agents.read().values().cloned().collect();
        for session in sessions {
            let profile = session.profile().await;
            by_id.insert(profile.id, AgentInfo::from(&profile));
        }
        let mut infos: Vec<AgentInfo> = by_id.into_values().collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(infos)
    }

    /// Delete an agent's session and persisted snapshot.
    pub async fn delete_agent(&self, agent_id: Uuid) -> Result<bool, EngramCoreError> {
        let removed_live = self.agents.write().remove(&agent_id).is_some();
        let removed_stored = self.snapshots.delete(agent_id).await?;
        let removed = removed_live || removed_stored;
        if removed {
            info!("deleted agent (agent_id={})", agent_id);
        }
        Ok(removed)
    }

    /// Await pending reflections and flush every dirty store.
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<AgentSession>> = self.agents.read().values().cloned().collect();
        info!("shutting down registry (agents={})", sessions.len());
        for session in sessions {
            session.await_reflection().await;
            if let Err(err) = session.flush().await {
                warn!("shutdown flush failed (err={})", err);
            }
        }
    }
}

