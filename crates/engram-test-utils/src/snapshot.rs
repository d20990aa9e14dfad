//! In-memory snapshot store for tests.

use async_trait::async_trait;
use engram_memory::{AgentProfile, MemoryError, MemorySnapshot, SnapshotStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Snapshot store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<Uuid, MemorySnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read access for assertions.
    pub fn get(&self, agent_id: Uuid) -> Option<MemorySnapshot> {
        self.snapshots.lock().get(&agent_id).cloned()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    /// Whether no snapshot has been stored.
    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &MemorySnapshot) -> Result<(), MemoryError> {
        self.snapshots
            .lock()
            .insert(snapshot.agent.id, snapshot.clone());
        Ok(())
    }

    async fn load(&self, agent_id: Uuid) -> Result<Option<MemorySnapshot>, MemoryError> {
        Ok(self.snapshots.lock().get(&agent_id).cloned())
    }

    async fn delete(&self, agent_id: Uuid) -> Result<bool, MemoryError> {
        Ok(self.snapshots.lock().remove(&agent_id).is_some())
    }

    async fn list(&self) -> Result<Vec<AgentProfile>, MemoryError> {
        let mut profiles: Vec<AgentProfile> = self
            .snapshots
            .lock()
            .values()
            .map(|snapshot| snapshot.agent.clone())
            .collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(profiles)
    }
}
