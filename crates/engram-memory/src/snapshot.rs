//! Snapshot persistence for agent memory state.

use crate::error::MemoryError;
use crate::model::{AgentProfile, MemorySnapshot};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[async_trait]
/// Durable storage for full per-agent memory snapshots.
///
/// Implementations must round-trip exactly: `load(save(x)) == x`.
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing any previous one for the agent.
    async fn save(&self, snapshot: &MemorySnapshot) -> Result<(), MemoryError>;

    /// Load the snapshot for an agent, or `None` if absent.
    async fn load(&self, agent_id: Uuid) -> Result<Option<MemorySnapshot>, MemoryError>;

    /// Delete an agent's snapshot, returning whether one existed.
    async fn delete(&self, agent_id: Uuid) -> Result<bool, MemoryError>;

    /// List the profiles of all persisted agents.
    async fn list(&self) -> Result<Vec<AgentProfile>, MemoryError>;
}

/// File-backed snapshot store writing one JSON file per agent.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    /// Root directory for snapshot files.
    root: PathBuf,
}

impl FileSnapshotStore {
    /// Create a new file-backed store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized file snapshot store (root={})", root.display());
        Ok(Self { root })
    }

    /// Path to the agent snapshot file.
    fn agent_path(&self, agent_id: Uuid) -> PathBuf {
        self.root.join(format!("{agent_id}.json"))
    }

    /// Path to the temporary snapshot file.
    fn temp_path(&self, agent_id: Uuid) -> PathBuf {
        self.root.join(format!("{agent_id}.json.tmp"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    /// Save a snapshot atomically via a temp file and rename.
    async fn save(&self, snapshot: &MemorySnapshot) -> Result<(), MemoryError> {
        let path = self.agent_path(snapshot.agent.id);
        let temp_path = self.temp_path(snapshot.agent.id);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let raw = serde_json::to_string(snapshot)?;
            file.write_all(raw.as_bytes())?;
        }
        std::fs::rename(temp_path, path)?;
        debug!(
            "saved snapshot (agent_id={}, items={}, exchanges={})",
            snapshot.agent.id,
            snapshot.items.len(),
            snapshot.exchange_count
        );
        Ok(())
    }

    async fn load(&self, agent_id: Uuid) -> Result<Option<MemorySnapshot>, MemoryError> {
        let path = self.agent_path(agent_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: MemorySnapshot = serde_json::from_str(&raw)?;
        Ok(Some(snapshot))
    }

    async fn delete(&self, agent_id: Uuid) -> Result<bool, MemoryError> {
        let path = self.agent_path(agent_id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        info!("deleted snapshot (agent_id={})", agent_id);
        Ok(true)
    }

    /// List persisted agents by scanning snapshot files. Unreadable files are
    /// skipped with a warning rather than failing the listing.
    async fn list(&self) -> Result<Vec<AgentProfile>, MemoryError> {
        let mut profiles = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(MemoryError::Io)
                .and_then(|raw| serde_json::from_str::<MemorySnapshot>(&raw).map_err(MemoryError::Serde))
            {
                Ok(snapshot) => profiles.push(snapshot.agent),
                Err(err) => {
                    warn!("skipping unreadable snapshot (path={}, err={})", path.display(), err);
                }
            }
        }
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(profiles)
    }
}
