//! Shared data types for the orchestration API.

use chrono::{DateTime, Utc};
use engram_memory::AgentProfile;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary view of an agent for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInfo {
    /// Agent identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent completed turn.
    pub last_active_at: DateTime<Utc>,
}

impl From<&AgentProfile> for AgentInfo {
    fn from(profile: &AgentProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            created_at: profile.created_at,
            last_active_at: profile.last_active_at,
        }
    }
}
