//! Session-level turn handling, reflection, and flush behavior.

use async_trait::async_trait;
use engram_config::{EngramConfig, MemoryConfig};
use engram_core::{AgentSession, EngramCoreError, ModelClient};
use engram_memory::{AgentProfile, MemoryError, MemoryKind, MemorySnapshot, SnapshotStore};
use engram_test_utils::{FailingModel, FixedModel, MemorySnapshotStore, ScriptedModel, SlowModel};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use uuid::Uuid;

fn config_with_interval(reflection_interval: u64) -> EngramConfig {
    EngramConfig::builder()
        .memory(MemoryConfig {
            reflection_interval,
            ..MemoryConfig::default()
        })
        .build()
}

fn session(model: Arc<dyn ModelClient>, config: EngramConfig) -> AgentSession {
    AgentSession::new(
        AgentProfile::new("Ada", "I am a helpful assistant."),
        model,
        Arc::new(MemorySnapshotStore::new()),
        config,
    )
}

#[tokio::test]
async fn reply_records_both_turns_with_shared_exchange() {
    let session = session(Arc::new(FixedModel::new("hello back")), config_with_interval(10));
    let reply = session.handle_message("hello").await.expect("reply");
    assert_eq!(reply, "hello back".to_string());

    let view = session.memory_view().await;
    assert_eq!(view.stats.conversation_turns, 2);

    let trace = session.last_trace().expect("trace");
    assert_eq!(trace.user_input, "hello".to_string());
    assert_eq!(trace.reply, "hello back".to_string());
}

#[tokio::test]
async fn model_failure_leaves_memory_unmutated() {
    let session = session(Arc::new(FailingModel::new("rate limited")), config_with_interval(10));
    session
        .insert_fact("water freezes at 0C", None, Default::default())
        .await
        .expect("fact");

    let err = session.handle_message("hi").await.expect_err("model down");
    assert!(matches!(err, EngramCoreError::ModelCall(_)));

    let view = session.memory_view().await;
    assert_eq!(view.stats.total, 1);
    assert_eq!(view.stats.conversation_turns, 0);
}

#[tokio::test(start_paused = true)]
async fn model_timeout_is_a_model_call_error() {
    let model = Arc::new(SlowModel::new("late", std::time::Duration::from_secs(120)));
    let session = session(model, config_with_interval(10));

    let err = session.handle_message("hi").await.expect_err("timeout");
    assert!(matches!(err, EngramCoreError::ModelCall(_)));
    let view = session.memory_view().await;
    assert_eq!(view.stats.total, 0);
}

#[tokio::test]
async fn reflection_appears_every_k_exchanges() {
    let session = session(Arc::new(FixedModel::new("ok")), config_with_interval(2));

    for n in 1..=5u64 {
        session
            .handle_message(&format!("message {n}"))
            .await
            .expect("reply");
        session.await_reflection().await;
        let view = session.memory_view().await;
        let expected = (n / 2) as usize;
        assert_eq!(view.stats.reflections, expected, "after message {n}");
    }
}

#[tokio::test]
async fn reflection_failure_never_blocks_the_reply() {
    // The reply path uses the model before the reflection task does, so a
    // model that fails on the second call only breaks reflection.
    let model = Arc::new(ScriptedModel::new(vec!["reply one"]));
    let session = session(model, config_with_interval(1));

    let reply = session.handle_message("hi").await.expect("reply");
    assert_eq!(reply, "reply one".to_string());
    session.await_reflection().await;

    let view = session.memory_view().await;
    assert_eq!(view.stats.reflections, 0);
    assert_eq!(view.stats.conversation_turns, 2);
}

#[tokio::test]
async fn flush_round_trips_through_snapshot_store() {
    let snapshots = Arc::new(MemorySnapshotStore::new());
    let profile = AgentProfile::new("Ada", "I am a helpful assistant.");
    let agent_id = profile.id;
    let session = AgentSession::new(
        profile,
        Arc::new(FixedModel::new("ok")),
        snapshots.clone(),
        config_with_interval(10),
    );
    session.handle_message("remember me").await.expect("reply");
    session.flush().await.expect("flush");

    let snapshot = snapshots.get(agent_id).expect("snapshot");
    assert_eq!(snapshot.exchange_count, 1);
    assert_eq!(
        snapshot
            .items
            .iter()
            .filter(|item| item.kind == MemoryKind::ConversationTurn)
            .count(),
        2
    );
}

#[tokio::test]
async fn importance_updates_are_visible() {
    let session = session(Arc::new(FixedModel::new("ok")), config_with_interval(10));
    let id = session
        .insert_fact("pinned", Some(0.5), Default::default())
        .await
        .expect("fact");
    session.update_importance(id, 0.4).await.expect("boost");

    let view = session.memory_view().await;
    let item = view.items.iter().find(|item| item.id == id).expect("item");
    assert!((item.importance - 0.9).abs() < 1e-9);
}

/// Snapshot store whose first save blocks until released, for ordering tests.
#[derive(Default)]
struct StallingSnapshotStore {
    entered_first_save: Notify,
    release_first_save: Notify,
    calls: AtomicUsize,
    saved: parking_lot::Mutex<Vec<MemorySnapshot>>,
}

#[async_trait]
impl SnapshotStore for StallingSnapshotStore {
    async fn save(&self, snapshot: &MemorySnapshot) -> Result<(), MemoryError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered_first_save.notify_one();
            self.release_first_save.notified().await;
        }
        self.saved.lock().push(snapshot.clone());
        Ok(())
    }

    async fn load(&self, _agent_id: Uuid) -> Result<Option<MemorySnapshot>, MemoryError> {
        Ok(None)
    }

    async fn delete(&self, _agent_id: Uuid) -> Result<bool, MemoryError> {
        Ok(false)
    }

    async fn list(&self) -> Result<Vec<AgentProfile>, MemoryError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn delayed_flush_never_overwrites_a_newer_snapshot() {
    let snapshots = Arc::new(StallingSnapshotStore::default());
    let session = AgentSession::new(
        AgentProfile::new("Ada", "I am a helpful assistant."),
        Arc::new(FixedModel::new("ok")),
        snapshots.clone(),
        config_with_interval(100),
    );

    // First flush enters the store and stalls mid-save.
    session.handle_message("one").await.expect("reply");
    snapshots.entered_first_save.notified().await;

    // A second exchange completes while the first save is still in flight.
    session.handle_message("two").await.expect("reply");
    snapshots.release_first_save.notify_one();

    session.flush().await.expect("flush");

    let saved = snapshots.saved.lock();
    let last = saved.last().expect("at least one save");
    assert_eq!(last.exchange_count, 2);
    assert_eq!(
        last.items
            .iter()
            .filter(|item| item.kind == MemoryKind::ConversationTurn)
            .count(),
        4
    );
}
