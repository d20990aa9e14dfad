//! End-to-end context assembly scenarios.

use chrono::{Duration, Utc};
use engram_config::{ContextConfig, EngramConfig};
use engram_core::{AgentSession, ContextAssembler};
use engram_memory::model::{EXCHANGE_KEY, SPEAKER_KEY};
use engram_memory::{AgentProfile, MemoryItem, MemoryKind, MemorySnapshot, MemoryStore};
use engram_test_utils::{MemorySnapshotStore, RecordingModel};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn turn(content: &str, speaker: &str, exchange: Uuid, age_secs: i64) -> MemoryItem {
    let mut item = MemoryItem::new(MemoryKind::ConversationTurn, content)
        .with_metadata(EXCHANGE_KEY, json!(exchange.to_string()))
        .with_metadata(SPEAKER_KEY, json!(speaker));
    item.created_at = Utc::now() - Duration::seconds(age_secs);
    item
}

/// One fact, one (long) reflection, and one prior exchange.
fn seeded_snapshot() -> MemorySnapshot {
    let exchange = Uuid::new_v4();
    let mut fact = MemoryItem::new(MemoryKind::Fact, "the user's favorite subject is astronomy")
        .with_importance(1.0);
    fact.created_at = Utc::now() - Duration::minutes(10);
    let mut reflection = MemoryItem::new(
        MemoryKind::Reflection,
        "the user keeps returning to night-sky questions and may be planning a telescope \
         purchase; they previously asked about lenses, mounts, tripods, star charts, and \
         which constellations are visible in winter from the northern hemisphere"
            .repeat(2),
    )
    .with_importance(0.6);
    reflection.created_at = Utc::now() - Duration::minutes(5);

    MemorySnapshot {
        agent: AgentProfile::new("Helper", "I am a helpful assistant."),
        items: vec![
            fact,
            reflection,
            turn("tell me about stars", "user", exchange, 60),
            turn("stars are giant balls of plasma", "agent", exchange, 55),
        ],
        exchange_count: 1,
    }
}

fn session_with_budget(budget_chars: usize, model: Arc<RecordingModel>) -> AgentSession {
    let config = EngramConfig::builder()
        .context(ContextConfig { budget_chars })
        .build();
    AgentSession::from_snapshot(
        seeded_snapshot(),
        model,
        Arc::new(MemorySnapshotStore::new()),
        config,
    )
    .expect("session")
}

#[tokio::test]
async fn tight_budget_keeps_persona_prior_turn_and_fact() {
    let model = Arc::new(RecordingModel::new("ok"));
    let session = session_with_budget(500, model.clone());

    session
        .handle_message("what do you know about astronomy?")
        .await
        .expect("reply");

    let requests = model.requests();
    let system = &requests[0].system;
    assert!(system.chars().count() <= 500);
    assert!(system.contains("I am a helpful assistant."));
    assert!(system.contains("user: tell me about stars"));
    assert!(system.contains("agent: stars are giant balls of plasma"));
    assert!(system.contains("favorite subject is astronomy"));
    // The reflection scored below the fact and no longer fits.
    assert!(!system.contains("telescope"));
}

#[tokio::test]
async fn generous_budget_includes_every_section() {
    let model = Arc::new(RecordingModel::new("ok"));
    let session = session_with_budget(4000, model.clone());

    session
        .handle_message("what do you know about astronomy?")
        .await
        .expect("reply");

    let system = &model.requests()[0].system;
    assert!(system.contains("## Facts"));
    assert!(system.contains("## Recent Conversation"));
    assert!(system.contains("## Reflections"));
    assert!(system.contains("telescope"));
}

#[tokio::test]
async fn assembled_length_is_bounded_for_any_budget() {
    let snapshot = seeded_snapshot();
    let store = MemoryStore::from_items(snapshot.items).expect("store");
    let config = EngramConfig::default();

    for budget in (40..=800).step_by(40) {
        let assembler = ContextAssembler::new(
            &ContextConfig {
                budget_chars: budget,
            },
            &config.memory,
        );
        let context = assembler.assemble(
            &snapshot.agent,
            &[],
            &store,
            "what do you know about astronomy?",
            Utc::now(),
        );
        assert!(
            context.text.chars().count() <= budget,
            "budget {budget} exceeded"
        );
    }
}
