//! Context assembly under a fixed character budget.

use chrono::{DateTime, Utc};
use engram_config::{ContextConfig, MemoryConfig};
use engram_memory::{
    AgentProfile, MemoryItem, MemoryKind, MemoryScorer, MemoryStore, ScoreWeights,
};
use log::{debug, warn};
use std::collections::HashSet;
use uuid::Uuid;

/// Separator between context sections.
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// The packed context block for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    /// Prompt-ready text; never longer than the configured budget.
    pub text: String,
    /// Set when even the mandatory content had to be cut textually.
    pub truncated: bool,
    /// Ids of the memory items represented in the text.
    pub included: Vec<Uuid>,
}

/// Selects and formats memory items into a bounded context block.
///
/// The persona and the immediately preceding exchange occupy reserved slots;
/// everything else competes for the remaining budget in score order via a
/// greedy fill that skips oversized items but keeps scanning.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    scorer: MemoryScorer,
    budget_chars: usize,
    candidate_pool_size: usize,
}

impl ContextAssembler {
    /// Build an assembler from config sections.
    pub fn new(context: &ContextConfig, memory: &MemoryConfig) -> Self {
        let weights = ScoreWeights {
            overlap: memory.weights.overlap,
            importance: memory.weights.importance,
            recency: memory.weights.recency,
        };
        Self {
            scorer: MemoryScorer::new(weights, memory.recency_half_life_secs),
            budget_chars: context.budget_chars,
            candidate_pool_size: memory.candidate_pool_size,
        }
    }

    /// Assemble the context for one turn. Never fails; when the mandatory
    /// content alone exceeds the budget the text is truncated and flagged.
    pub fn assemble(
        &self,
        profile: &AgentProfile,
        tool_names: &[String],
        store: &MemoryStore,
        query: &str,
        now: DateTime<Utc>,
    ) -> AssembledContext {
        let persona = persona_section(profile, tool_names);
        let exchange = store.last_exchange().unwrap_or_default();
        let mandatory_ids: HashSet<Uuid> = exchange.iter().map(|item| item.id).collect();
        let mut included: Vec<Uuid> = exchange.iter().map(|item| item.id).collect();

        let mut facts: Vec<String> = Vec::new();
        let mut conversation: Vec<String> = exchange.iter().map(turn_line).collect();
        let mut reflections: Vec<String> = Vec::new();

        let mandatory = render(&persona, &facts, &conversation, &reflections);
        if char_len(&mandatory) > self.budget_chars {
            warn!(
                "context budget exceeded by mandatory content (agent_id={}, budget={}, required={})",
                profile.id,
                self.budget_chars,
                char_len(&mandatory)
            );
            return AssembledContext {
                text: truncate_chars(&mandatory, self.budget_chars),
                truncated: true,
                included,
            };
        }

        // Bounded pool of the most recent items; scoring the full history
        // every turn would grow latency with conversation length.
        let start = store.items().len().saturating_sub(self.candidate_pool_size);
        let pool: Vec<MemoryItem> = store.items()[start..]
            .iter()
            .filter(|item| !mandatory_ids.contains(&item.id))
            .cloned()
            .collect();
        let ranked = self.scorer.rank(query, pool, now);

        for item in ranked {
            let line = item_line(&item);
            match item.kind {
                MemoryKind::Fact => facts.push(line),
                MemoryKind::ConversationTurn => conversation.push(line),
                MemoryKind::Reflection => reflections.push(line),
            }
            let length = char_len(&render(&persona, &facts, &conversation, &reflections));
            if length > self.budget_chars {
                // Skip and keep scanning; a smaller item may still fit.
                match item.kind {
                    MemoryKind::Fact => facts.pop(),
                    MemoryKind::ConversationTurn => conversation.pop(),
                    MemoryKind::Reflection => reflections.pop(),
                };
            } else {
                included.push(item.id);
            }
        }

        let text = render(&persona, &facts, &conversation, &reflections);
        debug!(
            "assembled context (agent_id={}, chars={}, items={})",
            profile.id,
            char_len(&text),
            included.len()
        );
        AssembledContext {
            text,
            truncated: false,
            included,
        }
    }
}

/// Render the persona section, listing registered tool names.
fn persona_section(profile: &AgentProfile, tool_names: &[String]) -> String {
    let mut section = format!("## Persona\n\nYou are {}. {}", profile.name, profile.persona);
    if !tool_names.is_empty() {
        section.push_str("\n\nAvailable tools: ");
        section.push_str(&tool_names.join(", "));
    }
    section
}

/// Format a conversation turn with its speaker label.
fn turn_line(item: &MemoryItem) -> String {
    match item.speaker() {
        Some(speaker) => format!("- {speaker}: {}", item.content),
        None => format!("- {}", item.content),
    }
}

/// Format a fact or reflection line.
fn item_line(item: &MemoryItem) -> String {
    if item.kind == MemoryKind::ConversationTurn {
        return turn_line(item);
    }
    format!("- {}", item.content)
}

/// Join non-empty sections in the fixed order: persona, Facts, Recent
/// Conversation, Reflections.
fn render(persona: &str, facts: &[String], conversation: &[String], reflections: &[String]) -> String {
    let mut sections = vec![persona.to_string()];
    if !facts.is_empty() {
        sections.push(format!("## Facts\n\n{}", facts.join("\n")));
    }
    if !conversation.is_empty() {
        sections.push(format!("## Recent Conversation\n\n{}", conversation.join("\n")));
    }
    if !reflections.is_empty() {
        sections.push(format!("## Reflections\n\n{}", reflections.join("\n")));
    }
    sections.join(SECTION_SEPARATOR)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
