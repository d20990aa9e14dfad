//! Relevance scoring for memory items.

use crate::model::MemoryItem;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Relative weights for the three scoring terms.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    /// Weight of lexical overlap between query and content.
    pub overlap: f64,
    /// Weight of the item's importance.
    pub importance: f64,
    /// Weight of the recency decay term.
    pub recency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            overlap: 0.5,
            importance: 0.3,
            recency: 0.2,
        }
    }
}

/// Monotonically non-increasing decay of elapsed seconds, halving every
/// `half_life_secs`. Future timestamps decay as if current.
pub fn recency_decay(elapsed_secs: f64, half_life_secs: u64) -> f64 {
    if half_life_secs == 0 {
        return 1.0;
    }
    let elapsed = elapsed_secs.max(0.0);
    0.5_f64.powf(elapsed / half_life_secs as f64)
}

/// Deterministic scorer combining lexical overlap, importance, and recency.
#[derive(Debug, Clone, Copy)]
pub struct MemoryScorer {
    weights: ScoreWeights,
    half_life_secs: u64,
}

impl MemoryScorer {
    /// Create a scorer with the given weights and recency half-life.
    pub fn new(weights: ScoreWeights, half_life_secs: u64) -> Self {
        Self {
            weights,
            half_life_secs,
        }
    }

    /// Score an item against a query at a fixed instant.
    ///
    /// Identical `(query, item, now)` always yields the identical score. An
    /// empty query degrades the overlap term to zero.
    pub fn score(&self, query: &str, item: &MemoryItem, now: DateTime<Utc>) -> f64 {
        let elapsed = (now - item.created_at).num_milliseconds() as f64 / 1000.0;
        self.weights.overlap * lexical_overlap(query, &item.content)
            + self.weights.importance * item.importance
            + self.weights.recency * recency_decay(elapsed, self.half_life_secs)
    }

    /// Rank items by descending score; ties broken by `created_at`
    /// descending then `id` ascending for full determinism.
    pub fn rank(&self, query: &str, items: Vec<MemoryItem>, now: DateTime<Utc>) -> Vec<MemoryItem> {
        let mut scored: Vec<(f64, MemoryItem)> = items
            .into_iter()
            .map(|item| (self.score(query, &item, now), item))
            .collect();
        scored.sort_by(|(score_a, item_a), (score_b, item_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| item_b.created_at.cmp(&item_a.created_at))
                .then_with(|| item_a.id.cmp(&item_b.id))
        });
        scored.into_iter().map(|(_, item)| item).collect()
    }
}

impl Default for MemoryScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default(), 3600)
    }
}

/// Fraction of distinct lowercase query terms contained in the content.
fn lexical_overlap(query: &str, content: &str) -> f64 {
    let terms: BTreeSet<String> = query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect();
    if terms.is_empty() {
        return 0.0;
    }
    let haystack = content.to_lowercase();
    let matched = terms
        .iter()
        .filter(|term| haystack.contains(term.as_str()))
        .count();
    matched as f64 / terms.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{MemoryScorer, ScoreWeights, lexical_overlap, recency_decay};
    use crate::model::{MemoryItem, MemoryKind};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn item_at(content: &str, importance: f64, age_secs: i64) -> MemoryItem {
        let mut item = MemoryItem::new(MemoryKind::Fact, content).with_importance(importance);
        item.created_at = Utc::now() - Duration::seconds(age_secs);
        item
    }

    #[test]
    fn lexical_overlap_counts_distinct_terms() {
        assert_eq!(lexical_overlap("water freezing", "Water freezes at 0C"), 0.5);
        assert_eq!(lexical_overlap("water Water WATER", "water"), 1.0);
        assert_eq!(lexical_overlap("", "anything"), 0.0);
        assert_eq!(lexical_overlap("quartz", "water"), 0.0);
    }

    #[test]
    fn recency_decay_is_non_increasing() {
        let fresh = recency_decay(0.0, 3600);
        let old = recency_decay(3600.0, 3600);
        let older = recency_decay(7200.0, 3600);
        assert_eq!(fresh, 1.0);
        assert!((old - 0.5).abs() < 1e-9);
        assert!(older < old);
        // Clock skew must not inflate scores.
        assert_eq!(recency_decay(-60.0, 3600), 1.0);
    }

    #[test]
    fn score_is_deterministic() {
        let scorer = MemoryScorer::default();
        let item = item_at("the earth is the third planet", 0.8, 120);
        let now = Utc::now();
        let first = scorer.score("earth planet", &item, now);
        let second = scorer.score("earth planet", &item, now);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_query_still_scores_importance_and_recency() {
        let scorer = MemoryScorer::default();
        let item = item_at("anything", 1.0, 0);
        let score = scorer.score("", &item, Utc::now());
        assert!(score > 0.0);
    }

    #[test]
    fn rank_prefers_overlap_then_importance() {
        let scorer = MemoryScorer::new(ScoreWeights::default(), 3600);
        let relevant = item_at("water freezes at zero", 0.5, 60);
        let important = item_at("unrelated trivia", 1.0, 60);
        let ranked = scorer.rank(
            "water freezes",
            vec![important.clone(), relevant.clone()],
            Utc::now(),
        );
        assert_eq!(ranked[0].id, relevant.id);
        assert_eq!(ranked[1].id, important.id);
    }

    #[test]
    fn ties_break_by_recency_then_id() {
        let now = Utc::now();
        let mut older = item_at("same", 0.5, 100);
        let mut newer = item_at("same", 0.5, 10);
        older.id = Uuid::from_u128(2);
        newer.id = Uuid::from_u128(9);
        let scorer = MemoryScorer::default();

        let ranked = scorer.rank("", vec![older.clone(), newer.clone()], now);
        assert_eq!(ranked[0].id, newer.id);

        // Identical timestamps fall through to ascending id.
        let mut twin_a = older.clone();
        let mut twin_b = older.clone();
        twin_a.id = Uuid::from_u128(7);
        twin_b.id = Uuid::from_u128(3);
        let ranked = scorer.rank("", vec![twin_a, twin_b], now);
        assert_eq!(ranked[0].id, Uuid::from_u128(3));

        // Same ordering on repeated runs.
        let again = scorer.rank("", vec![older, newer], now);
        let ids: Vec<_> = again.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(9), Uuid::from_u128(2)]);
    }
}
