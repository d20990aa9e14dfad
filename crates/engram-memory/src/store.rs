//! Per-agent memory store with insertion-ordered items and id lookup.

use crate::error::MemoryError;
use crate::model::{MemoryItem, MemoryKind};
use crate::score::recency_decay;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Ordering for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOrder {
    /// Order items as they were inserted.
    #[default]
    Insertion,
    /// Order items newest-first by creation time.
    Recency,
}

/// Filter for [`MemoryStore::query`].
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    /// Restrict to one kind.
    pub kind: Option<MemoryKind>,
    /// Restrict to items created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Keep at most this many of the most recent matches.
    pub limit: Option<usize>,
    /// Result ordering.
    pub order: QueryOrder,
}

impl MemoryQuery {
    /// Query matching every item in insertion order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict the query to one kind.
    pub fn kind(mut self, kind: MemoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict the query to items created at or after `since`.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Keep at most `limit` of the most recent matches.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Request newest-first ordering.
    pub fn order(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }
}

/// Append-only collection of memory items for one agent.
///
/// Items are removed only through explicit eviction; mutation is limited to
/// `importance` and `metadata`. All writes are visible to the next read.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Vec<MemoryItem>,
    index: HashMap<Uuid, usize>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from snapshot items, preserving their order.
    pub fn from_items(items: Vec<MemoryItem>) -> Result<Self, MemoryError> {
        let mut store = Self::new();
        for item in items {
            store.add(item)?;
        }
        Ok(store)
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[MemoryItem] {
        &self.items
    }

    /// Insert an item, returning its id.
    pub fn add(&mut self, item: MemoryItem) -> Result<Uuid, MemoryError> {
        if self.index.contains_key(&item.id) {
            return Err(MemoryError::DuplicateId(item.id));
        }
        let id = item.id;
        debug!(
            "adding memory item (id={}, kind={}, content_len={})",
            id,
            item.kind.as_str(),
            item.content.len()
        );
        self.index.insert(id, self.items.len());
        self.items.push(item);
        Ok(id)
    }

    /// Fetch an item by id.
    pub fn get(&self, id: Uuid) -> Option<&MemoryItem> {
        self.index.get(&id).map(|position| &self.items[*position])
    }

    /// Return items matching the query.
    pub fn query(&self, query: &MemoryQuery) -> Vec<MemoryItem> {
        let mut matches: Vec<MemoryItem> = self
            .items
            .iter()
            .filter(|item| query.kind.is_none_or(|kind| item.kind == kind))
            .filter(|item| query.since.is_none_or(|since| item.created_at >= since))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            let start = matches.len().saturating_sub(limit);
            matches.drain(..start);
        }
        if query.order == QueryOrder::Recency {
            matches.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        matches
    }

    /// Adjust an item's importance by `delta`, clamped to [0, 1].
    pub fn update_importance(&mut self, id: Uuid, delta: f64) -> Result<(), MemoryError> {
        let position = *self.index.get(&id).ok_or(MemoryError::NotFound(id))?;
        let item = &mut self.items[position];
        item.importance = (item.importance + delta).clamp(0.0, 1.0);
        Ok(())
    }

    /// Remove items matching the predicate, returning how many were removed.
    pub fn evict(&mut self, predicate: impl Fn(&MemoryItem) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        let removed = before - self.items.len();
        if removed > 0 {
            self.reindex();
            info!("evicted memory items (removed={}, remaining={})", removed, self.items.len());
        }
        removed
    }

    /// Capacity eviction: while the store exceeds `cap`, remove the item with
    /// the lowest `importance + recency-decay` rank. The most recent
    /// `protect_recent_turns` conversation turns are never removed.
    pub fn evict_to_cap(
        &mut self,
        cap: usize,
        protect_recent_turns: usize,
        half_life_secs: u64,
        now: DateTime<Utc>,
    ) -> usize {
        if self.items.len() <= cap {
            return 0;
        }
        let protected = self.recent_turn_ids(protect_recent_turns);
        let mut ranked: Vec<(f64, Uuid)> = self
            .items
            .iter()
            .filter(|item| !protected.contains(&item.id))
            .map(|item| {
                let elapsed = (now - item.created_at).num_milliseconds() as f64 / 1000.0;
                (
                    item.importance + recency_decay(elapsed, half_life_secs),
                    item.id,
                )
            })
            .collect();
        ranked.sort_by(|(rank_a, id_a), (rank_b, id_b)| {
            rank_a
                .partial_cmp(rank_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        });

        let excess = self.items.len() - cap;
        let doomed: HashSet<Uuid> = ranked
            .into_iter()
            .take(excess)
            .map(|(_, id)| id)
            .collect();
        self.evict(|item| doomed.contains(&item.id))
    }

    /// The turns of the most recent exchange, in insertion order.
    pub fn last_exchange(&self) -> Option<Vec<MemoryItem>> {
        let exchange = self
            .items
            .iter()
            .rev()
            .find(|item| item.kind == MemoryKind::ConversationTurn)
            .and_then(MemoryItem::exchange_id)?;
        let turns: Vec<MemoryItem> = self
            .items
            .iter()
            .filter(|item| item.exchange_id() == Some(exchange))
            .cloned()
            .collect();
        Some(turns)
    }

    /// Ids of the newest `count` conversation turns.
    fn recent_turn_ids(&self, count: usize) -> HashSet<Uuid> {
        self.items
            .iter()
            .rev()
            .filter(|item| item.kind == MemoryKind::ConversationTurn)
            .take(count)
            .map(|item| item.id)
            .collect()
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect();
    }
}
