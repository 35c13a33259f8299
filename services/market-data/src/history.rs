//! Rolling price history
//!
//! Bounded per-symbol window of published ticks, time-ordered. This is the
//! canonical backfill source: a client that saw a sequence gap on the stream
//! reconciles against `GET /api/v1/prices`, which reads from here.

use std::collections::VecDeque;

use crate::feed::MarketTick;

/// Default query page size and its hard ceiling
pub const DEFAULT_QUERY_LIMIT: usize = 500;
pub const MAX_QUERY_LIMIT: usize = 10_000;

#[derive(Debug)]
pub struct PriceHistory {
    entries: VecDeque<MarketTick>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(MAX_QUERY_LIMIT)),
            capacity,
        }
    }

    /// Append a tick, evicting the oldest entry once full
    pub fn push(&mut self, tick: MarketTick) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(tick);
    }

    /// Ticks within `[start, end]` (either bound optional), oldest first,
    /// truncated to `limit` (clamped to the query ceiling).
    pub fn range(&self, start: Option<i64>, end: Option<i64>, limit: Option<usize>) -> Vec<MarketTick> {
        let limit = limit.unwrap_or(DEFAULT_QUERY_LIMIT).min(MAX_QUERY_LIMIT);
        self.entries
            .iter()
            .filter(|t| start.map_or(true, |s| t.timestamp >= s))
            .filter(|t| end.map_or(true, |e| t.timestamp <= e))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&MarketTick> {
        self.entries.back()
    }
}
