//! Buffered reordering
//!
//! Holds up to `window_size` messages per session, then releases the batch
//! in a random permutation. A hold timeout bounds how long a quiet session's
//! messages can sit in the buffer: the next arrival after the deadline
//! flushes everything. Buffers are per-session so one client's messages can
//! never surface on another client's stream.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use types::ids::SessionId;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

struct Buffer {
    messages: Vec<String>,
    oldest: Instant,
}

pub struct ReorderStrategy {
    window_size: usize,
    max_hold: Duration,
    buffers: HashMap<SessionId, Buffer>,
    rng: ChaCha8Rng,
    stats: StrategyStats,
}

impl ReorderStrategy {
    /// # Panics
    /// Panics if `window_size < 2`
    pub fn new(window_size: usize, max_hold: Duration, seed: Option<u64>) -> Self {
        assert!(window_size >= 2, "reorder window must hold at least 2 messages");
        Self {
            window_size,
            max_hold,
            buffers: HashMap::new(),
            rng: super::seeded_rng(seed, 5),
            stats: StrategyStats::default(),
        }
    }

    fn release(&mut self, session_id: &SessionId) -> Vec<String> {
        let Some(buffer) = self.buffers.remove(session_id) else {
            return Vec::new();
        };
        let mut batch = buffer.messages;
        let original = batch.clone();
        batch.shuffle(&mut self.rng);
        if batch != original {
            self.stats.reordered += 1;
        }
        batch
    }
}

impl FailureStrategy for ReorderStrategy {
    fn name(&self) -> &'static str {
        "reorder"
    }

    fn apply(&mut self, message: String, ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        let now = Instant::now();

        let buffer = self
            .buffers
            .entry(ctx.session_id.clone())
            .or_insert_with(|| Buffer {
                messages: Vec::new(),
                oldest: now,
            });
        buffer.messages.push(message);

        let full = buffer.messages.len() >= self.window_size;
        let expired = now.duration_since(buffer.oldest) >= self.max_hold;
        if full || expired {
            Verdict::Expand(self.release(ctx.session_id))
        } else {
            // Held: nothing leaves the stage this round
            Verdict::Expand(Vec::new())
        }
    }

    fn stats(&self) -> StrategyStats {
        self.stats
    }

    fn reset(&mut self) {
        self.buffers.clear();
        self.stats = StrategyStats::default();
    }

    fn session_closed(&mut self, session_id: &SessionId) {
        // Pending entries for a disconnected session are discarded
        self.buffers.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Direction;

    fn ctx(session: &SessionId) -> FailureContext<'_> {
        FailureContext {
            session_id: session,
            direction: Direction::Inbound,
        }
    }

    #[test]
    fn holds_until_window_fills_then_releases_all() {
        let session = SessionId::new("s");
        let mut strategy = ReorderStrategy::new(3, Duration::from_secs(60), Some(2));

        for i in 0..2 {
            match strategy.apply(format!("m{i}"), &ctx(&session)) {
                Verdict::Expand(batch) => assert!(batch.is_empty()),
                other => panic!("expected hold, got {other:?}"),
            }
        }
        match strategy.apply("m2".into(), &ctx(&session)) {
            Verdict::Expand(batch) => {
                assert_eq!(batch.len(), 3);
                let mut sorted = batch.clone();
                sorted.sort();
                assert_eq!(sorted, vec!["m0", "m1", "m2"]);
            }
            other => panic!("expected release, got {other:?}"),
        }
    }

    #[test]
    fn sessions_do_not_share_buffers() {
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        let mut strategy = ReorderStrategy::new(2, Duration::from_secs(60), Some(2));

        strategy.apply("a0".into(), &ctx(&a));
        strategy.apply("b0".into(), &ctx(&b));
        match strategy.apply("a1".into(), &ctx(&a)) {
            Verdict::Expand(batch) => {
                assert_eq!(batch.len(), 2);
                assert!(batch.iter().all(|m| m.starts_with('a')));
            }
            other => panic!("expected release, got {other:?}"),
        }
    }

    #[test]
    fn disconnect_discards_buffered_messages() {
        let session = SessionId::new("s");
        let mut strategy = ReorderStrategy::new(3, Duration::from_secs(60), Some(2));
        strategy.apply("m0".into(), &ctx(&session));
        strategy.session_closed(&session);

        // A fresh message starts a fresh buffer of one
        match strategy.apply("m1".into(), &ctx(&session)) {
            Verdict::Expand(batch) => assert!(batch.is_empty()),
            other => panic!("expected hold, got {other:?}"),
        }
    }

    #[test]
    fn expired_hold_flushes_on_next_arrival() {
        let session = SessionId::new("s");
        let mut strategy = ReorderStrategy::new(10, Duration::ZERO, Some(2));
        match strategy.apply("m0".into(), &ctx(&session)) {
            Verdict::Expand(batch) => assert_eq!(batch.len(), 1),
            other => panic!("expected flush, got {other:?}"),
        }
    }
}
