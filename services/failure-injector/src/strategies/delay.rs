//! Explicit uniform delay

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

/// Delays each message by a uniform draw from `[min_ms, max_ms]`. Per-session
/// FIFO is preserved by the caller (inbound delays are slept inline) unless
/// reordering is also enabled.
pub struct DelayStrategy {
    min_ms: u64,
    max_ms: u64,
    rng: ChaCha8Rng,
    stats: StrategyStats,
}

impl DelayStrategy {
    /// # Panics
    /// Panics if `min_ms > max_ms`
    pub fn new(min_ms: u64, max_ms: u64, seed: Option<u64>) -> Self {
        assert!(min_ms <= max_ms, "min_ms must not exceed max_ms");
        Self {
            min_ms,
            max_ms,
            rng: super::seeded_rng(seed, 2),
            stats: StrategyStats::default(),
        }
    }
}

impl FailureStrategy for DelayStrategy {
    fn name(&self) -> &'static str {
        "delay_messages"
    }

    fn apply(&mut self, message: String, _ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        self.stats.delayed += 1;
        let millis = self.rng.gen_range(self.min_ms..=self.max_ms);
        Verdict::Delay(message, Duration::from_millis(millis))
    }

    fn stats(&self) -> StrategyStats {
        self.stats
    }

    fn reset(&mut self) {
        self.stats = StrategyStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Direction;
    use types::ids::SessionId;

    #[test]
    fn delay_stays_in_bounds() {
        let session = SessionId::new("s");
        let ctx = FailureContext {
            session_id: &session,
            direction: Direction::Inbound,
        };
        let mut strategy = DelayStrategy::new(100, 2_000, Some(5));
        for _ in 0..1_000 {
            match strategy.apply("m".into(), &ctx) {
                Verdict::Delay(_, duration) => {
                    assert!(duration >= Duration::from_millis(100));
                    assert!(duration <= Duration::from_millis(2_000));
                }
                other => panic!("expected delay verdict, got {other:?}"),
            }
        }
        assert_eq!(strategy.stats().delayed, 1_000);
    }
}
