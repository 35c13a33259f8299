//! Inbound token-bucket throttle
//!
//! One bucket per session. When a message arrives with no token available it
//! is not dropped but paced: the verdict carries the wait until the bucket
//! would have refilled. The balance may go negative so that a sustained
//! burst is spread out at the configured rate.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use types::ids::SessionId;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct ThrottleStrategy {
    max_per_second: f64,
    buckets: HashMap<SessionId, Bucket>,
    stats: StrategyStats,
}

impl ThrottleStrategy {
    /// # Panics
    /// Panics if `max_per_second` is zero
    pub fn new(max_per_second: u32) -> Self {
        assert!(max_per_second >= 1, "throttle rate must be at least 1/s");
        Self {
            max_per_second: max_per_second as f64,
            buckets: HashMap::new(),
            stats: StrategyStats::default(),
        }
    }
}

impl FailureStrategy for ThrottleStrategy {
    fn name(&self) -> &'static str {
        "throttle"
    }

    fn apply(&mut self, message: String, ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        let now = Instant::now();
        let rate = self.max_per_second;
        let bucket = self
            .buckets
            .entry(ctx.session_id.clone())
            .or_insert_with(|| Bucket {
                tokens: rate,
                last_refill: now,
            });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(rate);
        bucket.last_refill = now;

        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            Verdict::Pass(message)
        } else {
            self.stats.delayed += 1;
            let wait = -bucket.tokens / rate;
            Verdict::Delay(message, Duration::from_secs_f64(wait))
        }
    }

    fn stats(&self) -> StrategyStats {
        self.stats
    }

    fn reset(&mut self) {
        self.buckets.clear();
        self.stats = StrategyStats::default();
    }

    fn session_closed(&mut self, session_id: &SessionId) {
        self.buckets.remove(session_id);
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
    fn burst_within_capacity_passes() {
        let session = SessionId::new("s");
        let mut strategy = ThrottleStrategy::new(10);
        for _ in 0..10 {
            assert!(matches!(
                strategy.apply("m".into(), &ctx(&session)),
                Verdict::Pass(_)
            ));
        }
    }

    #[test]
    fn excess_burst_is_paced_not_dropped() {
        let session = SessionId::new("s");
        let mut strategy = ThrottleStrategy::new(10);
        for _ in 0..10 {
            strategy.apply("m".into(), &ctx(&session));
        }
        // Pacing grows roughly linearly with the backlog
        let mut last_wait = Duration::ZERO;
        for _ in 0..5 {
            match strategy.apply("m".into(), &ctx(&session)) {
                Verdict::Delay(_, wait) => {
                    assert!(wait > last_wait);
                    last_wait = wait;
                }
                other => panic!("expected pacing delay, got {other:?}"),
            }
        }
        assert_eq!(strategy.stats().delayed, 5);
    }

    #[test]
    fn sessions_have_independent_buckets() {
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        let mut strategy = ThrottleStrategy::new(2);
        strategy.apply("m".into(), &ctx(&a));
        strategy.apply("m".into(), &ctx(&a));
        strategy.apply("m".into(), &ctx(&a));
        // Session b still has a full bucket
        assert!(matches!(strategy.apply("m".into(), &ctx(&b)), Verdict::Pass(_)));
    }
}
