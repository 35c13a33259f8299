//! Silent connection
//!
//! After `after_messages` outbound deliveries on a session, every further
//! outbound message for that session is swallowed. Inbound still flows and
//! the socket stays open; the client sees a connection that simply went
//! quiet. Counters are keyed by session ID and survive reconnects unless
//! configured otherwise.

use dashmap::DashMap;
use types::ids::SessionId;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

pub struct SilentConnectionStrategy {
    after_messages: u64,
    reset_on_reconnect: bool,
    counters: DashMap<SessionId, u64>,
    stats: StrategyStats,
}

impl SilentConnectionStrategy {
    pub fn new(after_messages: u64, reset_on_reconnect: bool) -> Self {
        Self {
            after_messages,
            reset_on_reconnect,
            counters: DashMap::new(),
            stats: StrategyStats::default(),
        }
    }

    /// Messages seen so far for a session (delivered + swallowed)
    pub fn message_count(&self, session_id: &SessionId) -> u64 {
        self.counters.get(session_id).map(|c| *c).unwrap_or(0)
    }
}

impl FailureStrategy for SilentConnectionStrategy {
    fn name(&self) -> &'static str {
        "silent_connection"
    }

    fn apply(&mut self, message: String, ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        let mut count = self.counters.entry(ctx.session_id.clone()).or_insert(0);
        *count += 1;
        if *count > self.after_messages {
            self.stats.dropped += 1;
            Verdict::Drop
        } else {
            Verdict::Pass(message)
        }
    }

    fn stats(&self) -> StrategyStats {
        self.stats
    }

    fn reset(&mut self) {
        self.counters.clear();
        self.stats = StrategyStats::default();
    }

    fn session_closed(&mut self, session_id: &SessionId) {
        if self.reset_on_reconnect {
            self.counters.remove(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Direction;

    fn ctx(session: &SessionId) -> FailureContext<'_> {
        FailureContext {
            session_id: session,
            direction: Direction::Outbound,
        }
    }

    #[test]
    fn goes_silent_after_threshold() {
        let session = SessionId::new("s");
        let mut strategy = SilentConnectionStrategy::new(3, false);

        for i in 0..3 {
            assert!(
                matches!(strategy.apply(format!("m{i}"), &ctx(&session)), Verdict::Pass(_)),
                "message {i} should pass"
            );
        }
        for i in 3..6 {
            assert!(
                matches!(strategy.apply(format!("m{i}"), &ctx(&session)), Verdict::Drop),
                "message {i} should be swallowed"
            );
        }
        assert_eq!(strategy.stats().dropped, 3);
        assert_eq!(strategy.message_count(&session), 6);
    }

    #[test]
    fn zero_threshold_silences_immediately() {
        let session = SessionId::new("s");
        let mut strategy = SilentConnectionStrategy::new(0, false);
        assert!(matches!(strategy.apply("m".into(), &ctx(&session)), Verdict::Drop));
    }

    #[test]
    fn one_sessions_silence_leaves_others_loud() {
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        let mut strategy = SilentConnectionStrategy::new(1, false);

        assert!(matches!(strategy.apply("m".into(), &ctx(&a)), Verdict::Pass(_)));
        assert!(matches!(strategy.apply("m".into(), &ctx(&a)), Verdict::Drop));
        // Session b is unaffected by a's silence
        assert!(matches!(strategy.apply("m".into(), &ctx(&b)), Verdict::Pass(_)));
    }

    #[test]
    fn counter_survives_reconnect_by_default() {
        let session = SessionId::new("s");
        let mut strategy = SilentConnectionStrategy::new(1, false);
        strategy.apply("m".into(), &ctx(&session));
        strategy.session_closed(&session);
        assert!(matches!(strategy.apply("m".into(), &ctx(&session)), Verdict::Drop));
    }

    #[test]
    fn counter_resets_when_configured() {
        let session = SessionId::new("s");
        let mut strategy = SilentConnectionStrategy::new(1, true);
        strategy.apply("m".into(), &ctx(&session));
        strategy.session_closed(&session);
        assert!(matches!(strategy.apply("m".into(), &ctx(&session)), Verdict::Pass(_)));
    }
}
