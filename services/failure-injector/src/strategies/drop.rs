//! Probabilistic message loss

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

/// Drops each message independently with probability `p`.
pub struct DropStrategy {
    probability: f64,
    rng: ChaCha8Rng,
    stats: StrategyStats,
}

impl DropStrategy {
    /// # Panics
    /// Panics unless `probability` is within `[0, 1]`
    pub fn new(probability: f64, seed: Option<u64>) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "drop probability must be within [0, 1]"
        );
        Self {
            probability,
            rng: super::seeded_rng(seed, 1),
            stats: StrategyStats::default(),
        }
    }
}

impl FailureStrategy for DropStrategy {
    fn name(&self) -> &'static str {
        "drop_messages"
    }

    fn apply(&mut self, message: String, _ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        if self.rng.gen_bool(self.probability) {
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
        self.stats = StrategyStats::default();
    }
}
