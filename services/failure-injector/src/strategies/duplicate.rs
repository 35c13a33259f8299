//! Probabilistic duplication

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

/// With probability `p`, emits 1..=`max_duplicates` extra copies of the
/// message. Downstream stages treat each copy independently.
pub struct DuplicateStrategy {
    probability: f64,
    max_duplicates: u32,
    rng: ChaCha8Rng,
    stats: StrategyStats,
}

impl DuplicateStrategy {
    /// # Panics
    /// Panics unless `probability` is within `[0, 1]` and `max_duplicates > 0`
    pub fn new(probability: f64, max_duplicates: u32, seed: Option<u64>) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "duplicate probability must be within [0, 1]"
        );
        assert!(max_duplicates >= 1, "max_duplicates must be at least 1");
        Self {
            probability,
            max_duplicates,
            rng: super::seeded_rng(seed, 4),
            stats: StrategyStats::default(),
        }
    }
}

impl FailureStrategy for DuplicateStrategy {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    fn apply(&mut self, message: String, _ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        if self.rng.gen_bool(self.probability) {
            let copies = self.rng.gen_range(1..=self.max_duplicates) as usize;
            self.stats.duplicated += copies as u64;
            let batch = vec![message; copies + 1];
            Verdict::Expand(batch)
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
