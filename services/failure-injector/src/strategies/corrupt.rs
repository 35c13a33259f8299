//! Payload corruption
//!
//! With probability `p`, rewrites a fraction of the payload's bytes with
//! random printable ASCII. Handlers are expected to reject the result
//! gracefully; a corrupted frame that still parses is fair game too.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

pub struct CorruptStrategy {
    probability: f64,
    /// Fraction of bytes to rewrite, (0, 1]
    corruption_level: f64,
    rng: ChaCha8Rng,
    stats: StrategyStats,
}

impl CorruptStrategy {
    /// # Panics
    /// Panics unless `probability` is within `[0, 1]` and
    /// `corruption_level` is within `(0, 1]`
    pub fn new(probability: f64, corruption_level: f64, seed: Option<u64>) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "corrupt probability must be within [0, 1]"
        );
        assert!(
            corruption_level > 0.0 && corruption_level <= 1.0,
            "corruption level must be within (0, 1]"
        );
        Self {
            probability,
            corruption_level,
            rng: super::seeded_rng(seed, 6),
            stats: StrategyStats::default(),
        }
    }

    fn corrupt(&mut self, message: String) -> String {
        if message.is_empty() {
            return message;
        }
        let mut bytes = message.into_bytes();
        let mutations = ((bytes.len() as f64 * self.corruption_level) as usize).max(1);
        for _ in 0..mutations {
            let position = self.rng.gen_range(0..bytes.len());
            bytes[position] = self.rng.gen_range(33..=126u8);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl FailureStrategy for CorruptStrategy {
    fn name(&self) -> &'static str {
        "corrupt"
    }

    fn apply(&mut self, message: String, _ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        if self.rng.gen_bool(self.probability) {
            self.stats.corrupted += 1;
            Verdict::Pass(self.corrupt(message))
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
