//! Log-normal link latency
//!
//! Models the network link itself: each message pays `exp(mu + sigma * Z)`
//! milliseconds, `Z ~ N(0, 1)`. Distinct from the explicit uniform delay;
//! this one runs on both directions and is also sampled for REST requests.

use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::time::Duration;

use crate::strategy::{FailureContext, FailureStrategy, StrategyStats, Verdict};

pub struct LatencyLinkStrategy {
    mu: f64,
    sigma: f64,
    rng: ChaCha8Rng,
    stats: StrategyStats,
}

impl LatencyLinkStrategy {
    pub fn new(mu: f64, sigma: f64, seed: Option<u64>) -> Self {
        Self {
            mu,
            sigma,
            rng: super::seeded_rng(seed, 3),
            stats: StrategyStats::default(),
        }
    }

    /// Stable link: EV around 46 ms
    pub fn stable(seed: Option<u64>) -> Self {
        Self::new(3.8, 0.2, seed)
    }

    /// Typical internet path: EV around 155 ms
    pub fn typical(seed: Option<u64>) -> Self {
        Self::new(5.0, 0.3, seed)
    }

    /// One draw from the latency distribution
    pub fn sample_delay(&mut self) -> Duration {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        let millis = (self.mu + self.sigma * z).exp();
        Duration::from_micros((millis * 1_000.0) as u64)
    }
}

impl FailureStrategy for LatencyLinkStrategy {
    fn name(&self) -> &'static str {
        "latency_link"
    }

    fn apply(&mut self, message: String, _ctx: &FailureContext<'_>) -> Verdict {
        self.stats.applied += 1;
        self.stats.delayed += 1;
        let delay = self.sample_delay();
        Verdict::Delay(message, delay)
    }

    fn stats(&self) -> StrategyStats {
        self.stats
    }

    fn reset(&mut self) {
        self.stats = StrategyStats::default();
    }
}
