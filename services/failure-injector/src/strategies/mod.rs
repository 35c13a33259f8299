//! The built-in failure strategies
//!
//! Each strategy is independently toggleable from config; the gateway
//! assembles the enabled ones into inbound/outbound chains in the declared
//! order.

pub mod corrupt;
pub mod delay;
pub mod drop;
pub mod duplicate;
pub mod latency;
pub mod reorder;
pub mod silent;
pub mod throttle;

pub use corrupt::CorruptStrategy;
pub use delay::DelayStrategy;
pub use drop::DropStrategy;
pub use duplicate::DuplicateStrategy;
pub use latency::LatencyLinkStrategy;
pub use reorder::ReorderStrategy;
pub use silent::SilentConnectionStrategy;
pub use throttle::ThrottleStrategy;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic when a seed is configured, entropy otherwise. The stream
/// offset keeps strategies from sharing one sequence.
pub(crate) fn seeded_rng(seed: Option<u64>, stream: u64) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(stream)),
        None => ChaCha8Rng::from_entropy(),
    }
}
