//! Strategy contract
//!
//! Every failure strategy is a uniform transform over a message payload.
//! Strategies run in declared order; a Drop short-circuits the rest of the
//! chain, an Expand fans out, and a Delay accumulates onto whatever delay
//! earlier stages already imposed.

use serde::Serialize;
use std::time::Duration;
use types::ids::SessionId;

/// Which half of the pipeline a message is crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Context handed to every strategy invocation
#[derive(Debug, Clone)]
pub struct FailureContext<'a> {
    pub session_id: &'a SessionId,
    pub direction: Direction,
}

/// Outcome of applying one strategy to one message
#[derive(Debug)]
pub enum Verdict {
    /// Forward the (possibly mutated) message
    Pass(String),
    /// Swallow the message entirely
    Drop,
    /// Replace the message with zero or more messages (duplicate buffers a
    /// copy, reorder releases a permuted batch or holds with an empty set)
    Expand(Vec<String>),
    /// Forward after the given extra delay
    Delay(String, Duration),
}

/// Uniform per-strategy counters, surfaced by the admin endpoint
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StrategyStats {
    pub applied: u64,
    pub dropped: u64,
    pub delayed: u64,
    pub duplicated: u64,
    pub corrupted: u64,
    pub reordered: u64,
}

pub trait FailureStrategy: Send {
    fn name(&self) -> &'static str;

    fn apply(&mut self, message: String, ctx: &FailureContext<'_>) -> Verdict;

    fn stats(&self) -> StrategyStats;

    /// Clear all counters and state
    fn reset(&mut self);

    /// Drop per-session state on disconnect. Strategies whose state must
    /// survive reconnects (silent connection) override this as a no-op.
    fn session_closed(&mut self, _session_id: &SessionId) {}
}
