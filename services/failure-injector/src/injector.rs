//! The failure-injection pipeline
//!
//! Two ordered chains of strategies, one per direction. A message walks the
//! chain stage by stage: stage k sees the output of stage k-1, drops
//! short-circuit, expansions fan out and downstream stages are applied
//! independently per resulting message, and delays accumulate alongside each
//! surviving message. The caller decides what to do with the accumulated
//! delay (sleep inline on the inbound path, hand to the scheduler outbound).

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use types::ids::SessionId;

use crate::strategy::{Direction, FailureContext, FailureStrategy, StrategyStats, Verdict};

/// A message that survived the chain, with its accumulated delay
#[derive(Debug)]
pub struct Emission {
    pub payload: String,
    pub delay: Duration,
}

/// Per-strategy counters for the admin endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub strategy: String,
    pub stats: StrategyStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct InjectorStats {
    pub enabled: bool,
    pub inbound: Vec<StrategyReport>,
    pub outbound: Vec<StrategyReport>,
}

pub struct FailureInjector {
    enabled: AtomicBool,
    inbound: Mutex<Vec<Box<dyn FailureStrategy>>>,
    outbound: Mutex<Vec<Box<dyn FailureStrategy>>>,
}

impl FailureInjector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            inbound: Mutex::new(Vec::new()),
            outbound: Mutex::new(Vec::new()),
        }
    }

    pub fn add_inbound(&self, strategy: Box<dyn FailureStrategy>) {
        self.inbound.lock().expect("injector lock").push(strategy);
    }

    pub fn add_outbound(&self, strategy: Box<dyn FailureStrategy>) {
        self.outbound.lock().expect("injector lock").push(strategy);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Run one message through the chain for its direction.
    pub fn process(
        &self,
        direction: Direction,
        session_id: &SessionId,
        payload: String,
    ) -> Vec<Emission> {
        if !self.is_enabled() {
            return vec![Emission {
                payload,
                delay: Duration::ZERO,
            }];
        }

        let chain = match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        };
        let mut chain = chain.lock().expect("injector lock");
        let ctx = FailureContext {
            session_id,
            direction,
        };

        let mut items = vec![Emission {
            payload,
            delay: Duration::ZERO,
        }];
        for strategy in chain.iter_mut() {
            let mut next = Vec::with_capacity(items.len());
            for item in items {
                match strategy.apply(item.payload, &ctx) {
                    Verdict::Pass(payload) => next.push(Emission {
                        payload,
                        delay: item.delay,
                    }),
                    Verdict::Drop => {}
                    Verdict::Expand(batch) => next.extend(batch.into_iter().map(|payload| {
                        Emission {
                            payload,
                            delay: item.delay,
                        }
                    })),
                    Verdict::Delay(payload, extra) => next.push(Emission {
                        payload,
                        delay: item.delay + extra,
                    }),
                }
            }
            items = next;
            if items.is_empty() {
                break;
            }
        }
        items
    }

    /// Notify every strategy that a session's socket closed
    pub fn session_closed(&self, session_id: &SessionId) {
        for chain in [&self.inbound, &self.outbound] {
            for strategy in chain.lock().expect("injector lock").iter_mut() {
                strategy.session_closed(session_id);
            }
        }
    }

    pub fn statistics(&self) -> InjectorStats {
        let report = |chain: &Mutex<Vec<Box<dyn FailureStrategy>>>| {
            chain
                .lock()
                .expect("injector lock")
                .iter()
                .map(|s| StrategyReport {
                    strategy: s.name().to_string(),
                    stats: s.stats(),
                })
                .collect()
        };
        InjectorStats {
            enabled: self.is_enabled(),
            inbound: report(&self.inbound),
            outbound: report(&self.outbound),
        }
    }

    /// Reset every strategy's counters and state
    pub fn reset(&self) {
        for chain in [&self.inbound, &self.outbound] {
            for strategy in chain.lock().expect("injector lock").iter_mut() {
                strategy.reset();
            }
        }
    }
}
