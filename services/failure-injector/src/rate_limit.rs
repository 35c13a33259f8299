//! REST rate limiting with escalating penalties
//!
//! Sliding one-second window per session over a baseline budget. Breaching
//! the budget opens a penalty: 10 s mandatory wait on the first violation,
//! a 60 s ban on the second within the violation window, and a permanent
//! ban on the third. Requests made while a penalty is open are refused with
//! the remaining Retry-After but do not escalate further; the next breach
//! after the penalty expires does.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use types::ids::SessionId;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests allowed per sliding second
    pub baseline_rps: u32,
    /// First-violation mandatory wait
    pub wait_secs: u64,
    /// Second-violation ban length
    pub ban_secs: u64,
    /// Window within which violations escalate
    pub violation_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            baseline_rps: 10,
            wait_secs: 10,
            ban_secs: 60,
            violation_window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited {
        /// Seconds until retry; None for a permanent ban
        retry_after: Option<u64>,
        violation_count: u32,
    },
}

#[derive(Debug, Clone, Copy)]
enum Penalty {
    None,
    Until(Instant),
    Permanent,
}

#[derive(Debug)]
struct SessionLimitState {
    /// Request timestamps inside the sliding second
    window: VecDeque<Instant>,
    /// Violation instants inside the escalation window
    violations: VecDeque<Instant>,
    /// Total violations ever; non-decreasing
    violation_count: u32,
    penalty: Penalty,
}

impl SessionLimitState {
    fn new() -> Self {
        Self {
            window: VecDeque::new(),
            violations: VecDeque::new(),
            violation_count: 0,
            penalty: Penalty::None,
        }
    }
}

pub struct RestRateLimiter {
    config: RateLimitConfig,
    sessions: DashMap<SessionId, SessionLimitState>,
}

impl RestRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    pub fn check(&self, session_id: &SessionId) -> RateDecision {
        self.check_at(session_id, Instant::now())
    }

    /// Core decision with an explicit clock, so tests can drive time
    pub fn check_at(&self, session_id: &SessionId, now: Instant) -> RateDecision {
        let mut state = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(SessionLimitState::new);

        match state.penalty {
            Penalty::Permanent => {
                return RateDecision::Limited {
                    retry_after: None,
                    violation_count: state.violation_count,
                };
            }
            Penalty::Until(until) if now < until => {
                let remaining = until.duration_since(now).as_secs_f64().ceil() as u64;
                return RateDecision::Limited {
                    retry_after: Some(remaining.max(1)),
                    violation_count: state.violation_count,
                };
            }
            Penalty::Until(_) => {
                state.penalty = Penalty::None;
            }
            Penalty::None => {}
        }

        // Slide the one-second request window
        let second = Duration::from_secs(1);
        while state
            .window
            .front()
            .is_some_and(|t| now.duration_since(*t) >= second)
        {
            state.window.pop_front();
        }

        if (state.window.len() as u32) < self.config.baseline_rps {
            state.window.push_back(now);
            return RateDecision::Allowed;
        }

        // Budget breached: open a new violation and escalate
        let escalation_window = Duration::from_secs(self.config.violation_window_secs);
        while state
            .violations
            .front()
            .is_some_and(|t| now.duration_since(*t) >= escalation_window)
        {
            state.violations.pop_front();
        }
        state.violations.push_back(now);
        state.violation_count += 1;

        let (penalty, retry_after) = match state.violations.len() {
            1 => (
                Penalty::Until(now + Duration::from_secs(self.config.wait_secs)),
                Some(self.config.wait_secs),
            ),
            2 => (
                Penalty::Until(now + Duration::from_secs(self.config.ban_secs)),
                Some(self.config.ban_secs),
            ),
            _ => (Penalty::Permanent, None),
        };
        state.penalty = penalty;

        RateDecision::Limited {
            retry_after,
            violation_count: state.violation_count,
        }
    }

    pub fn violation_count(&self, session_id: &SessionId) -> u32 {
        self.sessions
            .get(session_id)
            .map(|s| s.violation_count)
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.sessions.clear();
    }
}
