//! Failure-injection crate
//!
//! Everything that makes the simulator hostile on purpose: the strategy
//! chain that transforms or drops messages in flight, the REST rate limiter
//! with escalating penalties, and the scheduler that delivers delayed
//! messages. Injected drops and corruptions are the product, not errors.

pub mod injector;
pub mod rate_limit;
pub mod scheduler;
pub mod strategies;
pub mod strategy;

pub use injector::{Emission, FailureInjector, InjectorStats};
pub use rate_limit::{RateDecision, RateLimitConfig, RestRateLimiter};
pub use scheduler::{DeliveryScheduler, ScheduledDelivery};
pub use strategy::{Direction, FailureContext, FailureStrategy, StrategyStats, Verdict};
