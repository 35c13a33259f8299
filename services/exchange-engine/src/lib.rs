//! Exchange engine crate
//!
//! Price-time-priority matching with atomic balance reservation and
//! settlement. The engine owns the order books, the account ledger, and the
//! order store; callers hold it behind a single mutex so that matching is a
//! total order.

pub mod accounts;
pub mod book;
pub mod engine;
pub mod events;

pub use engine::{ExchangeEngine, PlaceOrderRequest, PlaceOutcome};
pub use events::EngineEvent;
