//! Market-data crate
//!
//! Pure market-data logic: pluggable price models, per-symbol sequenced
//! feeds, and the bounded rolling history used for REST backfill. The
//! gateway owns the timer tasks and the fan-out; nothing here does I/O.

pub mod feed;
pub mod history;
pub mod model;

pub use feed::{MarketTick, SymbolFeed};
pub use model::{GbmModel, PriceModel, RandomWalkModel};
