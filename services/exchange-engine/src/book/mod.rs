//! Order book infrastructure
//!
//! Price levels plus the two book sides. Both sides share the FIFO level
//! implementation; iteration direction is the only asymmetry.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;
