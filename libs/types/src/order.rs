//! Order lifecycle types

use crate::ids::{OrderId, SessionId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Limit or market order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// Time-in-force policy. Only meaningful for LIMIT orders; a MARKET order
/// behaves as IOC regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-till-cancel: rests until filled or cancelled
    GTC,
    /// Immediate-or-cancel: match now, cancel the remainder
    IOC,
    /// Fill-or-kill: the whole quantity fills up-front or the order rejects
    FOK,
}

impl Default for TimeInForce {
    fn default() -> Self {
        TimeInForce::GTC
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// An order as tracked by the engine.
///
/// Invariants: `filled_quantity <= quantity`; `status == Filled` exactly when
/// `filled_quantity == quantity`; `price` is Some iff the order is LIMIT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub session_id: SessionId,
    pub symbol: Symbol,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    /// Arrival counter used for FIFO tie-breaks within a price level
    pub sequence: u64,
    /// Unix milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: SessionId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        quantity: Quantity,
        time_in_force: TimeInForce,
        sequence: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            session_id,
            symbol,
            side,
            order_type,
            price,
            quantity,
            filled_quantity: Quantity::ZERO,
            status: OrderStatus::New,
            time_in_force,
            sequence,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    pub fn has_fills(&self) -> bool {
        self.filled_quantity.is_positive()
    }

    /// Apply a fill and advance the status
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity
    pub fn apply_fill(&mut self, quantity: Quantity, timestamp: i64) {
        assert!(
            quantity <= self.remaining_quantity(),
            "fill exceeds remaining quantity"
        );
        self.filled_quantity = self.filled_quantity + quantity;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = timestamp;
    }

    pub fn open(&mut self, timestamp: i64) {
        self.status = if self.has_fills() {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        };
        self.updated_at = timestamp;
    }

    /// Cancel a non-terminal order
    ///
    /// # Panics
    /// Panics if the order is already terminal
    pub fn cancel(&mut self, timestamp: i64) {
        assert!(!self.status.is_terminal(), "cannot cancel a terminal order");
        self.status = OrderStatus::Cancelled;
        self.updated_at = timestamp;
    }

    pub fn reject(&mut self, timestamp: i64) {
        self.status = OrderStatus::Rejected;
        self.updated_at = timestamp;
    }
}
