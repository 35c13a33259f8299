//! Trade (matched pair) types

use crate::ids::{OrderId, SessionId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// A single match between a resting (maker) order and an incoming (taker)
/// order. The price is always the maker's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Per-symbol monotonic trade sequence
    pub sequence: u64,
    pub symbol: Symbol,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_session_id: SessionId,
    pub taker_session_id: SessionId,
    /// Side of the aggressor (taker)
    pub aggressor_side: Side,
    pub price: Price,
    pub quantity: Quantity,
    /// Unix milliseconds
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_session_id: SessionId,
        taker_session_id: SessionId,
        aggressor_side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            maker_session_id,
            taker_session_id,
            aggressor_side,
            price,
            quantity,
            executed_at,
        }
    }

    /// Trade value in the quote asset (price × quantity)
    pub fn value(&self) -> rust_decimal::Decimal {
        self.price * self.quantity
    }
}
