//! Per-symbol market-data feed
//!
//! One feed owns a symbol's price model, sequence counters, 24h statistics,
//! and rolling history. The gateway drives `tick()` from a timer task and
//! fans the result out to subscribers; sequence IDs are strictly monotonic
//! per channel *before* the outbound failure chain touches anything.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::Symbol;
use types::numeric::Price;

use crate::history::PriceHistory;
use crate::model::PriceModel;

/// Price precision (decimal places) applied before publication
const PRICE_DP: u32 = 2;

/// A published market-data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub symbol: Symbol,
    pub sequence_id: u64,
    /// Unix milliseconds
    pub timestamp: i64,
    pub price: Price,
    pub bid: Price,
    pub ask: Price,
    pub volume_24h: Decimal,
}

pub struct SymbolFeed {
    symbol: Symbol,
    model: Box<dyn PriceModel>,
    /// Unrounded model state; the published mid is rounded from this
    current: Decimal,
    /// Full spread as a fraction (10 bps = 0.001)
    spread: Decimal,
    /// TICKER and MARKET_DATA publish together and share this counter
    tick_sequence: u64,
    /// ORDERBOOK snapshots run on their own counter
    orderbook_sequence: u64,
    high_24h: Decimal,
    low_24h: Decimal,
    volume_24h: Decimal,
    history: PriceHistory,
}

impl SymbolFeed {
    pub fn new(
        symbol: Symbol,
        initial_price: Decimal,
        spread_bps: u32,
        history_capacity: usize,
        model: Box<dyn PriceModel>,
    ) -> Self {
        Self {
            symbol,
            model,
            current: initial_price,
            spread: Decimal::from(spread_bps) / Decimal::from(10_000),
            tick_sequence: 0,
            orderbook_sequence: 0,
            high_24h: initial_price,
            low_24h: initial_price,
            volume_24h: Decimal::ZERO,
            history: PriceHistory::new(history_capacity),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Advance the model one step and produce the next tick. Appends to the
    /// rolling history before returning.
    pub fn tick(&mut self, timestamp: i64) -> MarketTick {
        self.current = self.model.next_price(self.current);

        let mid = self.current.round_dp(PRICE_DP);
        let half_spread = mid * self.spread / Decimal::from(2);
        let bid = (mid - half_spread).round_dp(PRICE_DP);
        let ask = (mid + half_spread).round_dp(PRICE_DP);

        if mid > self.high_24h {
            self.high_24h = mid;
        }
        if mid < self.low_24h {
            self.low_24h = mid;
        }

        self.tick_sequence += 1;
        let tick = MarketTick {
            symbol: self.symbol.clone(),
            sequence_id: self.tick_sequence,
            timestamp,
            price: Price::try_new(mid).unwrap_or(Price::new(Decimal::new(1, 2))),
            bid: Price::try_new(bid).unwrap_or(Price::new(Decimal::new(1, 2))),
            ask: Price::try_new(ask).unwrap_or(Price::new(Decimal::new(1, 2))),
            volume_24h: self.volume_24h,
        };
        self.history.push(tick.clone());
        tick
    }

    /// Current quote without advancing the model or the sequence. Used by
    /// the REST ticker before the first timer tick has fired.
    pub fn quote(&self, timestamp: i64) -> MarketTick {
        if let Some(latest) = self.latest() {
            return latest;
        }
        let mid = self.current.round_dp(PRICE_DP);
        let half_spread = mid * self.spread / Decimal::from(2);
        MarketTick {
            symbol: self.symbol.clone(),
            sequence_id: self.tick_sequence,
            timestamp,
            price: Price::try_new(mid).unwrap_or(Price::new(Decimal::new(1, 2))),
            bid: Price::try_new((mid - half_spread).round_dp(PRICE_DP))
                .unwrap_or(Price::new(Decimal::new(1, 2))),
            ask: Price::try_new((mid + half_spread).round_dp(PRICE_DP))
                .unwrap_or(Price::new(Decimal::new(1, 2))),
            volume_24h: self.volume_24h,
        }
    }

    /// Next sequence ID for the ORDERBOOK channel
    pub fn next_orderbook_sequence(&mut self) -> u64 {
        self.orderbook_sequence += 1;
        self.orderbook_sequence
    }

    /// Accumulate executed trade volume into the 24h figure
    pub fn record_trade_volume(&mut self, quantity: Decimal) {
        self.volume_24h += quantity;
    }

    pub fn latest(&self) -> Option<MarketTick> {
        self.history.latest().cloned()
    }

    pub fn high_24h(&self) -> Decimal {
        self.high_24h
    }

    pub fn low_24h(&self) -> Decimal {
        self.low_24h
    }

    pub fn history_range(
        &self,
        start: Option<i64>,
        end: Option<i64>,
        limit: Option<usize>,
    ) -> Vec<MarketTick> {
        self.history.range(start, end, limit)
    }
}
