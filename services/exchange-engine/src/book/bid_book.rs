//! Bid (buy-side) book
//!
//! Buy orders keyed by price in a BTreeMap; the best bid is the highest key.

use std::collections::BTreeMap;
use types::ids::{OrderId, SessionId};
use types::numeric::{Price, Quantity};

use super::price_level::{LevelEntry, PriceLevel};

#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        price: Price,
        order_id: OrderId,
        session_id: SessionId,
        remaining: Quantity,
    ) {
        self.levels
            .entry(price)
            .or_default()
            .push_back(order_id, session_id, remaining);
    }

    /// Remove an order; drops the level when it empties
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id).is_some() {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Highest bid price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Front order at the best bid
    pub fn best_entry(&self) -> Option<(Price, &LevelEntry)> {
        self.levels
            .iter()
            .next_back()
            .and_then(|(price, level)| level.front().map(|e| (*price, e)))
    }

    /// Fill the front order at the best bid; prunes emptied levels
    pub fn fill_best(&mut self, quantity: Quantity) {
        if let Some((price, level)) = self.levels.iter_mut().next_back() {
            let price = *price;
            level.fill_front(quantity);
            if level.is_empty() {
                self.levels.remove(&price);
            }
        }
    }

    /// Liquidity at or above `limit` (None = all levels), best first
    pub fn crossable_quantity(&self, limit: Option<Price>) -> Quantity {
        self.levels
            .iter()
            .rev()
            .take_while(|(price, _)| limit.map_or(true, |l| **price >= l))
            .fold(Quantity::ZERO, |acc, (_, level)| acc + level.total_quantity())
    }

    /// Top `depth` levels, best first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> Quantity {
        Quantity::from_str(s).unwrap()
    }

    #[test]
    fn best_bid_is_highest_price() {
        let mut book = BidBook::new();
        book.insert(Price::from_u64(50_000), OrderId::new(), SessionId::new("a"), qty("1"));
        book.insert(Price::from_u64(51_000), OrderId::new(), SessionId::new("b"), qty("2"));
        book.insert(Price::from_u64(49_000), OrderId::new(), SessionId::new("c"), qty("3"));

        assert_eq!(book.best_price(), Some(Price::from_u64(51_000)));
        let (price, entry) = book.best_entry().unwrap();
        assert_eq!(price, Price::from_u64(51_000));
        assert_eq!(entry.remaining, qty("2"));
    }

    #[test]
    fn depth_snapshot_descends() {
        let mut book = BidBook::new();
        book.insert(Price::from_u64(50_000), OrderId::new(), SessionId::new("a"), qty("1"));
        book.insert(Price::from_u64(52_000), OrderId::new(), SessionId::new("b"), qty("2"));
        book.insert(Price::from_u64(51_000), OrderId::new(), SessionId::new("c"), qty("3"));

        let depth = book.depth_snapshot(2);
        assert_eq!(depth[0].0, Price::from_u64(52_000));
        assert_eq!(depth[1].0, Price::from_u64(51_000));
    }

    #[test]
    fn crossable_quantity_respects_limit() {
        let mut book = BidBook::new();
        book.insert(Price::from_u64(50_000), OrderId::new(), SessionId::new("a"), qty("1"));
        book.insert(Price::from_u64(49_000), OrderId::new(), SessionId::new("b"), qty("2"));

        // A sell limit at 49500 can only reach the 50000 level
        assert_eq!(
            book.crossable_quantity(Some(Price::from_u64(49_500))),
            qty("1")
        );
        assert_eq!(book.crossable_quantity(None), qty("3"));
    }

    #[test]
    fn remove_prunes_empty_level() {
        let mut book = BidBook::new();
        let order_id = OrderId::new();
        book.insert(Price::from_u64(50_000), order_id, SessionId::new("a"), qty("1"));
        assert!(book.remove(&order_id, Price::from_u64(50_000)));
        assert!(book.is_empty());
    }
}
