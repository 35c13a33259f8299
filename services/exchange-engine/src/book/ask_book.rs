//! Ask (sell-side) book
//!
//! Sell orders keyed by price in a BTreeMap; the best ask is the lowest key.

use std::collections::BTreeMap;
use types::ids::{OrderId, SessionId};
use types::numeric::{Price, Quantity};

use super::price_level::{LevelEntry, PriceLevel};

#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
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

    /// Lowest ask price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Front order at the best ask
    pub fn best_entry(&self) -> Option<(Price, &LevelEntry)> {
        self.levels
            .iter()
            .next()
            .and_then(|(price, level)| level.front().map(|e| (*price, e)))
    }

    /// Fill the front order at the best ask; prunes emptied levels
    pub fn fill_best(&mut self, quantity: Quantity) {
        if let Some((price, level)) = self.levels.iter_mut().next() {
            let price = *price;
            level.fill_front(quantity);
            if level.is_empty() {
                self.levels.remove(&price);
            }
        }
    }

    /// Liquidity at or below `limit` (None = all levels), best first
    pub fn crossable_quantity(&self, limit: Option<Price>) -> Quantity {
        self.levels
            .iter()
            .take_while(|(price, _)| limit.map_or(true, |l| **price <= l))
            .fold(Quantity::ZERO, |acc, (_, level)| acc + level.total_quantity())
    }

    /// Top `depth` levels, best first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
