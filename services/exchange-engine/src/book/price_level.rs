//! Price level with FIFO queue
//!
//! A price level holds every resting order at one price point, in arrival
//! order. Time priority within a level is the queue order; nothing ever
//! jumps the queue.

use std::collections::VecDeque;
use types::ids::{OrderId, SessionId};
use types::numeric::Quantity;

/// An entry in the level queue. The remaining quantity mirrors the engine's
/// order record and is kept in sync on every fill.
#[derive(Debug, Clone)]
pub struct LevelEntry {
    pub order_id: OrderId,
    pub session_id: SessionId,
    pub remaining: Quantity,
}

/// All resting orders at a single price, FIFO ordered.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<LevelEntry>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order at the back of the queue
    pub fn push_back(&mut self, order_id: OrderId, session_id: SessionId, remaining: Quantity) {
        self.orders.push_back(LevelEntry {
            order_id,
            session_id,
            remaining,
        });
        self.total_quantity = self.total_quantity + remaining;
    }

    /// Remove an order anywhere in the queue, returning its remaining quantity
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Quantity> {
        let position = self.orders.iter().position(|e| &e.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity - entry.remaining;
        Some(entry.remaining)
    }

    /// The order at the front of the queue (oldest at this price)
    pub fn front(&self) -> Option<&LevelEntry> {
        self.orders.front()
    }

    /// Reduce the front order by a fill. Removes it once exhausted.
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the front's remaining
    pub fn fill_front(&mut self, quantity: Quantity) {
        let entry = self.orders.front_mut().expect("fill on empty level");
        entry.remaining = entry.remaining - quantity;
        self.total_quantity = self.total_quantity - quantity;
        if entry.remaining.is_zero() {
            self.orders.pop_front();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Sum of remaining quantities at this price
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> Quantity {
        Quantity::from_str(s).unwrap()
    }

    #[test]
    fn fifo_order_is_preserved() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        let second = OrderId::new();
        level.push_back(first, SessionId::new("a"), qty("1.0"));
        level.push_back(second, SessionId::new("b"), qty("2.0"));

        assert_eq!(level.front().unwrap().order_id, first);
        assert_eq!(level.total_quantity(), qty("3.0"));
    }

    #[test]
    fn fill_front_removes_exhausted_orders() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        let second = OrderId::new();
        level.push_back(first, SessionId::new("a"), qty("1.0"));
        level.push_back(second, SessionId::new("b"), qty("2.0"));

        level.fill_front(qty("0.4"));
        assert_eq!(level.front().unwrap().remaining, qty("0.6"));

        level.fill_front(qty("0.6"));
        assert_eq!(level.front().unwrap().order_id, second);
        assert_eq!(level.total_quantity(), qty("2.0"));
    }

    #[test]
    fn remove_mid_queue() {
        let mut level = PriceLevel::new();
        let first = OrderId::new();
        let second = OrderId::new();
        let third = OrderId::new();
        level.push_back(first, SessionId::new("a"), qty("1.0"));
        level.push_back(second, SessionId::new("b"), qty("2.0"));
        level.push_back(third, SessionId::new("c"), qty("3.0"));

        assert_eq!(level.remove(&second), Some(qty("2.0")));
        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), qty("4.0"));
        assert_eq!(level.remove(&second), None);
    }
}
