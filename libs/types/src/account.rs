//! Account and balance types
//!
//! A balance splits into `free` (spendable) and `locked` (reserved by open
//! orders). Locks and unlocks move value between the two halves without
//! changing their sum; only settlement and initial grants change totals.

use crate::ids::SessionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-asset balance with reservation accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn new(asset: impl Into<String>, free: Decimal) -> Self {
        Self {
            asset: asset.into(),
            free,
            locked: Decimal::ZERO,
        }
    }

    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }

    /// Both halves must stay non-negative
    pub fn check_invariant(&self) -> bool {
        self.free >= Decimal::ZERO && self.locked >= Decimal::ZERO
    }

    /// Move `amount` from free to locked
    ///
    /// # Panics
    /// Panics if `amount` exceeds the free balance
    pub fn lock(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "lock amount must be non-negative");
        assert!(amount <= self.free, "insufficient free balance");
        self.free -= amount;
        self.locked += amount;
    }

    /// Move `amount` from locked back to free
    ///
    /// # Panics
    /// Panics if `amount` exceeds the locked balance
    pub fn unlock(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "unlock amount must be non-negative");
        assert!(amount <= self.locked, "insufficient locked balance");
        self.locked -= amount;
        self.free += amount;
    }

    /// Consume `amount` of locked balance (settlement debit)
    ///
    /// # Panics
    /// Panics if `amount` exceeds the locked balance
    pub fn spend_locked(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "spend amount must be non-negative");
        assert!(amount <= self.locked, "insufficient locked balance");
        self.locked -= amount;
    }

    /// Consume `amount` of free balance directly (market-buy settlement)
    ///
    /// # Panics
    /// Panics if `amount` exceeds the free balance
    pub fn spend_free(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "spend amount must be non-negative");
        assert!(amount <= self.free, "insufficient free balance");
        self.free -= amount;
    }

    /// Credit `amount` to the free balance (settlement credit)
    pub fn credit(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "credit amount must be non-negative");
        self.free += amount;
    }
}

/// A trading account, keyed by the owning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub session_id: SessionId,
    pub balances: HashMap<String, Balance>,
}

impl Account {
    pub fn new(session_id: SessionId, initial: &HashMap<String, Decimal>) -> Self {
        let balances = initial
            .iter()
            .map(|(asset, amount)| (asset.clone(), Balance::new(asset.clone(), *amount)))
            .collect();
        Self {
            session_id,
            balances,
        }
    }

    pub fn balance(&self, asset: &str) -> Option<&Balance> {
        self.balances.get(asset)
    }

    /// Free balance for an asset, zero if the asset was never held
    pub fn free(&self, asset: &str) -> Decimal {
        self.balances
            .get(asset)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO)
    }

    /// Mutable balance, created empty on first touch
    pub fn balance_mut(&mut self, asset: &str) -> &mut Balance {
        self.balances
            .entry(asset.to_string())
            .or_insert_with(|| Balance::new(asset, Decimal::ZERO))
    }

    /// Position in a symbol's base asset: total holdings of that asset
    pub fn position(&self, base_asset: &str) -> Decimal {
        self.balances
            .get(base_asset)
            .map(|b| b.total())
            .unwrap_or(Decimal::ZERO)
    }
}
