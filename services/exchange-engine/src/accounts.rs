//! Account ledger
//!
//! Accounts are created lazily on first touch with the configured default
//! balances. All mutation happens inside the engine's serial section; the
//! manager itself carries no locking.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::account::Account;
use types::errors::ExchangeError;
use types::ids::SessionId;

#[derive(Debug)]
pub struct AccountManager {
    accounts: HashMap<SessionId, Account>,
    default_balances: HashMap<String, Decimal>,
}

impl AccountManager {
    pub fn new(default_balances: HashMap<String, Decimal>) -> Self {
        Self {
            accounts: HashMap::new(),
            default_balances,
        }
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Account> {
        self.accounts.get(session_id)
    }

    pub fn get_or_create(&mut self, session_id: &SessionId) -> &mut Account {
        self.accounts
            .entry(session_id.clone())
            .or_insert_with(|| Account::new(session_id.clone(), &self.default_balances))
    }

    /// Free balance check used by pre-acceptance validation
    pub fn ensure_free(
        &mut self,
        session_id: &SessionId,
        asset: &str,
        required: Decimal,
    ) -> Result<(), ExchangeError> {
        let available = self.get_or_create(session_id).free(asset);
        if available < required {
            return Err(ExchangeError::InsufficientBalance {
                asset: asset.to_string(),
                required: required.to_string(),
                available: available.to_string(),
            });
        }
        Ok(())
    }

    /// Reserve `amount` of `asset` for an order (free → locked)
    pub fn lock(
        &mut self,
        session_id: &SessionId,
        asset: &str,
        amount: Decimal,
    ) -> Result<(), ExchangeError> {
        self.ensure_free(session_id, asset, amount)?;
        self.get_or_create(session_id).balance_mut(asset).lock(amount);
        Ok(())
    }

    /// Release a reservation (locked → free)
    pub fn unlock(&mut self, session_id: &SessionId, asset: &str, amount: Decimal) {
        self.get_or_create(session_id)
            .balance_mut(asset)
            .unlock(amount);
    }

    /// Per-asset sum of free + locked over every account. Constant across
    /// settlement; used by invariant checks and tests.
    pub fn total_per_asset(&self) -> HashMap<String, Decimal> {
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for account in self.accounts.values() {
            for balance in account.balances.values() {
                *totals.entry(balance.asset.clone()).or_default() += balance.total();
            }
        }
        totals
    }

    /// True when every balance of the session is non-negative
    pub fn verify_non_negative(&self, session_id: &SessionId) -> bool {
        self.accounts
            .get(session_id)
            .map(|account| account.balances.values().all(|b| b.check_invariant()))
            .unwrap_or(true)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AccountManager {
        let mut defaults = HashMap::new();
        defaults.insert("USD".to_string(), Decimal::from(100_000));
        defaults.insert("BTC".to_string(), Decimal::from(10));
        AccountManager::new(defaults)
    }

    #[test]
    fn lazy_creation_grants_defaults() {
        let mut mgr = manager();
        let session = SessionId::new("s1");
        let account = mgr.get_or_create(&session);
        assert_eq!(account.free("USD"), Decimal::from(100_000));
        assert_eq!(account.free("BTC"), Decimal::from(10));
    }

    #[test]
    fn lock_rejects_over_reservation() {
        let mut mgr = manager();
        let session = SessionId::new("s1");
        let err = mgr.lock(&session, "USD", Decimal::from(200_000)).unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_BALANCE");

        mgr.lock(&session, "USD", Decimal::from(60_000)).unwrap();
        assert_eq!(
            mgr.get(&session).unwrap().free("USD"),
            Decimal::from(40_000)
        );
    }

    #[test]
    fn totals_cover_all_accounts() {
        let mut mgr = manager();
        mgr.get_or_create(&SessionId::new("a"));
        mgr.get_or_create(&SessionId::new("b"));
        let totals = mgr.total_per_asset();
        assert_eq!(totals["USD"], Decimal::from(200_000));
        assert_eq!(totals["BTC"], Decimal::from(20));
    }
}
