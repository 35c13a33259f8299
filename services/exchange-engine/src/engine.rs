//! Exchange engine
//!
//! Coordinates validation, balance reservation, price-time matching, and
//! settlement. The engine is a serial section: the gateway owns exactly one
//! instance behind a mutex, so every mutation here sees a consistent book
//! and ledger.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use types::errors::ExchangeError;
use types::ids::{OrderId, SessionId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use types::trade::Trade;

use crate::accounts::AccountManager;
use crate::book::{AskBook, BidBook};
use crate::events::EngineEvent;

/// Order parameters as they arrive from the wire (REST body or WS frame)
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub time_in_force: Option<TimeInForce>,
}

/// Result of a successful order placement
#[derive(Debug)]
pub struct PlaceOutcome {
    pub order: Order,
    pub events: Vec<EngineEvent>,
}

struct SymbolBook {
    bids: BidBook,
    asks: AskBook,
}

pub struct ExchangeEngine {
    books: HashMap<Symbol, SymbolBook>,
    accounts: AccountManager,
    /// Every order ever admitted, terminal ones included
    orders: HashMap<OrderId, Order>,
    /// Arrival counter for FIFO tie-breaks
    arrival_counter: u64,
    /// Per-symbol trade sequence
    trade_counters: HashMap<Symbol, u64>,
    last_prices: HashMap<Symbol, Price>,
    /// Sessions refused after an invariant violation
    quarantined: HashSet<SessionId>,
    /// Whether a market order that fills nothing is REJECTED (vs CANCELLED)
    reject_unfilled_market: bool,
}

impl ExchangeEngine {
    pub fn new(
        symbols: Vec<Symbol>,
        default_balances: HashMap<String, Decimal>,
        reject_unfilled_market: bool,
    ) -> Self {
        let books = symbols
            .into_iter()
            .map(|s| {
                (
                    s,
                    SymbolBook {
                        bids: BidBook::new(),
                        asks: AskBook::new(),
                    },
                )
            })
            .collect();
        Self {
            books,
            accounts: AccountManager::new(default_balances),
            orders: HashMap::new(),
            arrival_counter: 0,
            trade_counters: HashMap::new(),
            last_prices: HashMap::new(),
            quarantined: HashSet::new(),
            reject_unfilled_market,
        }
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.books.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn last_price(&self, symbol: &Symbol) -> Option<Price> {
        self.last_prices.get(symbol).copied()
    }

    pub fn set_last_price(&mut self, symbol: Symbol, price: Price) {
        self.last_prices.insert(symbol, price);
    }

    /// Place a new order: validate, reserve, match, settle, dispose.
    pub fn place_order(
        &mut self,
        session_id: &SessionId,
        request: PlaceOrderRequest,
        timestamp: i64,
    ) -> Result<PlaceOutcome, ExchangeError> {
        if self.quarantined.contains(session_id) {
            return Err(ExchangeError::Internal(
                "session refused after balance invariant violation".into(),
            ));
        }
        self.validate(&request)?;

        self.arrival_counter += 1;
        let mut order = Order::new(
            session_id.clone(),
            request.symbol.clone(),
            request.side,
            request.order_type,
            request.price,
            request.quantity,
            // A market order is implicitly IOC
            match request.order_type {
                OrderType::Limit => request.time_in_force.unwrap_or_default(),
                OrderType::Market => TimeInForce::IOC,
            },
            self.arrival_counter,
            timestamp,
        );

        let base = order.symbol.base().to_string();
        let quote = order.symbol.quote().to_string();

        // Reservation at admission. BUY MARKET reserves nothing; it pays from
        // free quote step by step during matching.
        match (order.side, order.order_type) {
            (Side::Buy, OrderType::Limit) => {
                let limit = order.price.expect("validated limit price");
                if let Err(err) = self.accounts.lock(session_id, &quote, limit * order.quantity) {
                    order.reject(timestamp);
                    self.orders.insert(order.order_id, order);
                    return Err(err);
                }
            }
            (Side::Sell, _) => {
                if let Err(err) =
                    self.accounts
                        .lock(session_id, &base, order.quantity.as_decimal())
                {
                    order.reject(timestamp);
                    self.orders.insert(order.order_id, order);
                    return Err(err);
                }
            }
            (Side::Buy, OrderType::Market) => {}
        }

        // FOK must be fillable in full before any fill happens
        if order.order_type == OrderType::Limit && order.time_in_force == TimeInForce::FOK {
            let limit = order.price.expect("validated limit price");
            let book = self.books.get(&order.symbol).expect("validated symbol");
            let crossable = match order.side {
                Side::Buy => book.asks.crossable_quantity(Some(limit)),
                Side::Sell => book.bids.crossable_quantity(Some(limit)),
            };
            if crossable < order.quantity {
                self.release_reservation(&order, order.quantity);
                order.reject(timestamp);
                self.orders.insert(order.order_id, order);
                return Err(ExchangeError::FokUnfillable);
            }
        }

        let mut events = Vec::new();
        self.match_order(&mut order, &base, &quote, timestamp, &mut events)?;
        self.dispose(&mut order, timestamp);

        events.push(EngineEvent::OrderUpdate {
            order: order.clone(),
        });
        self.orders.insert(order.order_id, order.clone());

        Ok(PlaceOutcome { order, events })
    }

    /// Cancel a resting order. Non-existent, terminal, and foreign-session
    /// orders all report NOT_FOUND.
    pub fn cancel_order(
        &mut self,
        session_id: &SessionId,
        order_id: OrderId,
        timestamp: i64,
    ) -> Result<(Order, Vec<EngineEvent>), ExchangeError> {
        let order = self.orders.get(&order_id).ok_or(ExchangeError::NotFound)?;
        if &order.session_id != session_id || order.status.is_terminal() {
            return Err(ExchangeError::NotFound);
        }

        let order = self.orders.get_mut(&order_id).expect("present above");
        let price = order.price.expect("resting orders are limit orders");
        let remaining = order.remaining_quantity();
        order.cancel(timestamp);
        let cancelled = order.clone();

        let book = self
            .books
            .get_mut(&cancelled.symbol)
            .expect("book exists for admitted order");
        match cancelled.side {
            Side::Buy => book.bids.remove(&order_id, price),
            Side::Sell => book.asks.remove(&order_id, price),
        };
        self.release_reservation(&cancelled, remaining);

        let events = vec![EngineEvent::OrderUpdate {
            order: cancelled.clone(),
        }];
        Ok((cancelled, events))
    }

    /// Fetch an order. Foreign-session access is FORBIDDEN.
    pub fn get_order(
        &self,
        session_id: &SessionId,
        order_id: OrderId,
    ) -> Result<Order, ExchangeError> {
        let order = self.orders.get(&order_id).ok_or(ExchangeError::NotFound)?;
        if &order.session_id != session_id {
            return Err(ExchangeError::Forbidden);
        }
        Ok(order.clone())
    }

    /// All of a session's orders, newest arrivals last
    pub fn list_orders(
        &self,
        session_id: &SessionId,
        symbol: Option<&Symbol>,
        status: Option<OrderStatus>,
    ) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| &o.session_id == session_id)
            .filter(|o| symbol.map_or(true, |s| &o.symbol == s))
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.sequence);
        orders
    }

    pub fn account_snapshot(&mut self, session_id: &SessionId) -> types::account::Account {
        self.accounts.get_or_create(session_id).clone()
    }

    /// Position in the symbol's base asset (free + locked holdings)
    pub fn position(&mut self, session_id: &SessionId, symbol: &Symbol) -> Decimal {
        self.accounts
            .get_or_create(session_id)
            .position(symbol.base())
    }

    /// Depth snapshot: (bids, asks), best first
    pub fn depth(
        &self,
        symbol: &Symbol,
        levels: usize,
    ) -> Option<(Vec<(Price, Quantity)>, Vec<(Price, Quantity)>)> {
        self.books
            .get(symbol)
            .map(|book| (book.bids.depth_snapshot(levels), book.asks.depth_snapshot(levels)))
    }

    /// Per-asset totals across all accounts (conservation checks)
    pub fn asset_totals(&self) -> HashMap<String, Decimal> {
        self.accounts.total_per_asset()
    }

    fn validate(&self, request: &PlaceOrderRequest) -> Result<(), ExchangeError> {
        if !self.books.contains_key(&request.symbol) {
            return Err(ExchangeError::UnknownSymbol(request.symbol.to_string()));
        }
        if !request.quantity.is_positive() {
            return Err(ExchangeError::InvalidOrder(
                "quantity must be positive".into(),
            ));
        }
        match request.order_type {
            OrderType::Limit if request.price.is_none() => Err(ExchangeError::InvalidOrder(
                "price is required for LIMIT orders".into(),
            )),
            OrderType::Market if request.price.is_some() => Err(ExchangeError::InvalidOrder(
                "price is not allowed for MARKET orders".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Price-time matching loop. Trades settle atomically as they happen;
    /// the taker order accumulates fills in place.
    fn match_order(
        &mut self,
        order: &mut Order,
        base: &str,
        quote: &str,
        timestamp: i64,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), ExchangeError> {
        loop {
            if !order.remaining_quantity().is_positive() {
                break;
            }

            let book = self.books.get(&order.symbol).expect("validated symbol");
            let best = match order.side {
                Side::Buy => book.asks.best_entry(),
                Side::Sell => book.bids.best_entry(),
            };
            let Some((level_price, entry)) = best else {
                break;
            };

            if let Some(limit) = order.price {
                let crosses = match order.side {
                    Side::Buy => level_price <= limit,
                    Side::Sell => level_price >= limit,
                };
                if !crosses {
                    break;
                }
            }

            let maker_order_id = entry.order_id;
            let maker_session = entry.session_id.clone();
            let quantity = order.remaining_quantity().min(entry.remaining);
            let cost = level_price * quantity;

            // A market buy pays from free quote; the step fails whole the
            // moment it would exceed what is available.
            if order.side == Side::Buy && order.order_type == OrderType::Market {
                let free = self.accounts.get_or_create(&order.session_id).free(quote);
                if free < cost {
                    if order.has_fills() {
                        break;
                    }
                    order.reject(timestamp);
                    self.orders.insert(order.order_id, order.clone());
                    return Err(ExchangeError::InsufficientBalance {
                        asset: quote.to_string(),
                        required: cost.to_string(),
                        available: free.to_string(),
                    });
                }
            }

            self.settle(order, &maker_session, base, quote, level_price, quantity);

            // Maker order record and book entry
            let maker = self
                .orders
                .get_mut(&maker_order_id)
                .expect("resting order is tracked");
            maker.apply_fill(quantity, timestamp);
            let maker_snapshot = maker.clone();

            let book = self.books.get_mut(&order.symbol).expect("validated symbol");
            match order.side {
                Side::Buy => book.asks.fill_best(quantity),
                Side::Sell => book.bids.fill_best(quantity),
            }

            order.apply_fill(quantity, timestamp);
            self.last_prices.insert(order.symbol.clone(), level_price);

            let sequence = {
                let counter = self.trade_counters.entry(order.symbol.clone()).or_insert(0);
                *counter += 1;
                *counter
            };
            let trade = Trade::new(
                sequence,
                order.symbol.clone(),
                maker_order_id,
                order.order_id,
                maker_session.clone(),
                order.session_id.clone(),
                order.side,
                level_price,
                quantity,
                timestamp,
            );

            events.push(EngineEvent::Fill {
                session_id: maker_session.clone(),
                order_id: maker_order_id,
                price: level_price,
                quantity,
                timestamp,
            });
            events.push(EngineEvent::Fill {
                session_id: order.session_id.clone(),
                order_id: order.order_id,
                price: level_price,
                quantity,
                timestamp,
            });
            events.push(EngineEvent::OrderUpdate {
                order: maker_snapshot,
            });
            events.push(EngineEvent::Trade { trade });

            let taker_session = order.session_id.clone();
            self.check_settlement_invariants(&maker_session);
            self.check_settlement_invariants(&taker_session);
        }
        Ok(())
    }

    /// Atomic double-ledger transfer for one trade at the maker's price.
    ///
    /// The buyer's reservation was taken at its own limit; when the trade
    /// price improves on it, the difference unlocks back to free quote.
    fn settle(
        &mut self,
        taker: &Order,
        maker_session: &SessionId,
        base: &str,
        quote: &str,
        price: Price,
        quantity: Quantity,
    ) {
        let cost = price * quantity;
        match taker.side {
            Side::Buy => {
                let taker_account = self.accounts.get_or_create(&taker.session_id);
                match taker.order_type {
                    OrderType::Market => taker_account.balance_mut(quote).spend_free(cost),
                    OrderType::Limit => {
                        let limit = taker.price.expect("limit order has price");
                        taker_account.balance_mut(quote).spend_locked(cost);
                        let refund = (limit * quantity) - cost;
                        if refund > Decimal::ZERO {
                            taker_account.balance_mut(quote).unlock(refund);
                        }
                    }
                }
                self.accounts
                    .get_or_create(&taker.session_id)
                    .balance_mut(base)
                    .credit(quantity.as_decimal());

                let maker_account = self.accounts.get_or_create(maker_session);
                maker_account
                    .balance_mut(base)
                    .spend_locked(quantity.as_decimal());
                maker_account.balance_mut(quote).credit(cost);
            }
            Side::Sell => {
                let taker_account = self.accounts.get_or_create(&taker.session_id);
                taker_account
                    .balance_mut(base)
                    .spend_locked(quantity.as_decimal());
                taker_account.balance_mut(quote).credit(cost);

                // The resting buy reserved at its own limit, which is the
                // trade price, so no refund applies.
                let maker_account = self.accounts.get_or_create(maker_session);
                maker_account.balance_mut(quote).spend_locked(cost);
                maker_account.balance_mut(base).credit(quantity.as_decimal());
            }
        }
    }

    /// Post-match disposition of the incoming order's remainder
    fn dispose(&mut self, order: &mut Order, timestamp: i64) {
        if !order.remaining_quantity().is_positive() {
            return; // fully filled, status already FILLED
        }
        match order.order_type {
            OrderType::Market => {
                self.release_reservation(order, order.remaining_quantity());
                if order.has_fills() {
                    order.cancel(timestamp);
                } else if self.reject_unfilled_market {
                    order.reject(timestamp);
                } else {
                    order.cancel(timestamp);
                }
            }
            OrderType::Limit => match order.time_in_force {
                TimeInForce::FOK => {
                    // Feasibility was proven before matching started
                    debug_assert!(order.is_filled(), "FOK must fill in full");
                }
                TimeInForce::IOC => {
                    self.release_reservation(order, order.remaining_quantity());
                    order.cancel(timestamp);
                }
                TimeInForce::GTC => {
                    order.open(timestamp);
                    let price = order.price.expect("limit order has price");
                    let book = self.books.get_mut(&order.symbol).expect("validated symbol");
                    match order.side {
                        Side::Buy => book.bids.insert(
                            price,
                            order.order_id,
                            order.session_id.clone(),
                            order.remaining_quantity(),
                        ),
                        Side::Sell => book.asks.insert(
                            price,
                            order.order_id,
                            order.session_id.clone(),
                            order.remaining_quantity(),
                        ),
                    }
                }
            },
        }
    }

    /// Return the residual reservation for `remaining` units to free balance
    fn release_reservation(&mut self, order: &Order, remaining: Quantity) {
        if remaining.is_zero() {
            return;
        }
        match (order.side, order.order_type) {
            (Side::Buy, OrderType::Limit) => {
                let limit = order.price.expect("limit order has price");
                self.accounts
                    .unlock(&order.session_id, order.symbol.quote(), limit * remaining);
            }
            (Side::Sell, _) => {
                self.accounts.unlock(
                    &order.session_id,
                    order.symbol.base(),
                    remaining.as_decimal(),
                );
            }
            (Side::Buy, OrderType::Market) => {}
        }
    }

    /// A negative balance after settlement is fatal for the session: log it,
    /// refuse its future orders, keep the process alive.
    fn check_settlement_invariants(&mut self, session_id: &SessionId) {
        if !self.accounts.verify_non_negative(session_id) {
            tracing::error!(session = %session_id, "balance invariant violated after settlement");
            self.quarantined.insert(session_id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ExchangeEngine {
        let mut defaults = HashMap::new();
        defaults.insert("USD".to_string(), Decimal::from(100_000));
        defaults.insert("BTC".to_string(), Decimal::from(10));
        ExchangeEngine::new(vec![Symbol::new("BTC/USD")], defaults, true)
    }

    fn limit(side: Side, price: u64, qty: &str, tif: TimeInForce) -> PlaceOrderRequest {
        PlaceOrderRequest {
            symbol: Symbol::new("BTC/USD"),
            side,
            order_type: OrderType::Limit,
            price: Some(Price::from_u64(price)),
            quantity: Quantity::from_str(qty).unwrap(),
            time_in_force: Some(tif),
        }
    }

    fn market(side: Side, qty: &str) -> PlaceOrderRequest {
        PlaceOrderRequest {
            symbol: Symbol::new("BTC/USD"),
            side,
            order_type: OrderType::Market,
            price: None,
            quantity: Quantity::from_str(qty).unwrap(),
            time_in_force: None,
        }
    }

    #[test]
    fn resting_buy_locks_quote() {
        let mut eng = engine();
        let session = SessionId::new("a");
        let outcome = eng
            .place_order(&session, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Open);
        let account = eng.account_snapshot(&session);
        assert_eq!(account.balance("USD").unwrap().locked, Decimal::from(50_000));
        assert_eq!(account.balance("USD").unwrap().free, Decimal::from(50_000));
    }

    #[test]
    fn unknown_symbol_rejected() {
        let mut eng = engine();
        let req = PlaceOrderRequest {
            symbol: Symbol::new("ETH/USD"),
            ..limit(Side::Buy, 100, "1", TimeInForce::GTC)
        };
        let err = eng.place_order(&SessionId::new("a"), req, 1).unwrap_err();
        assert_eq!(err.kind(), "UNKNOWN_SYMBOL");
    }

    #[test]
    fn limit_requires_price_market_forbids_it() {
        let mut eng = engine();
        let mut req = limit(Side::Buy, 100, "1", TimeInForce::GTC);
        req.price = None;
        assert_eq!(
            eng.place_order(&SessionId::new("a"), req, 1).unwrap_err().kind(),
            "INVALID_ORDER"
        );

        let mut req = market(Side::Buy, "1");
        req.price = Some(Price::from_u64(100));
        assert_eq!(
            eng.place_order(&SessionId::new("a"), req, 1).unwrap_err().kind(),
            "INVALID_ORDER"
        );
    }

    #[test]
    fn full_match_settles_both_sides() {
        let mut eng = engine();
        let seller = SessionId::new("seller");
        let buyer = SessionId::new("buyer");

        eng.place_order(&seller, limit(Side::Sell, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();
        let outcome = eng
            .place_order(&buyer, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 2)
            .unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Filled);

        let seller_acct = eng.account_snapshot(&seller);
        assert_eq!(seller_acct.free("USD"), Decimal::from(150_000));
        assert_eq!(seller_acct.free("BTC"), Decimal::from(9));

        let buyer_acct = eng.account_snapshot(&buyer);
        assert_eq!(buyer_acct.free("USD"), Decimal::from(50_000));
        assert_eq!(buyer_acct.free("BTC"), Decimal::from(11));
    }

    #[test]
    fn maker_price_wins_and_taker_gets_refund() {
        let mut eng = engine();
        let seller = SessionId::new("seller");
        let buyer = SessionId::new("buyer");

        eng.place_order(&seller, limit(Side::Sell, 49_000, "1", TimeInForce::GTC), 1)
            .unwrap();
        let outcome = eng
            .place_order(&buyer, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 2)
            .unwrap();

        let trade = outcome
            .events
            .iter()
            .find_map(|e| match e {
                EngineEvent::Trade { trade } => Some(trade.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(trade.price, Price::from_u64(49_000));

        // Reserved 50000, paid 49000, refund 1000 back to free
        let buyer_acct = eng.account_snapshot(&buyer);
        assert_eq!(buyer_acct.free("USD"), Decimal::from(51_000));
        assert_eq!(buyer_acct.balance("USD").unwrap().locked, Decimal::ZERO);
    }

    #[test]
    fn ioc_cancels_remainder_and_releases_reservation() {
        let mut eng = engine();
        let seller = SessionId::new("seller");
        let buyer = SessionId::new("buyer");

        eng.place_order(&seller, limit(Side::Sell, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();
        let outcome = eng
            .place_order(&buyer, limit(Side::Buy, 50_000, "3", TimeInForce::IOC), 2)
            .unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert_eq!(
            outcome.order.filled_quantity,
            Quantity::from_str("1").unwrap()
        );
        let buyer_acct = eng.account_snapshot(&buyer);
        assert_eq!(buyer_acct.balance("USD").unwrap().locked, Decimal::ZERO);
        assert_eq!(buyer_acct.free("USD"), Decimal::from(50_000));
    }

    #[test]
    fn fok_rejects_when_unfillable() {
        let mut eng = engine();
        let seller = SessionId::new("seller");
        let buyer = SessionId::new("buyer");

        eng.place_order(&seller, limit(Side::Sell, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();
        let err = eng
            .place_order(&buyer, limit(Side::Buy, 50_000, "2", TimeInForce::FOK), 2)
            .unwrap_err();
        assert_eq!(err.kind(), "FOK_UNFILLABLE");

        // Reservation fully released, book untouched
        let buyer_acct = eng.account_snapshot(&buyer);
        assert_eq!(buyer_acct.balance("USD").unwrap().locked, Decimal::ZERO);
        assert_eq!(buyer_acct.free("USD"), Decimal::from(100_000));
        let (_, asks) = eng.depth(&Symbol::new("BTC/USD"), 10).unwrap();
        assert_eq!(asks[0].1, Quantity::from_str("1").unwrap());
    }

    #[test]
    fn fok_fills_when_feasible() {
        let mut eng = engine();
        let seller = SessionId::new("seller");
        let buyer = SessionId::new("buyer");

        eng.place_order(&seller, limit(Side::Sell, 50_000, "2", TimeInForce::GTC), 1)
            .unwrap();
        let outcome = eng
            .place_order(&buyer, limit(Side::Buy, 50_000, "2", TimeInForce::FOK), 2)
            .unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Filled);
    }

    #[test]
    fn market_buy_stops_at_free_quote() {
        let mut eng = engine();
        let seller = SessionId::new("seller");
        let buyer = SessionId::new("buyer");

        // 100k free quote affords exactly 2 of the three resting 1 BTC asks
        for ts in 1..=3 {
            eng.place_order(&seller, limit(Side::Sell, 50_000, "1", TimeInForce::GTC), ts)
                .unwrap();
        }
        let outcome = eng.place_order(&buyer, market(Side::Buy, "3"), 4).unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert_eq!(
            outcome.order.filled_quantity,
            Quantity::from_str("2").unwrap()
        );
        let buyer_acct = eng.account_snapshot(&buyer);
        assert_eq!(buyer_acct.free("USD"), Decimal::ZERO);
        assert_eq!(buyer_acct.free("BTC"), Decimal::from(12));
    }

    #[test]
    fn market_with_no_liquidity_is_rejected() {
        let mut eng = engine();
        let outcome = eng
            .place_order(&SessionId::new("a"), market(Side::Buy, "1"), 1)
            .unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Rejected);
    }

    #[test]
    fn market_sell_reserves_base() {
        let mut eng = engine();
        let session = SessionId::new("a");
        let err = eng
            .place_order(&session, market(Side::Sell, "11"), 1)
            .unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn cancel_releases_reservation() {
        let mut eng = engine();
        let session = SessionId::new("a");
        let outcome = eng
            .place_order(&session, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();

        let (cancelled, _) = eng
            .cancel_order(&session, outcome.order.order_id, 2)
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let account = eng.account_snapshot(&session);
        assert_eq!(account.balance("USD").unwrap().locked, Decimal::ZERO);
        assert_eq!(account.free("USD"), Decimal::from(100_000));
    }

    #[test]
    fn cancel_foreign_or_missing_is_not_found() {
        let mut eng = engine();
        let owner = SessionId::new("owner");
        let outcome = eng
            .place_order(&owner, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();

        assert_eq!(
            eng.cancel_order(&SessionId::new("other"), outcome.order.order_id, 2)
                .unwrap_err()
                .kind(),
            "NOT_FOUND"
        );
        assert_eq!(
            eng.cancel_order(&owner, OrderId::new(), 2).unwrap_err().kind(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn price_time_priority_within_level() {
        let mut eng = engine();
        let first = SessionId::new("first");
        let second = SessionId::new("second");
        let buyer = SessionId::new("buyer");

        let first_order = eng
            .place_order(&first, limit(Side::Sell, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap()
            .order;
        eng.place_order(&second, limit(Side::Sell, 50_000, "1", TimeInForce::GTC), 2)
            .unwrap();

        let outcome = eng
            .place_order(&buyer, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 3)
            .unwrap();
        let trade = outcome
            .events
            .iter()
            .find_map(|e| match e {
                EngineEvent::Trade { trade } => Some(trade.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(trade.maker_order_id, first_order.order_id);
    }

    #[test]
    fn conservation_across_trades() {
        let mut eng = engine();
        let a = SessionId::new("a");
        let b = SessionId::new("b");

        eng.place_order(&a, limit(Side::Sell, 50_000, "2", TimeInForce::GTC), 1)
            .unwrap();
        eng.place_order(&b, limit(Side::Buy, 50_000, "1.5", TimeInForce::GTC), 2)
            .unwrap();

        let totals = eng.asset_totals();
        assert_eq!(totals["USD"], Decimal::from(200_000));
        assert_eq!(totals["BTC"], Decimal::from(20));
    }

    #[test]
    fn query_order_access_control() {
        let mut eng = engine();
        let owner = SessionId::new("owner");
        let outcome = eng
            .place_order(&owner, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();

        assert!(eng.get_order(&owner, outcome.order.order_id).is_ok());
        assert_eq!(
            eng.get_order(&SessionId::new("other"), outcome.order.order_id)
                .unwrap_err()
                .kind(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn list_orders_filters() {
        let mut eng = engine();
        let session = SessionId::new("a");
        eng.place_order(&session, limit(Side::Buy, 50_000, "1", TimeInForce::GTC), 1)
            .unwrap();
        eng.place_order(&session, limit(Side::Buy, 49_000, "1", TimeInForce::GTC), 2)
            .unwrap();

        assert_eq!(eng.list_orders(&session, None, None).len(), 2);
        assert_eq!(
            eng.list_orders(&session, None, Some(OrderStatus::Open)).len(),
            2
        );
        assert_eq!(
            eng.list_orders(&session, None, Some(OrderStatus::Filled)).len(),
            0
        );
        assert!(eng
            .list_orders(&SessionId::new("other"), None, None)
            .is_empty());
    }
}
