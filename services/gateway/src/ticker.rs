//! Market-data timer tasks
//!
//! One task per symbol. Every `tick_interval` the feed advances, the
//! tick lands in history, and MARKET_DATA frames go to TICKER and
//! MARKET_DATA subscribers through the outbound chain. ORDERBOOK
//! subscribers additionally get a depth snapshot on its own sequence.

use std::time::Duration;
use types::ids::Symbol;
use types::message::{BookLevel, ChannelKind, ServerMessage};
use types::time::now_millis;

use crate::state::AppState;

const ORDERBOOK_DEPTH: usize = 10;

pub fn spawn_tickers(state: &AppState) {
    for symbol in state.feeds.keys() {
        tokio::spawn(run_ticker(state.clone(), symbol.clone()));
    }
}

async fn run_ticker(state: AppState, symbol: Symbol) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(
        state.config.exchange.tick_interval.max(0.001),
    ));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let feed = state
        .feeds
        .get(&symbol)
        .expect("feed exists for every configured symbol");

    loop {
        interval.tick().await;

        let tick = feed.lock().await.tick(now_millis());
        let frame = ServerMessage::MarketData {
            symbol: tick.symbol.clone(),
            sequence_id: tick.sequence_id,
            timestamp: tick.timestamp,
            price: tick.price,
            bid: tick.bid,
            ask: tick.ask,
            volume_24h: tick.volume_24h,
        };
        state.publish(ChannelKind::Ticker, &symbol, &frame);
        state.publish(ChannelKind::MarketData, &symbol, &frame);

        if state.sessions.has_subscribers(ChannelKind::Orderbook, &symbol) {
            let depth = {
                let engine = state.engine.lock().await;
                engine.depth(&symbol, ORDERBOOK_DEPTH)
            };
            if let Some((bids, asks)) = depth {
                let sequence_id = feed.lock().await.next_orderbook_sequence();
                let to_levels = |side: Vec<_>| {
                    side.into_iter()
                        .map(|(price, quantity)| BookLevel { price, quantity })
                        .collect()
                };
                let frame = ServerMessage::OrderbookUpdate {
                    symbol: symbol.clone(),
                    sequence_id,
                    bids: to_levels(bids),
                    asks: to_levels(asks),
                    timestamp: now_millis(),
                };
                state.publish(ChannelKind::Orderbook, &symbol, &frame);
            }
        }
    }
}
