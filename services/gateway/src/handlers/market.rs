//! Health, symbols, ticker, and price-history endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use types::errors::ExchangeError;
use types::ids::Symbol;
use types::time::now_millis;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "exchange-simulator"}))
}

pub async fn symbols(State(state): State<AppState>) -> Json<Value> {
    let symbols = state.engine.lock().await.symbols();
    Json(json!({ "symbols": symbols }))
}

#[derive(Debug, Deserialize)]
pub struct TickerQuery {
    symbol: String,
}

pub async fn ticker(
    State(state): State<AppState>,
    Query(query): Query<TickerQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbol = Symbol::try_new(query.symbol.clone())
        .ok_or_else(|| ExchangeError::UnknownSymbol(query.symbol.clone()))?;
    let feed = state
        .feeds
        .get(&symbol)
        .ok_or_else(|| ExchangeError::UnknownSymbol(query.symbol))?;

    let feed = feed.lock().await;
    let tick = feed.quote(now_millis());
    Ok(Json(json!({
        "symbol": tick.symbol,
        "price": tick.price,
        "bid": tick.bid,
        "ask": tick.ask,
        "volume_24h": tick.volume_24h.to_string(),
        "high_24h": feed.high_24h().to_string(),
        "low_24h": feed.low_24h().to_string(),
        "sequence_id": tick.sequence_id,
        "timestamp": tick.timestamp,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    symbol: String,
    start: Option<i64>,
    end: Option<i64>,
    limit: Option<usize>,
}

pub async fn prices(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbol = Symbol::try_new(query.symbol.clone())
        .ok_or_else(|| ExchangeError::UnknownSymbol(query.symbol.clone()))?;
    let feed = state
        .feeds
        .get(&symbol)
        .ok_or_else(|| ExchangeError::UnknownSymbol(query.symbol))?;
    if let (Some(start), Some(end)) = (query.start, query.end) {
        if start > end {
            return Err(ExchangeError::Malformed("start must not exceed end".into()).into());
        }
    }

    let ticks = feed
        .lock()
        .await
        .history_range(query.start, query.end, query.limit);
    Ok(Json(json!({
        "symbol": symbol,
        "prices": ticks,
    })))
}
