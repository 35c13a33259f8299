//! Balance and position endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use types::errors::ExchangeError;
use types::ids::Symbol;

use super::RestSession;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn balance(
    State(state): State<AppState>,
    RestSession(session_id): RestSession,
) -> Json<Value> {
    let account = state.engine.lock().await.account_snapshot(&session_id);
    Json(json!({ "balances": account.balances }))
}

#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    symbol: String,
}

pub async fn position(
    State(state): State<AppState>,
    RestSession(session_id): RestSession,
    Query(query): Query<PositionQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbol = Symbol::try_new(query.symbol.clone())
        .ok_or_else(|| ExchangeError::UnknownSymbol(query.symbol.clone()))?;
    if !state.known_symbol(&symbol) {
        return Err(ExchangeError::UnknownSymbol(query.symbol).into());
    }

    let quantity = state.engine.lock().await.position(&session_id, &symbol);
    let asset = symbol.base().to_string();
    Ok(Json(json!({
        "symbol": symbol,
        "asset": asset,
        "quantity": quantity.to_string(),
    })))
}
