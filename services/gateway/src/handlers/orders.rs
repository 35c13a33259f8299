//! Order endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use exchange_engine::PlaceOrderRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use types::errors::ExchangeError;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use types::time::now_millis;

use super::RestSession;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub price: Option<Price>,
    pub quantity: Quantity,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
}

pub async fn create(
    State(state): State<AppState>,
    RestSession(session_id): RestSession,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    // Parse by hand so field errors report INVALID_ORDER with a 400 instead
    // of the extractor's 422
    let body: CreateOrderBody = serde_json::from_value(body)
        .map_err(|error| ExchangeError::InvalidOrder(error.to_string()))?;
    let symbol = Symbol::try_new(body.symbol.clone())
        .ok_or_else(|| ExchangeError::UnknownSymbol(body.symbol.clone()))?;
    let request = PlaceOrderRequest {
        symbol,
        side: body.side,
        order_type: body.order_type,
        price: body.price,
        quantity: body.quantity,
        time_in_force: body.time_in_force,
    };

    let outcome = {
        let mut engine = state.engine.lock().await;
        engine.place_order(&session_id, request, now_millis())?
    };
    state.dispatch_engine_events(outcome.events).await;
    Ok((StatusCode::CREATED, Json(outcome.order)))
}

pub async fn get(
    State(state): State<AppState>,
    RestSession(session_id): RestSession,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = OrderId::parse(&order_id).ok_or(ExchangeError::NotFound)?;
    let order = state.engine.lock().await.get_order(&session_id, order_id)?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    symbol: Option<String>,
    status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    RestSession(session_id): RestSession,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbol = match query.symbol {
        Some(raw) => Some(
            Symbol::try_new(raw.clone()).ok_or_else(|| ExchangeError::UnknownSymbol(raw))?,
        ),
        None => None,
    };
    let status = match query.status {
        Some(raw) => Some(
            serde_json::from_value::<OrderStatus>(Value::String(raw.clone()))
                .map_err(|_| ExchangeError::Malformed(format!("unknown status {raw}")))?,
        ),
        None => None,
    };

    let orders = state
        .engine
        .lock()
        .await
        .list_orders(&session_id, symbol.as_ref(), status);
    Ok(Json(json!({ "orders": orders })))
}

pub async fn cancel(
    State(state): State<AppState>,
    RestSession(session_id): RestSession,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let order_id = OrderId::parse(&order_id).ok_or(ExchangeError::NotFound)?;
    let (order, events) = {
        let mut engine = state.engine.lock().await;
        engine.cancel_order(&session_id, order_id, now_millis())?
    };
    state.dispatch_engine_events(events).await;
    Ok(Json(json!({
        "order_id": order.order_id,
        "status": "cancelled",
    })))
}
