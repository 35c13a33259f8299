//! WebSocket message router
//!
//! Two-phase parse: raw JSON first, then the typed frame, so that broken
//! JSON reports MALFORMED and a well-formed frame with an unrecognized type
//! reports UNKNOWN_MESSAGE_TYPE. Neither touches session state.

use exchange_engine::PlaceOrderRequest;
use types::errors::ExchangeError;
use types::ids::SessionId;
use types::message::{ClientMessage, ServerMessage};
use types::time::now_millis;

use crate::state::AppState;

const KNOWN_TYPES: [&str; 6] = [
    "PLACE_ORDER",
    "CANCEL_ORDER",
    "QUERY_ORDER",
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PING",
];

fn error_frame(error: &ExchangeError, request_id: Option<String>) -> ServerMessage {
    ServerMessage::Error {
        kind: error.kind().to_string(),
        message: error.to_string(),
        request_id,
    }
}

/// Handle one inbound frame. `None` means the handler has nothing to reply
/// directly (engine events, if any, were already dispatched).
pub async fn handle_frame(
    state: &AppState,
    session_id: &SessionId,
    raw: &str,
) -> Option<ServerMessage> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            return Some(error_frame(
                &ExchangeError::Malformed(error.to_string()),
                None,
            ));
        }
    };
    let request_id = value
        .get("request_id")
        .and_then(|r| r.as_str())
        .map(String::from);
    let Some(message_type) = value.get("type").and_then(|t| t.as_str()) else {
        return Some(error_frame(
            &ExchangeError::Malformed("missing type field".into()),
            request_id,
        ));
    };
    if !KNOWN_TYPES.contains(&message_type) {
        return Some(error_frame(
            &ExchangeError::UnknownMessageType(message_type.to_string()),
            request_id,
        ));
    }
    let message: ClientMessage = match serde_json::from_value(value) {
        Ok(message) => message,
        Err(error) => {
            return Some(error_frame(
                &ExchangeError::Malformed(error.to_string()),
                request_id,
            ));
        }
    };

    match message {
        ClientMessage::PlaceOrder {
            request_id,
            symbol,
            side,
            order_type,
            price,
            quantity,
            time_in_force,
        } => {
            let request = PlaceOrderRequest {
                symbol,
                side,
                order_type,
                price,
                quantity,
                time_in_force,
            };
            let result = {
                let mut engine = state.engine.lock().await;
                engine.place_order(session_id, request, now_millis())
            };
            match result {
                Ok(outcome) => {
                    state.dispatch_engine_events(outcome.events).await;
                    None
                }
                Err(error) => Some(error_frame(&error, request_id)),
            }
        }
        ClientMessage::CancelOrder {
            request_id,
            order_id,
        } => {
            let result = {
                let mut engine = state.engine.lock().await;
                engine.cancel_order(session_id, order_id, now_millis())
            };
            match result {
                Ok((_, events)) => {
                    state.dispatch_engine_events(events).await;
                    None
                }
                Err(error) => Some(error_frame(&error, request_id)),
            }
        }
        ClientMessage::QueryOrder {
            request_id,
            order_id,
        } => {
            let result = state.engine.lock().await.get_order(session_id, order_id);
            match result {
                Ok(order) => Some(ServerMessage::OrderUpdate {
                    order,
                    timestamp: now_millis(),
                }),
                Err(error) => Some(error_frame(&error, request_id)),
            }
        }
        ClientMessage::Subscribe {
            request_id,
            channel,
            symbol,
        } => {
            if !state.known_symbol(&symbol) {
                return Some(error_frame(
                    &ExchangeError::UnknownSymbol(symbol.to_string()),
                    request_id,
                ));
            }
            state.sessions.subscribe(session_id, channel, symbol);
            None
        }
        ClientMessage::Unsubscribe {
            request_id: _,
            channel,
            symbol,
        } => {
            state.sessions.unsubscribe(session_id, channel, &symbol);
            None
        }
        ClientMessage::Ping { request_id } => Some(ServerMessage::Pong {
            request_id,
            timestamp: now_millis(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::sync::mpsc;
    use types::message::ChannelKind;

    async fn state() -> AppState {
        let (state, _rx) = AppState::from_config(Config::default()).unwrap();
        state
    }

    fn connect(state: &AppState, session_id: &SessionId) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(64);
        state.sessions.register(session_id.clone(), tx);
        rx
    }

    #[tokio::test]
    async fn broken_json_is_malformed() {
        let state = state().await;
        let session = SessionId::new("s");
        let reply = handle_frame(&state, &session, "{not json").await.unwrap();
        match reply {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "MALFORMED"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_type_is_flagged() {
        let state = state().await;
        let session = SessionId::new("s");
        let reply = handle_frame(&state, &session, r#"{"type":"TELEPORT","request_id":"r9"}"#)
            .await
            .unwrap();
        match reply {
            ServerMessage::Error {
                kind, request_id, ..
            } => {
                assert_eq!(kind, "UNKNOWN_MESSAGE_TYPE");
                assert_eq!(request_id.as_deref(), Some("r9"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn known_type_with_bad_fields_is_malformed() {
        let state = state().await;
        let session = SessionId::new("s");
        let raw = r#"{"type":"PLACE_ORDER","symbol":"BTC/USD","side":"SIDEWAYS",
            "order_type":"LIMIT","price":"1","quantity":"1"}"#;
        let reply = handle_frame(&state, &session, raw).await.unwrap();
        match reply {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "MALFORMED"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ping_echoes_request_id() {
        let state = state().await;
        let session = SessionId::new("s");
        let reply = handle_frame(&state, &session, r#"{"type":"PING","request_id":"hb-1"}"#)
            .await
            .unwrap();
        match reply {
            ServerMessage::Pong { request_id, .. } => {
                assert_eq!(request_id.as_deref(), Some("hb-1"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_unknown_symbol_errors() {
        let state = state().await;
        let session = SessionId::new("s");
        let _rx = connect(&state, &session);
        let reply = handle_frame(
            &state,
            &session,
            r#"{"type":"SUBSCRIBE","channel":"TICKER","symbol":"DOGE/USD"}"#,
        )
        .await
        .unwrap();
        match reply {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "UNKNOWN_SYMBOL"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe_is_silent() {
        let state = state().await;
        let session = SessionId::new("s");
        let _rx = connect(&state, &session);

        let reply = handle_frame(
            &state,
            &session,
            r#"{"type":"SUBSCRIBE","channel":"TICKER","symbol":"BTC/USD"}"#,
        )
        .await;
        assert!(reply.is_none());
        assert!(state
            .sessions
            .has_subscribers(ChannelKind::Ticker, &types::ids::Symbol::new("BTC/USD")));

        let reply = handle_frame(
            &state,
            &session,
            r#"{"type":"UNSUBSCRIBE","channel":"TICKER","symbol":"BTC/USD"}"#,
        )
        .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn place_order_delivers_order_update_event() {
        let state = state().await;
        let session = SessionId::new("s");
        let mut rx = connect(&state, &session);

        let raw = r#"{"type":"PLACE_ORDER","symbol":"BTC/USD","side":"BUY",
            "order_type":"LIMIT","price":"50000","quantity":"1"}"#;
        let reply = handle_frame(&state, &session, raw).await;
        assert!(reply.is_none());

        let frame = rx.try_recv().expect("order update should be queued");
        let parsed: ServerMessage = serde_json::from_str(&frame).unwrap();
        match parsed {
            ServerMessage::OrderUpdate { order, .. } => {
                assert_eq!(order.session_id, session);
                assert_eq!(order.status, types::order::OrderStatus::Open);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn insufficient_balance_reports_error_frame() {
        let state = state().await;
        let session = SessionId::new("s");
        let raw = r#"{"type":"PLACE_ORDER","symbol":"BTC/USD","side":"BUY",
            "order_type":"LIMIT","price":"50000","quantity":"100","request_id":"r1"}"#;
        let reply = handle_frame(&state, &session, raw).await.unwrap();
        match reply {
            ServerMessage::Error {
                kind, request_id, ..
            } => {
                assert_eq!(kind, "INSUFFICIENT_BALANCE");
                assert_eq!(request_id.as_deref(), Some("r1"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
