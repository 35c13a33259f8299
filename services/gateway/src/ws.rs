//! WebSocket endpoint
//!
//! One socket = one session. A reconnect may present `X-Session-ID` on the
//! upgrade request to resume the same session identity (account, orders,
//! and silent-connection counters are keyed by it); otherwise a fresh UUID
//! is assigned.
//!
//! Inbound frames cross the inbound failure chain before dispatch; delays
//! are slept inline so per-session FIFO holds unless reorder is enabled.
//! Outbound frames cross the outbound chain inside `AppState::send_to_session`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use types::ids::SessionId;

use crate::dispatch;
use crate::sessions::OUTBOUND_QUEUE_DEPTH;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let session_id = headers
        .get("x-session-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(SessionId::new)
        .unwrap_or_else(SessionId::generate);
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: SessionId) {
    tracing::info!(session = %session_id, "client connected");

    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_DEPTH);
    state.sessions.register(session_id.clone(), outbound_tx);

    // Writer task: drain the session's outbound queue onto the socket
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if sink.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(session = %session_id, %error, "websocket error");
                break;
            }
        };
        match message {
            Message::Text(text) => {
                let emissions = state.injector.process(
                    failure_injector::Direction::Inbound,
                    &session_id,
                    text.to_string(),
                );
                for emission in emissions {
                    if !emission.delay.is_zero() {
                        tokio::time::sleep(emission.delay).await;
                    }
                    if let Some(reply) =
                        dispatch::handle_frame(&state, &session_id, &emission.payload).await
                    {
                        state.send_to_session(&session_id, &reply);
                    }
                }
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
            Message::Binary(_) => {
                tracing::warn!(session = %session_id, "binary frames are not supported");
            }
        }
    }

    // Teardown: socket state goes away, engine state stays
    state.sessions.unregister(&session_id);
    state.scheduler.cancel_session(session_id.clone());
    state.injector.session_closed(&session_id);
    writer.abort();
    tracing::info!(session = %session_id, "client disconnected");
}
