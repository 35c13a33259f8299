//! REST middleware
//!
//! Rate limiting runs before routing; the latency link adds its sampled
//! delay to every REST request when failure injection is on.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use failure_injector::RateDecision;
use types::errors::ExchangeError;
use types::ids::SessionId;

use crate::error::ApiError;
use crate::state::AppState;

/// `X-Session-ID` selects the session; absent defaults to `rest-session`
pub fn session_from_headers(headers: &HeaderMap) -> SessionId {
    headers
        .get("x-session-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(SessionId::new)
        .unwrap_or_else(SessionId::rest_default)
}

pub async fn rest_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.rest_limiter {
        let session_id = session_from_headers(request.headers());
        if let RateDecision::Limited {
            retry_after,
            violation_count,
        } = limiter.check(&session_id)
        {
            tracing::warn!(session = %session_id, violation_count, "rate limited");
            return ApiError(ExchangeError::RateLimited {
                retry_after,
                violation_count,
            })
            .into_response();
        }
    }
    next.run(request).await
}

pub async fn rest_latency(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(latency) = &state.rest_latency {
        let delay = latency.lock().expect("latency lock").sample_delay();
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}
