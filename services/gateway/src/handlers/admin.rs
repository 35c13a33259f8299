//! Failure-injection admin surface
//!
//! Exposes per-strategy counters and a reset, so test harnesses can assert
//! on what the pipeline actually did to their traffic.

use axum::extract::State;
use axum::Json;
use failure_injector::InjectorStats;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn failure_stats(State(state): State<AppState>) -> Json<InjectorStats> {
    Json(state.injector.statistics())
}

pub async fn reset_failures(State(state): State<AppState>) -> Json<Value> {
    state.injector.reset();
    if let Some(limiter) = &state.rest_limiter {
        limiter.reset();
    }
    Json(json!({"status": "reset"}))
}
