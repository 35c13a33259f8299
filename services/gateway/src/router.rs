use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{account, admin, market, orders};
use crate::middleware::{rest_latency, rest_rate_limit};
use crate::state::AppState;
use crate::ws;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/symbols", get(market::symbols))
        .route("/ticker", get(market::ticker))
        .route("/prices", get(market::prices))
        .route("/orders", post(orders::create).get(orders::list))
        .route("/orders/:id", get(orders::get).delete(orders::cancel))
        .route("/balance", get(account::balance))
        .route("/position", get(account::position))
        .route("/admin/failures", get(admin::failure_stats))
        .route("/admin/failures/reset", post(admin::reset_failures))
        .layer(from_fn_with_state(state.clone(), rest_latency))
        .layer(from_fn_with_state(state.clone(), rest_rate_limit));

    Router::new()
        .route("/health", get(market::health))
        .nest("/api/v1", api_routes)
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
