mod config;
mod dispatch;
mod error;
mod handlers;
mod middleware;
mod router;
mod sessions;
mod state;
mod ticker;
mod ws;

use std::net::SocketAddr;
use tokio::net::TcpListener;

use config::Config;
use router::create_router;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let (state, mut delivery_rx) = AppState::from_config(config)?;

    // Pump: scheduled (delayed) messages come due and join the outbound queue
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        while let Some(delivery) = delivery_rx.recv().await {
            sessions.send_raw(&delivery.session_id, delivery.payload);
        }
    });

    ticker::spawn_tickers(&state);

    tracing::info!(
        symbols = ?state.config.exchange.symbols,
        failures = state.injector.is_enabled(),
        "starting exchange simulator"
    );

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("REST: http://{addr}/api/v1  WebSocket: ws://{addr}/ws");
    axum::serve(listener, app).await?;

    Ok(())
}
