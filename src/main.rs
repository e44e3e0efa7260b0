//! Server binary: configuration, logging, token sweeper, HTTP listener.

use airguitar_signaling_rs::config::Config;
use airguitar_signaling_rs::routes;
use airguitar_signaling_rs::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired access tokens are swept out of the store.
const TOKEN_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(config));

    // Token expiry sweeper. Rooms themselves are cleaned up eagerly when the
    // last peer leaves; only unredeemed tokens need a periodic sweep.
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweep_state.tokens.purge_expired();
            if purged > 0 {
                tracing::info!(purged, "expired room tokens purged");
            }
        }
    });

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Air Guitar Pro signaling server started");
    tracing::info!("Address: {}", addr);
    tracing::info!("WebSocket: ws://{}/ws", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
