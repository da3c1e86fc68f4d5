use calorie_tracker::{router, AppConfig, AppState, JsonFileStore, Tracker};
use chrono::Local;
use std::net::SocketAddr;
use tokio::fs;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = JsonFileStore::open(config.data_path.clone()).await;
    info!(path = %store.path().display(), "state loaded");

    let tracker = Tracker::open(store, Local::now()).await;
    if tracker.goals().is_first_run() {
        warn!("no goals saved yet; defaults apply until PUT /api/goals");
    }

    let app = router(AppState::new(tracker)).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
