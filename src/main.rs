use daily_habits::{AppState, Config, JsonFileStore, clock::SystemClock, router};
use std::{future::IntoFuture, net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    fs::create_dir_all(&config.data_dir).await?;

    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::load(config, Arc::new(SystemClock), store).await;
    let ticker = Arc::clone(&state.ticker);

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::select! {
        served = axum::serve(listener, router(state)).into_future() => served?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    ticker.stop();

    Ok(())
}
