use panen_dashboard::{ApiClient, AppState, Config, ViewController, load_store, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = load_store(&config.data_path).await;

    let client = ApiClient::new(&config.api_url, config.http_timeout)?;
    let controller = ViewController::new(client, config.sections.clone(), config.roster.clone());
    info!(api = %config.api_url, sections = ?config.sections, "dashboard backend configured");
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(store, controller, config);

    let app = router(state);
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
