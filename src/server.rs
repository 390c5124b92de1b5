use anyhow::Result;
use tokio::net::TcpListener;

use crate::{
    config::ServerConfig,
    handlers::{self, AppState},
};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, handlers::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}
