use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use webhook_gateway::services::SheetsSink;
use webhook_gateway::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webhook_gateway=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration. Sink credentials are not validated here; a missing
    // credential only fails when a dispatch reaches the sink.
    let config = Config::from_env()?;
    info!("Loaded configuration, listening on port {}", config.port);

    let sink = SheetsSink::new(config.sink.clone());
    let state = AppState {
        config: config.clone(),
        sink: Arc::new(sink),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting webhook gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGTERM or SIGINT signal for graceful shutdown
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}
