//! Signaling relay entry point

use signal_relay_server::{ServerConfig, start};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");
    let handle = start(config).await.expect("Failed to start server");

    tracing::info!(
        "Server running on http://localhost:{}",
        handle.local_addr().port()
    );

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
    handle.shutdown().await;
}
