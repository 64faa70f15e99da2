use crate::config::ServerConfig;
use crate::error::SignalingError;
use crate::handler::{AppState, build_router};
use crate::session::shutdown_requested;
use crate::state::Registry;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Bind the listener and start serving. Returns a handle to shut it down.
pub async fn start(config: ServerConfig) -> Result<ServerHandle, SignalingError> {
    let registry = Registry::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState {
        registry: registry.clone(),
        session: config.session,
        shutdown: shutdown_rx.clone(),
    };
    let router = build_router(state, config.static_dir.as_deref());

    let listener = TcpListener::bind((config.host, config.port)).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(port = local_addr.port(), "Signaling server listening");

    let mut stop = shutdown_rx;
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown_requested(&mut stop).await })
            .await;
        if let Err(err) = result {
            tracing::error!(error = %err, "Server stopped with error");
        }
    });

    Ok(ServerHandle {
        local_addr,
        registry,
        shutdown: shutdown_tx,
        server,
    })
}

/// Handle returned by `start()`; keeps the server task alive.
pub struct ServerHandle {
    local_addr: SocketAddr,
    registry: Registry,
    shutdown: watch::Sender<bool>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Close every connection and wait for the listener to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.server.await {
            tracing::error!(error = %err, "Server task failed");
        }
    }
}
