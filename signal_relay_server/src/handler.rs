//! HTTP routes for the signaling relay
//!
//! - **GET /ws?callerId={id}** - WebSocket upgrade, refused with 401 when
//!   `callerId` is missing or empty
//! - **GET /health** - Health check
//! - anything else - static assets, when a static directory is configured

use crate::auth::HandshakeQuery;
use crate::config::SessionSettings;
use crate::session::{self, Handshake};
use crate::state::Registry;
use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::path::Path;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared state passed to handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub session: SessionSettings,
    pub shutdown: watch::Receiver<bool>,
}

/// Build the router with all routes.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// Authenticate the handshake, then upgrade.
///
/// The identity check runs first so an unauthenticated request is refused
/// with 401 whether or not it is a valid upgrade. A query string that does
/// not parse carries no identity.
async fn ws_handler(
    query: Result<Query<HandshakeQuery>, QueryRejection>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unparseable handshake query");
            HandshakeQuery::default()
        }
    };

    let lifecycle = match Handshake::new().authenticate(&query) {
        Ok(lifecycle) => lifecycle,
        Err(err) => return err.into_response(),
    };
    let identity = lifecycle.identity().clone();

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(identity = %identity, "Handshake is not a WebSocket upgrade");
            return rejection.into_response();
        }
    };

    ws.on_failed_upgrade({
        let identity = identity.clone();
        move |err| tracing::error!(identity = %identity, error = %err, "WebSocket upgrade failed")
    })
    .on_upgrade(move |socket| async move {
        session::run(
            socket,
            lifecycle,
            state.registry,
            state.session,
            state.shutdown,
        )
        .await;
    })
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
