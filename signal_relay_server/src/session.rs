//! Per-connection loop and lifecycle logging
//!
//! A connection is handled by two halves: the reader, which routes inbound
//! frames one at a time, and a writer task that drains the connection's
//! outbound queue onto the socket and sends heartbeat pings.

use crate::auth::{self, HandshakeQuery};
use crate::config::SessionSettings;
use crate::error::SignalingError;
use crate::router;
use crate::state::Registry;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use signal_relay_protocol::Identity;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Lifecycle of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticated,
    /// Bound to its identity; the only state in which frames are routed
    Active,
    Disconnected,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Authenticated)
                | (Connecting, Disconnected)
                | (Authenticated, Active)
                | (Authenticated, Disconnected)
                | (Active, Disconnected)
        )
    }
}

/// Why a connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer sent a close frame
    ClientClose { code: Option<u16>, reason: String },
    /// Socket ended without a close frame
    TransportClose,
    /// Writing to the socket failed
    SendFailure,
    ServerShutdown,
}

impl DisconnectReason {
    fn from_close_frame(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self::ClientClose {
                code: Some(frame.code),
                reason: frame.reason.to_string(),
            },
            None => Self::ClientClose {
                code: None,
                reason: String::new(),
            },
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClose { code: None, .. } => write!(f, "client close"),
            Self::ClientClose {
                code: Some(code),
                reason,
            } if reason.is_empty() => write!(f, "client close ({code})"),
            Self::ClientClose {
                code: Some(code),
                reason,
            } => write!(f, "client close ({code}: {reason})"),
            Self::TransportClose => write!(f, "transport close"),
            Self::SendFailure => write!(f, "send failure"),
            Self::ServerShutdown => write!(f, "server shutdown"),
        }
    }
}

/// A connection attempt that has not yet presented an identity
#[derive(Debug)]
pub struct Handshake {
    state: ConnectionState,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            state: ConnectionState::Connecting,
        }
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the gatekeeper. A refused attempt goes straight to
    /// `Disconnected` and never gets a [`Lifecycle`].
    pub fn authenticate(self, query: &HandshakeQuery) -> Result<Lifecycle, SignalingError> {
        match auth::authenticate(query) {
            Ok(identity) => {
                let mut lifecycle = Lifecycle {
                    identity,
                    state: self.state,
                };
                lifecycle.advance(ConnectionState::Authenticated);
                Ok(lifecycle)
            }
            Err(err) => {
                debug_assert!(self.state.can_transition_to(ConnectionState::Disconnected));
                tracing::trace!(from = ?self.state, to = ?ConnectionState::Disconnected, "Connection state");
                Err(err)
            }
        }
    }
}

/// State and logging for one authenticated connection
#[derive(Debug)]
pub struct Lifecycle {
    identity: Identity,
    state: ConnectionState,
}

impl Lifecycle {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn advance(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        tracing::trace!(identity = %self.identity, from = ?self.state, to = ?next, "Connection state");
        self.state = next;
    }

    fn on_transport_error(&self, err: &axum::Error) {
        tracing::error!(identity = %self.identity, error = %err, "Socket error");
    }

    fn on_disconnect(&mut self, reason: &DisconnectReason) {
        self.advance(ConnectionState::Disconnected);
        tracing::info!(identity = %self.identity, reason = %reason, "User disconnected");
    }
}

/// Drive an upgraded connection until it closes.
pub async fn run(
    socket: WebSocket,
    mut lifecycle: Lifecycle,
    registry: Registry,
    settings: SessionSettings,
    mut shutdown: watch::Receiver<bool>,
) -> DisconnectReason {
    let identity = lifecycle.identity().clone();

    let (tx, rx) = mpsc::channel(settings.max_send_queue);
    let membership = registry.join(identity, tx);
    lifecycle.advance(ConnectionState::Active);
    tracing::info!(
        identity = %membership.identity(),
        connection = %membership.id(),
        "User connected"
    );

    let (ws_tx, mut ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_loop(ws_tx, rx, settings.heartbeat_interval));

    let reason = loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    router::dispatch(&membership, text.as_str());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    tracing::debug!(identity = %membership.identity(), len = bytes.len(), "Ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => break DisconnectReason::from_close_frame(frame),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(err)) => lifecycle.on_transport_error(&err),
                None => break DisconnectReason::TransportClose,
            },
            _ = &mut writer => break DisconnectReason::SendFailure,
            _ = shutdown_requested(&mut shutdown) => break DisconnectReason::ServerShutdown,
        }
    };

    // Unbind before tearing down the writer so no new deliveries are queued.
    drop(membership);
    writer.abort();

    lifecycle.on_disconnect(&reason);
    reason
}

/// Resolves once the server asks connections to close
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<String>,
    heartbeat: Duration,
) {
    let mut ping_interval = tokio::time::interval(heartbeat);
    ping_interval.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(text) => {
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = ping_interval.tick() => {
                if ws_tx.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }
}
