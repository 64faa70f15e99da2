//! Error types for the signaling relay

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur while accepting connections or running the server
#[derive(Error, Debug)]
pub enum SignalingError {
    /// Handshake carried no usable identity
    #[error("Unauthorized: Missing callerId")]
    Unauthorized,

    /// Listener could not be bound or inspected
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid process configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl IntoResponse for SignalingError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Io(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Errors from reading the environment
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PORT value `{0}`")]
    InvalidPort(String),
}

/// A single delivery to one connection failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The connection's send queue is full
    #[error("send queue full")]
    QueueFull,

    /// The connection has gone away
    #[error("connection closed")]
    Closed,
}
