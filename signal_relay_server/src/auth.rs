//! Connection gatekeeper: checks the handshake identity before upgrade

use crate::error::SignalingError;
use serde::Deserialize;
use signal_relay_protocol::Identity;

/// Query parameters of the WebSocket handshake
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HandshakeQuery {
    #[serde(rename = "callerId")]
    pub caller_id: Option<String>,
}

/// Extract the identity a connection will be bound to.
///
/// Fails with [`SignalingError::Unauthorized`] when `callerId` is absent or
/// empty, in which case nothing has been registered.
pub fn authenticate(query: &HandshakeQuery) -> Result<Identity, SignalingError> {
    match query.caller_id.clone().and_then(Identity::new) {
        Some(identity) => {
            tracing::info!(identity = %identity, "User authenticated");
            Ok(identity)
        }
        None => {
            tracing::warn!("Connection attempt without callerId");
            Err(SignalingError::Unauthorized)
        }
    }
}
