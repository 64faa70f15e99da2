//! WebSocket signaling relay for one-to-one calls
//!
//! Peers connect with an identity and exchange the messages needed to set up
//! a direct call (offer, answer, ICE candidates, and busy/reject/missed
//! notices). The relay only validates and forwards; it carries no media and
//! keeps no call state.
//!
//! # Protocol
//!
//! - **GET /ws?callerId={id}** - Connect as `id`. Several connections may
//!   share an identity; all of them receive what is sent to it.
//! - **GET /health** - Health check
//!
//! Frames in both directions are JSON text:
//! ```json
//! {"event": "makeCall", "data": {"calleeId": "bob", "sdpOffer": "..."}}
//! ```
//! See [`signal_relay_protocol`] for the full event table.
//!
//! # Example
//!
//! ```bash
//! # Start the server
//! PORT=8080 signal-relay-server
//!
//! # Connect as alice and call bob
//! websocat "ws://127.0.0.1:8080/ws?callerId=alice"
//! {"event":"makeCall","data":{"calleeId":"bob","sdpOffer":"v=0..."}}
//! ```
//!
//! Delivery is best effort: nothing is retried, and a call waits for an
//! answer for as long as the caller chooses to.

#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use config::{ServerConfig, SessionSettings};
pub use error::{ConfigError, DeliveryError, SignalingError};
pub use server::{ServerHandle, start};
pub use state::{ConnectionId, Membership, Registry};
