//! Wire contract for the call signaling relay
//!
//! Peers connect over a WebSocket and exchange JSON text frames of the form
//! `{"event": <name>, "data": <object>}`.
//!
//! # Client → server
//!
//! | Event          | Required fields              | Routed to  |
//! |----------------|------------------------------|------------|
//! | `makeCall`     | `calleeId`, `sdpOffer`       | `calleeId` |
//! | `answerCall`   | `callerId`, `sdpAnswer`      | `callerId` |
//! | `rejectCall`   | `callerId` (+ `reason`)      | `callerId` |
//! | `userBusy`     | `callerId`                   | `callerId` |
//! | `missedCall`   | `calleeId`                   | `calleeId` |
//! | `iceCandidate` | `calleeId`, `iceCandidate`   | `calleeId` |
//!
//! # Server → client
//!
//! - `{"event": "newCall", "data": {"callerId", "sdpOffer"}}`
//! - `{"event": "callAnswered", "data": {"callee", "sdpAnswer"}}`
//! - `{"event": "callRejected", "data": {"callee", "reason"}}`
//! - `{"event": "userBusy", "data": {"callee", "message"}}`
//! - `{"event": "missedCall", "data": {"callerId", "message"}}`
//! - `{"event": "iceCandidate", "data": {"sender", "iceCandidate"}}`
//!
//! The sender identity in every outbound event is the one the relay bound to
//! the sending connection, never a value taken from the payload.

#![forbid(unsafe_code)]

mod error;
mod event;
mod identity;
mod kind;
mod message;

pub use error::{DecodeError, EmptyIdentity};
pub use event::ServerEvent;
pub use identity::Identity;
pub use kind::EventKind;
pub use message::{
    BUSY_MESSAGE, DEFAULT_REJECT_REASON, Frame, MISSED_CALL_MESSAGE, SignalMessage, decode,
};
