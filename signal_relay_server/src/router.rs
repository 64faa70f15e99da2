//! Event router: validates inbound frames and forwards them to their target
//!
//! Each frame is decoded against the routing table in
//! [`signal_relay_protocol::EventKind`]; anything invalid is logged and
//! dropped without a reply. Valid messages are stamped with the sending
//! connection's identity and queued on every other connection bound to the
//! target. Deliveries never wait on the recipient.

use crate::state::Membership;
use signal_relay_protocol::{EventKind, SignalMessage, decode};

/// Route one text frame from `origin`. Returns the number of connections the
/// resulting event was queued on.
pub fn dispatch(origin: &Membership, text: &str) -> usize {
    match decode(text) {
        Ok(message) => route(origin, message),
        Err(err) => {
            tracing::warn!(
                identity = %origin.identity(),
                event = err.kind().map(EventKind::name),
                error = %err,
                "Dropping invalid signaling message"
            );
            0
        }
    }
}

/// Forward an already validated message
pub fn route(origin: &Membership, message: SignalMessage) -> usize {
    let sender = origin.identity();
    let target = message.target().clone();
    log_message(&message, sender.as_str());

    // The sending connection never hears its own message, but other
    // connections sharing its identity do.
    let peers: Vec<_> = origin
        .registry()
        .lookup(&target)
        .into_iter()
        .filter(|peer| peer.id() != origin.id())
        .collect();

    if peers.is_empty() {
        tracing::debug!(sender = %sender, recipient = %target, "No live connections for target");
        return 0;
    }

    let event = message.into_event(sender.clone());
    let frame = event.to_string();

    let mut delivered = 0;
    for peer in peers {
        match peer.deliver(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(err) => tracing::warn!(
                recipient = %target,
                connection = %peer.id(),
                event = event.name(),
                error = %err,
                "Dropped delivery"
            ),
        }
    }
    tracing::trace!(event = event.name(), recipient = %target, delivered, "Delivered");
    delivered
}

fn log_message(message: &SignalMessage, sender: &str) {
    let target = message.target();
    match message {
        SignalMessage::CallOffer { .. } => {
            tracing::info!("User {sender} is calling {target}")
        }
        SignalMessage::CallAnswer { .. } => {
            tracing::info!("User {sender} answered call from {target}")
        }
        SignalMessage::CallRejection { .. } => {
            tracing::info!("User {sender} rejected call from {target}")
        }
        SignalMessage::BusyNotice { .. } => {
            tracing::info!("User {sender} is busy for {target}")
        }
        SignalMessage::MissedCallNotice { .. } => {
            tracing::info!("Call from {sender} to {target} missed")
        }
        SignalMessage::IceCandidate { .. } => {
            tracing::debug!("User {sender} sent ICE candidate to {target}")
        }
    }
}
