//! Identity registry: which live connections are bound to which identity
//!
//! Every authenticated connection joins the fan-out group of its identity and
//! holds a [`Membership`] for as long as it lives. Dropping the membership
//! removes the connection, and the group itself once it is empty, so the
//! table never holds entries for closed connections.

use crate::error::DeliveryError;
use dashmap::DashMap;
use signal_relay_protocol::Identity;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique id of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound half of a bound connection
#[derive(Debug, Clone)]
pub struct Peer {
    id: ConnectionId,
    tx: mpsc::Sender<String>,
}

impl Peer {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting for room in the connection's buffer
    pub fn deliver(&self, frame: String) -> Result<(), DeliveryError> {
        self.tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

type Group = HashMap<ConnectionId, mpsc::Sender<String>>;

/// Map of identity -> connections bound to it
#[derive(Debug, Default, Clone)]
pub struct Registry {
    groups: Arc<DashMap<Identity, Group>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection's outbound queue to `identity`
    pub fn join(&self, identity: Identity, tx: mpsc::Sender<String>) -> Membership {
        let id = ConnectionId::new();
        self.groups.entry(identity.clone()).or_default().insert(id, tx);
        tracing::debug!(identity = %identity, connection = %id, "Joined fan-out group");
        Membership {
            registry: self.clone(),
            identity,
            id,
        }
    }

    /// Snapshot of the connections currently bound to `identity`.
    ///
    /// Unknown identities yield an empty list.
    pub fn lookup(&self, identity: &Identity) -> Vec<Peer> {
        self.groups
            .get(identity)
            .map(|group| {
                group
                    .value()
                    .iter()
                    .map(|(id, tx)| Peer {
                        id: *id,
                        tx: tx.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live connections across all identities
    pub fn connection_count(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }

    /// Number of identities with at least one live connection
    pub fn identity_count(&self) -> usize {
        self.groups.len()
    }

    fn leave(&self, identity: &Identity, id: ConnectionId) {
        if let Some(mut group) = self.groups.get_mut(identity) {
            group.value_mut().remove(&id);
        }
        self.groups.remove_if(identity, |_, group| group.is_empty());
        tracing::debug!(identity = %identity, connection = %id, "Left fan-out group");
    }
}

/// A connection's place in the registry, released on drop
#[derive(Debug)]
pub struct Membership {
    registry: Registry,
    identity: Identity,
    id: ConnectionId,
}

impl Membership {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.registry.leave(&self.identity, self.id);
    }
}
