//! Error types for decoding signaling frames

use crate::kind::EventKind;
use thiserror::Error;

/// An identity string was empty
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("identity must not be empty")]
pub struct EmptyIdentity;

/// Reasons an inbound frame is rejected before routing
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame was not valid JSON or had no `event` name
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event name is not part of the signaling surface
    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    /// `data` was missing or not a JSON object
    #[error("{kind} payload is not an object")]
    NotAnObject { kind: EventKind },

    /// A required field was absent, null or empty
    #[error("{kind} payload is missing `{field}`")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },

    /// A field was present but had the wrong JSON type
    #[error("{kind} payload has an invalid `{field}`")]
    InvalidField {
        kind: EventKind,
        field: &'static str,
    },
}

impl DecodeError {
    /// The event kind the frame claimed to be, if it got that far
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::Json(_) | Self::UnknownEvent(_) => None,
            Self::NotAnObject { kind }
            | Self::MissingField { kind, .. }
            | Self::InvalidField { kind, .. } => Some(*kind),
        }
    }
}
