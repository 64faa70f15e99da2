use crate::{error::DecodeError, event::ServerEvent, identity::Identity, kind::EventKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// Reason sent with `callRejected` when the callee gave none
pub const DEFAULT_REJECT_REASON: &str = "Call rejected by the callee.";
/// Message sent with every `userBusy`
pub const BUSY_MESSAGE: &str = "The callee is currently busy.";
/// Message sent with every `missedCall`
pub const MISSED_CALL_MESSAGE: &str = "You have a missed call.";

/// Raw frame as it appears on the socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// A validated inbound signaling message.
///
/// Only the target is carried; the sender is whatever identity the relay
/// bound to the connection the message arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    CallOffer {
        callee: Identity,
        sdp_offer: Value,
    },
    CallAnswer {
        caller: Identity,
        sdp_answer: Value,
    },
    CallRejection {
        caller: Identity,
        /// Forwarded as given when truthy, any JSON type
        reason: Option<Value>,
    },
    BusyNotice {
        caller: Identity,
    },
    MissedCallNotice {
        callee: Identity,
    },
    IceCandidate {
        callee: Identity,
        ice_candidate: Value,
    },
}

/// Parse and validate a text frame
pub fn decode(text: &str) -> Result<SignalMessage, DecodeError> {
    let frame: Frame = serde_json::from_str(text)?;
    let kind =
        EventKind::from_name(&frame.event).ok_or(DecodeError::UnknownEvent(frame.event))?;
    SignalMessage::from_payload(kind, &frame.data)
}

impl SignalMessage {
    /// Validate a payload against the routing table entry for `kind`.
    pub fn from_payload(kind: EventKind, data: &Value) -> Result<Self, DecodeError> {
        let fields = data.as_object().ok_or(DecodeError::NotAnObject { kind })?;

        for &field in kind.required_fields() {
            if !is_present(fields.get(field)) {
                return Err(DecodeError::MissingField { kind, field });
            }
        }

        let target = target_identity(kind, fields)?;
        let opaque = |name: &str| fields.get(name).cloned().unwrap_or_default();

        Ok(match kind {
            EventKind::MakeCall => Self::CallOffer {
                callee: target,
                sdp_offer: opaque("sdpOffer"),
            },
            EventKind::AnswerCall => Self::CallAnswer {
                caller: target,
                sdp_answer: opaque("sdpAnswer"),
            },
            EventKind::RejectCall => Self::CallRejection {
                caller: target,
                reason: fields.get("reason").filter(|v| is_present(Some(*v))).cloned(),
            },
            EventKind::UserBusy => Self::BusyNotice { caller: target },
            EventKind::MissedCall => Self::MissedCallNotice { callee: target },
            EventKind::IceCandidate => Self::IceCandidate {
                callee: target,
                ice_candidate: opaque("iceCandidate"),
            },
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::CallOffer { .. } => EventKind::MakeCall,
            Self::CallAnswer { .. } => EventKind::AnswerCall,
            Self::CallRejection { .. } => EventKind::RejectCall,
            Self::BusyNotice { .. } => EventKind::UserBusy,
            Self::MissedCallNotice { .. } => EventKind::MissedCall,
            Self::IceCandidate { .. } => EventKind::IceCandidate,
        }
    }

    /// Identity the message is addressed to
    pub fn target(&self) -> &Identity {
        match self {
            Self::CallOffer { callee, .. }
            | Self::MissedCallNotice { callee }
            | Self::IceCandidate { callee, .. } => callee,
            Self::CallAnswer { caller, .. }
            | Self::CallRejection { caller, .. }
            | Self::BusyNotice { caller } => caller,
        }
    }

    /// Build the event delivered to the target, stamped with `sender`
    pub fn into_event(self, sender: Identity) -> ServerEvent {
        match self {
            Self::CallOffer { sdp_offer, .. } => ServerEvent::NewCall {
                caller_id: sender,
                sdp_offer,
            },
            Self::CallAnswer { sdp_answer, .. } => ServerEvent::CallAnswered {
                callee: sender,
                sdp_answer,
            },
            Self::CallRejection { reason, .. } => ServerEvent::CallRejected {
                callee: sender,
                reason: reason.unwrap_or_else(|| Value::from(DEFAULT_REJECT_REASON)),
            },
            Self::BusyNotice { .. } => ServerEvent::UserBusy {
                callee: sender,
                message: BUSY_MESSAGE.to_string(),
            },
            Self::MissedCallNotice { .. } => ServerEvent::MissedCall {
                caller_id: sender,
                message: MISSED_CALL_MESSAGE.to_string(),
            },
            Self::IceCandidate { ice_candidate, .. } => ServerEvent::IceCandidate {
                sender,
                ice_candidate,
            },
        }
    }

    /// Client-side encoding of the message as a frame
    pub fn to_frame(&self) -> Frame {
        let target = self.target().as_str();
        let data = match self {
            Self::CallOffer { sdp_offer, .. } => json!({"calleeId": target, "sdpOffer": sdp_offer}),
            Self::CallAnswer { sdp_answer, .. } => {
                json!({"callerId": target, "sdpAnswer": sdp_answer})
            }
            Self::CallRejection { reason, .. } => match reason {
                Some(reason) => json!({"callerId": target, "reason": reason}),
                None => json!({"callerId": target}),
            },
            Self::BusyNotice { .. } => json!({"callerId": target}),
            Self::MissedCallNotice { .. } => json!({"calleeId": target}),
            Self::IceCandidate { ice_candidate, .. } => {
                json!({"calleeId": target, "iceCandidate": ice_candidate})
            }
        };
        Frame {
            event: self.kind().name().to_string(),
            data,
        }
    }
}

impl fmt::Display for SignalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.to_frame()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// JavaScript truthiness: absent, null, `false`, `0` and `""` count as missing.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

fn target_identity(kind: EventKind, fields: &Map<String, Value>) -> Result<Identity, DecodeError> {
    let field = kind.target_field();
    fields
        .get(field)
        .and_then(Value::as_str)
        .and_then(Identity::new)
        .ok_or(DecodeError::InvalidField { kind, field })
}
