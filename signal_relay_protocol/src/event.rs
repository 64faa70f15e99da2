use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// Events the relay delivers to a target peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    NewCall { caller_id: Identity, sdp_offer: Value },
    CallAnswered { callee: Identity, sdp_answer: Value },
    CallRejected { callee: Identity, reason: Value },
    UserBusy { callee: Identity, message: String },
    MissedCall { caller_id: Identity, message: String },
    IceCandidate { sender: Identity, ice_candidate: Value },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewCall { .. } => "newCall",
            Self::CallAnswered { .. } => "callAnswered",
            Self::CallRejected { .. } => "callRejected",
            Self::UserBusy { .. } => "userBusy",
            Self::MissedCall { .. } => "missedCall",
            Self::IceCandidate { .. } => "iceCandidate",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromStr for ServerEvent {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}
