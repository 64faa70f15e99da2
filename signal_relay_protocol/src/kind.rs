use std::fmt;

/// Inbound event kinds, together with the routing table the relay applies to
/// each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MakeCall,
    AnswerCall,
    RejectCall,
    UserBusy,
    MissedCall,
    IceCandidate,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::MakeCall,
        Self::AnswerCall,
        Self::RejectCall,
        Self::UserBusy,
        Self::MissedCall,
        Self::IceCandidate,
    ];

    /// Look up an inbound event name. `IceCandidate` is accepted for older
    /// clients that capitalised it.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "makeCall" => Some(Self::MakeCall),
            "answerCall" => Some(Self::AnswerCall),
            "rejectCall" => Some(Self::RejectCall),
            "userBusy" => Some(Self::UserBusy),
            "missedCall" => Some(Self::MissedCall),
            "iceCandidate" | "IceCandidate" => Some(Self::IceCandidate),
            _ => None,
        }
    }

    /// Canonical inbound event name
    pub const fn name(self) -> &'static str {
        match self {
            Self::MakeCall => "makeCall",
            Self::AnswerCall => "answerCall",
            Self::RejectCall => "rejectCall",
            Self::UserBusy => "userBusy",
            Self::MissedCall => "missedCall",
            Self::IceCandidate => "iceCandidate",
        }
    }

    /// Fields that must be present (non-null, non-empty) before forwarding
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::MakeCall => &["calleeId", "sdpOffer"],
            Self::AnswerCall => &["callerId", "sdpAnswer"],
            Self::RejectCall | Self::UserBusy => &["callerId"],
            Self::MissedCall => &["calleeId"],
            Self::IceCandidate => &["calleeId", "iceCandidate"],
        }
    }

    /// Payload field holding the identity to deliver to
    pub const fn target_field(self) -> &'static str {
        match self {
            Self::MakeCall | Self::MissedCall | Self::IceCandidate => "calleeId",
            Self::AnswerCall | Self::RejectCall | Self::UserBusy => "callerId",
        }
    }

    /// Name of the event delivered to the target
    pub const fn outbound_name(self) -> &'static str {
        match self {
            Self::MakeCall => "newCall",
            Self::AnswerCall => "callAnswered",
            Self::RejectCall => "callRejected",
            Self::UserBusy => "userBusy",
            Self::MissedCall => "missedCall",
            Self::IceCandidate => "iceCandidate",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
