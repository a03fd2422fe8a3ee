//! WebSocket message DTOs.
//!
//! Every frame is a JSON object whose `type` field discriminates the message.
//! Offer / answer / candidate payloads are opaque to the relay and are
//! forwarded as the exact text the sender produced.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::Role;

/// Message type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Join,
    Wait,
    PeerJoined,
    DoctorJoined,
    Offer,
    Answer,
    Candidate,
    Leave,
    Left,
    Error,
    /// Any type the relay does not recognize; still forwarded verbatim
    #[serde(other)]
    Unknown,
}

/// Minimal view of an inbound frame: only the discriminator is inspected.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalEnvelope {
    pub r#type: MessageType,
}

impl SignalEnvelope {
    /// Parse the discriminator of an inbound text frame.
    ///
    /// Fails unless the frame is a JSON object with a string `type` field.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Server → client notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Doctor connected but no patient present yet
    Wait { msg: String },
    /// The counterpart joined the room; `role` is the joiner's role
    PeerJoined { role: Role },
    /// Legacy alias of `PeerJoined` sent by older relays to the patient
    DoctorJoined,
    /// The counterpart left the room
    Left,
    /// Join rejected
    Error { msg: String },
}

impl ServerEvent {
    pub fn wait() -> Self {
        ServerEvent::Wait {
            msg: "Waiting for patient".to_string(),
        }
    }

    pub fn peer_joined(role: Role) -> Self {
        ServerEvent::PeerJoined { role }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        ServerEvent::Error { msg: msg.into() }
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> String {
        let value = match self {
            ServerEvent::Wait { msg } => json!({ "type": "wait", "msg": msg }),
            ServerEvent::PeerJoined { role } => {
                json!({ "type": "peer-joined", "role": role.as_str() })
            }
            ServerEvent::DoctorJoined => json!({ "type": "doctor-joined" }),
            ServerEvent::Left => json!({ "type": "left" }),
            ServerEvent::Error { msg } => json!({ "type": "error", "msg": msg }),
        };
        value.to_string()
    }
}

/// Client → server signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientSignal {
    /// Explicit join confirmation (join is already implied by the query string)
    Join { role: Role },
    /// SDP offer
    Offer { sdp: Value },
    /// SDP answer
    Answer { sdp: Value },
    /// ICE candidate
    Candidate { candidate: Value },
    /// Graceful leave
    Leave,
}
