//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement the client's side of
//! the handshake without side effects, making them easy to test.

use serde_json::{Value, json};
use url::Url;
use teleconsult_server::{
    domain::Role,
    infrastructure::dto::websocket::{ClientSignal, ServerEvent},
};

use crate::error::ClientError;

/// Build the WebSocket URL carrying the join parameters.
///
/// `room` and `role` are percent-encoded into the query; any query already on
/// `base` is kept.
pub fn connect_url(base: &str, room: &str, role: Role) -> Result<String, ClientError> {
    let mut url =
        Url::parse(base).map_err(|e| ClientError::InvalidUrl(base.to_string(), e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("room", room)
        .append_pair("role", role.as_str());
    Ok(url.into())
}

/// A frame the user (or the handshake logic) wants to send
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Signal(ClientSignal),
    /// Arbitrary JSON object typed in by the user
    Raw(Value),
}

impl Outgoing {
    pub fn is_leave(&self) -> bool {
        matches!(self, Outgoing::Signal(ClientSignal::Leave))
    }

    /// The `type` this frame carries on the wire
    pub fn kind(&self) -> &str {
        match self {
            Outgoing::Signal(signal) => signal_kind(signal),
            Outgoing::Raw(value) => value.get("type").and_then(Value::as_str).unwrap_or("raw"),
        }
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        match self {
            Outgoing::Signal(signal) => Ok(serde_json::to_string(signal)?),
            Outgoing::Raw(value) => Ok(value.to_string()),
        }
    }
}

pub fn signal_kind(signal: &ClientSignal) -> &'static str {
    match signal {
        ClientSignal::Join { .. } => "join",
        ClientSignal::Offer { .. } => "offer",
        ClientSignal::Answer { .. } => "answer",
        ClientSignal::Candidate { .. } => "candidate",
        ClientSignal::Leave => "leave",
    }
}

/// Parse one line of user input.
///
/// Accepted forms:
/// - `offer <sdp>` / `answer <sdp>`
/// - `candidate <json-or-text>`
/// - `leave`
/// - a raw JSON object with a string `type`
pub fn parse_command(line: &str) -> Result<Outgoing, String> {
    let line = line.trim();
    if line.starts_with('{') {
        let value: Value =
            serde_json::from_str(line).map_err(|e| format!("Invalid JSON: {}", e))?;
        return match value.get("type") {
            Some(Value::String(_)) => Ok(Outgoing::Raw(value)),
            _ => Err("JSON message needs a string \"type\" field".to_string()),
        };
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let signal = match command.to_ascii_lowercase().as_str() {
        "offer" => ClientSignal::Offer {
            sdp: session_description("offer", required(rest, "offer")?),
        },
        "answer" => ClientSignal::Answer {
            sdp: session_description("answer", required(rest, "answer")?),
        },
        "candidate" => {
            let rest = required(rest, "candidate")?;
            let candidate = serde_json::from_str(rest).unwrap_or_else(|_| json!(rest));
            ClientSignal::Candidate { candidate }
        }
        "leave" => ClientSignal::Leave,
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(Outgoing::Signal(signal))
}

fn required<'a>(rest: &'a str, command: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("Usage: {} <payload>", command))
    } else {
        Ok(rest)
    }
}

/// RTCSessionDescription-shaped payload
fn session_description(kind: &str, sdp: &str) -> Value {
    json!({ "type": kind, "sdp": sdp })
}

/// Offer sent automatically by a patient once a doctor is present
pub fn placeholder_offer() -> ClientSignal {
    ClientSignal::Offer {
        sdp: session_description("offer", "v=0 teleconsult-client"),
    }
}

/// An inbound text frame, classified
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Notification generated by the relay
    Event(ServerEvent),
    /// Signal forwarded from the peer
    Signal(ClientSignal),
    /// Anything else (forwarded unknown types, non-JSON)
    Other(String),
}

pub fn classify(text: &str) -> Inbound {
    if let Ok(event) = serde_json::from_str::<ServerEvent>(text) {
        return Inbound::Event(event);
    }
    if let Ok(signal) = serde_json::from_str::<ClientSignal>(text) {
        return Inbound::Signal(signal);
    }
    Inbound::Other(text.to_string())
}

/// Client side of the handshake.
///
/// The relay only tells the existing participant that someone joined, so the
/// doctor re-announces itself with a `join` that reaches the patient through
/// the relay. The patient offers once, on whichever signal arrives first.
#[derive(Debug)]
pub struct Handshake {
    role: Role,
    offered: bool,
}

impl Handshake {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            offered: false,
        }
    }

    /// Decide the automatic reply, if any, to an inbound frame.
    pub fn react(&mut self, inbound: &Inbound) -> Option<ClientSignal> {
        match self.role {
            Role::Patient => {
                let doctor_present = matches!(
                    inbound,
                    Inbound::Event(ServerEvent::PeerJoined { .. })
                        | Inbound::Event(ServerEvent::DoctorJoined)
                        | Inbound::Signal(ClientSignal::Join { role: Role::Doctor })
                );
                if doctor_present && !self.offered {
                    self.offered = true;
                    Some(placeholder_offer())
                } else {
                    None
                }
            }
            Role::Doctor => match inbound {
                Inbound::Event(ServerEvent::PeerJoined { .. }) => {
                    Some(ClientSignal::Join { role: Role::Doctor })
                }
                _ => None,
            },
        }
    }
}

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Rejected(_) | ClientError::Encode(_) | ClientError::InvalidUrl(..)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
