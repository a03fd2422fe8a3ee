//! Message formatting utilities for client display.

use teleconsult_server::infrastructure::dto::websocket::{ClientSignal, ServerEvent};
use teleconsult_shared::time::timestamp_to_rfc3339;

use super::domain::signal_kind;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the banner shown once the connection is open
    pub fn format_connected(room: &str, role: &str) -> String {
        format!(
            "\n============================================================\n\
             Joined room '{}' as {}\n\
             Commands: offer <sdp> | answer <sdp> | candidate <json> | leave | {{json}}\n\
             ============================================================\n",
            room, role
        )
    }

    /// Format a notification generated by the relay
    pub fn format_event(event: &ServerEvent) -> String {
        match event {
            ServerEvent::Wait { msg } => format!("\n… {}\n", msg),
            ServerEvent::PeerJoined { role } => format!("\n+ {} joined\n", role),
            ServerEvent::DoctorJoined => "\n+ doctor joined\n".to_string(),
            ServerEvent::Left => "\n- peer left\n".to_string(),
            ServerEvent::Error { msg } => format!("\n! {}\n", msg),
        }
    }

    /// Format a signal forwarded from the peer
    ///
    /// # Arguments
    ///
    /// * `signal` - The decoded signal
    /// * `received_at` - Unix timestamp when the signal arrived (milliseconds)
    pub fn format_signal(signal: &ClientSignal, received_at: i64) -> String {
        let payload = match signal {
            ClientSignal::Offer { sdp } | ClientSignal::Answer { sdp } => sdp.to_string(),
            ClientSignal::Candidate { candidate } => candidate.to_string(),
            ClientSignal::Join { role } => format!("role={}", role),
            ClientSignal::Leave => String::new(),
        };
        format!(
            "\n← {} from peer at {}\n  {}\n",
            signal_kind(signal),
            timestamp_to_rfc3339(received_at),
            payload
        )
    }

    /// Format a confirmation after sending
    pub fn format_sent(kind: &str, sent_at: i64) -> String {
        format!("→ {} sent at {}\n", kind, timestamp_to_rfc3339(sent_at))
    }

    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when classification fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
