//! Data Transfer Objects (DTOs) for the signaling relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: signaling envelopes exchanged over the WebSocket
//! - `http`: inspection API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
