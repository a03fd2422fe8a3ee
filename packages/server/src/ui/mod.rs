//! Signaling server (axum) implementation.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{DEFAULT_MAX_MESSAGE_BYTES, Server};
