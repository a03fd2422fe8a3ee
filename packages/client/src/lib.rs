//! CLI signaling peer for the teleconsult relay.

mod domain;
pub mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::{ClientConfig, run_client};
