//! CLI signaling peer with reconnection support.
//!
//! Joins a consultation room as patient or doctor, prints every message the
//! relay delivers, and sends offer / answer / candidate / leave commands read
//! from stdin. A patient sends a placeholder offer as soon as a doctor is
//! present, so two clients complete the signaling exchange on their own.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin teleconsult-client -- --room r1 --role doctor
//! cargo run --bin teleconsult-client -- -r r1 -R patient
//! ```

use std::time::Duration;

use clap::Parser;
use teleconsult_client::{ClientConfig, run_client};
use teleconsult_server::domain::Role;
use teleconsult_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "teleconsult-client")]
#[command(about = "CLI signaling peer for the teleconsult relay", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Role in the room (patient or doctor)
    #[arg(short = 'R', long)]
    role: Role,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Maximum number of connection attempts
    #[arg(long, default_value_t = 5)]
    max_reconnect: u32,

    /// Seconds to wait between connection attempts
    #[arg(long, default_value_t = 5)]
    reconnect_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &["teleconsult-client"], "info");

    let args = Args::parse();

    let config = ClientConfig {
        url: args.url,
        room: args.room,
        role: args.role,
        max_reconnect_attempts: args.max_reconnect,
        reconnect_interval: Duration::from_secs(args.reconnect_interval_secs),
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
