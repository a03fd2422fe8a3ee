//! WebRTC signaling relay for two-party consultations.
//!
//! Pairs one patient and one doctor per room and forwards their
//! offer / answer / candidate messages to each other.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin teleconsult-server
//! cargo run --bin teleconsult-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use teleconsult_server::{
    infrastructure::repository::InMemoryRoomRegistry,
    ui::{DEFAULT_MAX_MESSAGE_BYTES, Server},
    usecase::{
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        RelaySignalUseCase,
    },
};
use teleconsult_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "teleconsult-server")]
#[command(about = "WebRTC signaling relay pairing a patient and a doctor", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,

    /// Maximum size of a single inbound WebSocket message in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    max_message_bytes: usize,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(
        env!("CARGO_BIN_NAME"),
        &["teleconsult-server"],
        &args.log_level,
    );

    // Initialize dependencies in order:
    // 1. Registry
    // 2. UseCases
    // 3. Server

    // 1. Create Registry (in-memory)
    let registry = Arc::new(InMemoryRoomRegistry::new());

    // 2. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(registry.clone()));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(registry.clone()));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(registry.clone()));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry.clone()));

    // 3. Create and run the server
    let server = Server::new(
        join_room_usecase,
        relay_signal_usecase,
        leave_room_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
    )
    .with_max_message_bytes(args.max_message_bytes);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
