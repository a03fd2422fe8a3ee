//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::RoomRegistry,
    usecase::{
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        RelaySignalUseCase,
    },
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Default upper bound for a single inbound WebSocket message
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// WebRTC signaling relay server
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(InMemoryRoomRegistry::new());
/// let server = Server::with_registry(registry);
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    /// JoinRoomUseCase（Room 参加のユースケース）
    join_room_usecase: Arc<JoinRoomUseCase>,
    /// RelaySignalUseCase（シグナルリレーのユースケース）
    relay_signal_usecase: Arc<RelaySignalUseCase>,
    /// LeaveRoomUseCase（Room 退出のユースケース）
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// GetRoomsUseCase（Room 一覧取得のユースケース）
    get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（Room 詳細取得のユースケース）
    get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    max_message_bytes: usize,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `join_room_usecase` - UseCase for joining a room
    /// * `relay_signal_usecase` - UseCase for relaying signals to the peer
    /// * `leave_room_usecase` - UseCase for leaving a room
    /// * `get_rooms_usecase` - UseCase for getting rooms list
    /// * `get_room_detail_usecase` - UseCase for getting room detail
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        relay_signal_usecase: Arc<RelaySignalUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    ) -> Self {
        Self {
            join_room_usecase,
            relay_signal_usecase,
            leave_room_usecase,
            get_rooms_usecase,
            get_room_detail_usecase,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }

    /// Build every usecase on top of a single registry.
    pub fn with_registry(registry: Arc<dyn RoomRegistry>) -> Self {
        Self::new(
            Arc::new(JoinRoomUseCase::new(registry.clone())),
            Arc::new(RelaySignalUseCase::new(registry.clone())),
            Arc::new(LeaveRoomUseCase::new(registry.clone())),
            Arc::new(GetRoomsUseCase::new(registry.clone())),
            Arc::new(GetRoomDetailUseCase::new(registry)),
        )
    }

    pub fn with_max_message_bytes(mut self, max_message_bytes: usize) -> Self {
        self.max_message_bytes = max_message_bytes;
        self
    }

    /// Build the axum router without binding a socket.
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            join_room_usecase: self.join_room_usecase.clone(),
            relay_signal_usecase: self.relay_signal_usecase.clone(),
            leave_room_usecase: self.leave_room_usecase.clone(),
            get_rooms_usecase: self.get_rooms_usecase.clone(),
            get_room_detail_usecase: self.get_room_detail_usecase.clone(),
            max_message_bytes: self.max_message_bytes,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/", get(websocket_handler))
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Serve on an already bound listener until a shutdown signal arrives.
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        tracing::info!("Signaling server listening on {}", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Run the signaling server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 3000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/?room=<room>&role=<patient|doctor>", bind_addr);

        self.serve(listener).await
    }
}
