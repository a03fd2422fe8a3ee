//! Server state shared by all handlers.

use std::sync::Arc;

use crate::usecase::{
    GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase, RelaySignalUseCase,
};

/// Shared application state
pub struct AppState {
    /// JoinRoomUseCase（Room 参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// RelaySignalUseCase（シグナルリレーのユースケース）
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    /// LeaveRoomUseCase（Room 退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// GetRoomsUseCase（Room 一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（Room 詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// WebSocket の最大受信メッセージサイズ（バイト）
    pub max_message_bytes: usize,
}
