//! UseCase layer
//!
//! シグナリングリレーのアプリケーションロジック。
//! Room Registry（trait）にのみ依存し、WebSocket の詳細には依存しない。

pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod relay_signal;
pub mod session;

pub use error::{GetRoomDetailError, JoinError, LeaveError, RelayError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinOutcome, JoinRequest, JoinRoomUseCase};
pub use leave_room::{LeaveOutcome, LeaveRoomUseCase};
pub use relay_signal::{RelayOutcome, RelaySignalUseCase};
pub use session::{ConnectionSession, SessionControl};
