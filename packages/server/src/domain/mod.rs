//! Domain layer
//!
//! シグナリングリレーのドメインモデルを定義します。
//!
//! - `value_object`: RoomId, Role, ConnectionId, Timestamp
//! - `entity`: Room, PeerHandle
//! - `session`: 接続セッションの状態遷移
//! - `repository`: RoomRegistry trait（Infrastructure 層が実装）
//! - `error`: ドメインエラー

pub mod entity;
pub mod error;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::{PeerHandle, PusherChannel, Room, SlotChange, SlotNotice};
pub use error::{PushError, RegistryError, SessionStateError, ValueObjectError};
pub use repository::RoomRegistry;
pub use session::SessionState;
pub use value_object::{ConnectionId, Role, RoomId, Timestamp};

#[cfg(test)]
pub use repository::MockRoomRegistry;
