//! Domain errors

use thiserror::Error;

use super::{Role, SessionState};

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id is too long ({0} bytes)")]
    RoomIdTooLong(usize),

    #[error("role must not be empty")]
    RoleEmpty,

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Room Registry の操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 指定ロールのスロットは既に生きた接続が占有している
    #[error("{0} slot is already occupied")]
    SlotOccupied(Role),

    /// 呼び出し元の接続はそのスロットを保持していない
    #[error("connection does not hold the {0} slot")]
    NotInRoom(Role),
}

/// 接続ハンドルへのメッセージ送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// 不正な状態遷移
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session transition: {from:?} -> {to:?}")]
pub struct SessionStateError {
    pub from: SessionState,
    pub to: SessionState,
}
