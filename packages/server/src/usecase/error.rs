//! UseCase errors

use thiserror::Error;

use crate::domain::{RegistryError, Role};

/// join の失敗。いずれも該当接続にのみ通知され、接続は閉じられる
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// room / role の欠落または不正（Registry は変更されない）
    #[error("invalid join request: {0}")]
    InvalidJoinRequest(&'static str),

    /// 同じロールが既に Room にいる
    #[error("{0} slot already occupied")]
    SlotOccupied(Role),

    #[error(transparent)]
    Registry(RegistryError),
}

impl JoinError {
    /// クライアントへ返す `error` メッセージの本文
    pub fn client_message(&self) -> String {
        match self {
            JoinError::InvalidJoinRequest(msg) => (*msg).to_string(),
            JoinError::SlotOccupied(Role::Patient) => "Patient already in room".to_string(),
            JoinError::SlotOccupied(Role::Doctor) => "Doctor already in room".to_string(),
            JoinError::Registry(_) => "Join failed".to_string(),
        }
    }
}

impl From<RegistryError> for JoinError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::SlotOccupied(role) => JoinError::SlotOccupied(role),
            other => JoinError::Registry(other),
        }
    }
}

/// リレーの失敗（該当接続は閉じられる）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("malformed signal: {0}")]
    Malformed(String),
}

/// 退出の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    #[error("connection is not registered in room '{0}'")]
    NotRegistered(String),
}

/// Room 詳細取得の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        // テスト項目: クライアント向けメッセージが既存クライアントの期待する文言と一致する
        assert_eq!(
            JoinError::InvalidJoinRequest("Room and role required").client_message(),
            "Room and role required"
        );
        assert_eq!(
            JoinError::SlotOccupied(Role::Patient).client_message(),
            "Patient already in room"
        );
        assert_eq!(
            JoinError::SlotOccupied(Role::Doctor).client_message(),
            "Doctor already in room"
        );
    }

    #[test]
    fn test_registry_error_conversion() {
        // テスト項目: SlotOccupied はそのまま JoinError::SlotOccupied に変換される
        assert_eq!(
            JoinError::from(RegistryError::SlotOccupied(Role::Doctor)),
            JoinError::SlotOccupied(Role::Doctor)
        );
        assert_eq!(
            JoinError::from(RegistryError::NotInRoom(Role::Doctor)),
            JoinError::Registry(RegistryError::NotInRoom(Role::Doctor))
        );
    }
}
