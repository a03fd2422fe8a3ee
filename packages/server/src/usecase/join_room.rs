//! UseCase: Room への参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRequest::parse() による room / role の検証
//! - JoinRoomUseCase::execute() によるスロット登録と通知
//!
//! ### なぜこのテストが必要か
//! - offer の開始側は通知で決まるため、通知先を取り違えると glare が起きる
//! - 同じロールの二重参加で既存の占有者が影響を受けないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：doctor が先に参加（wait）、patient が後から参加（doctor に peer-joined）
//! - 異常系：パラメータ欠落、未知のロール、スロット占有済み

use std::sync::Arc;

use teleconsult_shared::time::{Clock, SystemClock};

use crate::{
    domain::{
        ConnectionId, PeerHandle, PusherChannel, Role, RoomId, RoomRegistry, SlotNotice,
        Timestamp,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::error::JoinError;

/// 検証済みの join パラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room_id: RoomId,
    pub role: Role,
}

impl JoinRequest {
    /// クエリパラメータから join リクエストを組み立てる
    ///
    /// - room / role のどちらかが欠落・空 → `Room and role required`
    /// - 長すぎる room → `Invalid room`
    /// - patient / doctor 以外の role → `Invalid role`
    pub fn parse(room: Option<&str>, role: Option<&str>) -> Result<Self, JoinError> {
        let (room, role) = match (room, role) {
            (Some(room), Some(role)) if !room.trim().is_empty() && !role.trim().is_empty() => {
                (room, role)
            }
            _ => return Err(JoinError::InvalidJoinRequest("Room and role required")),
        };

        let room_id = RoomId::new(room.to_string())
            .map_err(|_| JoinError::InvalidJoinRequest("Invalid room"))?;
        let role = role
            .parse::<Role>()
            .map_err(|_| JoinError::InvalidJoinRequest("Invalid role"))?;

        Ok(Self { room_id, role })
    }
}

/// join の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// doctor が参加したが patient はまだいない（自身に wait を通知）
    Waiting,
    /// 相手が既にいたため、相手に peer-joined を通知
    PeerNotified,
    /// patient が参加したが doctor はまだいない
    Alone,
}

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    /// Room Registry（データアクセス層の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// 参加時刻（`joined_at`）の時計
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    /// 任意の時計を使う JoinRoomUseCase を作成（テスト用）
    pub fn with_clock(registry: Arc<dyn RoomRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Room 参加を実行
    ///
    /// 登録と通知（相手への peer-joined、単独 doctor への wait）は Registry の
    /// 1 回の `set_slot` の中で行われる。通知はこの接続から後続でリレーされる
    /// どのメッセージよりも先に、また並行する参加・退出の通知と入れ替わらずに積まれる。
    ///
    /// # Arguments
    ///
    /// * `request` - 検証済みの join パラメータ
    /// * `connection_id` - 参加する接続の ID
    /// * `sender` - 参加する接続の送信キュー
    pub async fn execute(
        &self,
        request: &JoinRequest,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<JoinOutcome, JoinError> {
        let joined_at = Timestamp::new(self.clock.now_millis());
        let handle = PeerHandle::new(connection_id, sender, joined_at);

        let mut notice = SlotNotice::for_peer(ServerEvent::peer_joined(request.role).to_json());
        if request.role == Role::Doctor {
            notice = notice.when_alone(ServerEvent::wait().to_json());
        }

        let change = self
            .registry
            .set_slot(&request.room_id, request.role, handle, notice)
            .await?;
        tracing::info!(
            "{} joined room '{}' (connection {})",
            request.role,
            request.room_id,
            connection_id
        );

        if let Err(e) = &change.delivery {
            tracing::warn!(
                "Failed to deliver join notification in room '{}': {}",
                request.room_id,
                e
            );
        }

        Ok(match change.peer {
            Some(_) => JoinOutcome::PeerNotified,
            None if request.role == Role::Doctor => JoinOutcome::Waiting,
            None => JoinOutcome::Alone,
        })
    }
}
