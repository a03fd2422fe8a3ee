//! UseCase: Room からの退出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() によるスロット解放と left 通知
//!
//! ### なぜこのテストが必要か
//! - 残った相手には left がちょうど 1 回だけ届く必要がある
//! - 両スロットが空になった Room は Registry から消える必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：相手が残っている場合（通知あり、Room 存続）
//! - エッジケース：最後の参加者の退出（通知なし、Room 削除）
//! - 異常系：登録されていない接続の退出

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, Role, RoomId, RoomRegistry, SlotNotice},
    infrastructure::dto::websocket::ServerEvent,
};

use super::error::LeaveError;

/// 退出の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// 残った相手に left を送れたか
    pub peer_notified: bool,
    /// Room が Registry から削除されたか
    pub room_closed: bool,
}

/// Room 退出のユースケース
pub struct LeaveRoomUseCase {
    /// Room Registry（データアクセス層の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 退出を実行
    ///
    /// スロットの解放と相手への left の配送は Registry 内でアトミックに行われる。
    /// 相手がいなければ Room はその時点で削除されている。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        role: Role,
        connection_id: ConnectionId,
    ) -> Result<LeaveOutcome, LeaveError> {
        let notice = SlotNotice::for_peer(ServerEvent::Left.to_json());
        let change = self
            .registry
            .clear_slot(room_id, role, connection_id, notice)
            .await
            .map_err(|_| LeaveError::NotRegistered(room_id.as_str().to_string()))?;

        tracing::info!(
            "{} left room '{}' (connection {})",
            role,
            room_id,
            connection_id
        );

        if change.peer.is_none() {
            return Ok(LeaveOutcome {
                peer_notified: false,
                room_closed: true,
            });
        }

        let peer_notified = match change.delivery {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send left to {}: {}", role.opposite(), e);
                false
            }
        };

        Ok(LeaveOutcome {
            peer_notified,
            room_closed: false,
        })
    }
}
