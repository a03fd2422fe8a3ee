//! UseCase: シグナルのリレー処理
//!
//! 受信したフレームは `type` だけを検査し、相手側へ受信したテキストのまま転送する。
//! SDP / ICE の検証は行わない。

use std::sync::Arc;

use crate::{
    domain::{Role, RoomId, RoomRegistry},
    infrastructure::dto::websocket::{MessageType, SignalEnvelope},
};

use super::error::RelayError;

/// リレーの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// 相手へ転送した
    Forwarded(MessageType),
    /// 相手が不在（または切断中）のため破棄した。エラーではない
    Dropped(MessageType),
    /// クライアントが明示的に退出を要求した
    Leave,
}

/// シグナルリレーのユースケース
pub struct RelaySignalUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl RelaySignalUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 反対側スロットに開いた接続があるか
    pub async fn peer_present(&self, room_id: &RoomId, role: Role) -> bool {
        self.registry
            .peer_of(room_id, role)
            .await
            .is_some_and(|peer| peer.is_open())
    }

    /// 受信フレームを相手側へリレーする
    ///
    /// # Arguments
    ///
    /// * `room_id` - 送信者の Room
    /// * `role` - 送信者のロール（転送先は常に反対側）
    /// * `text` - 受信したテキストフレーム
    ///
    /// # Returns
    ///
    /// * `Err(RelayError::Malformed)` - `type` を持つ JSON オブジェクトでない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        role: Role,
        text: &str,
    ) -> Result<RelayOutcome, RelayError> {
        let envelope =
            SignalEnvelope::parse(text).map_err(|e| RelayError::Malformed(e.to_string()))?;

        if envelope.r#type == MessageType::Leave {
            return Ok(RelayOutcome::Leave);
        }

        let Some(peer) = self.registry.peer_of(room_id, role).await else {
            tracing::debug!(
                "No {} in room '{}', dropping {:?} ({} bytes)",
                role.opposite(),
                room_id,
                envelope.r#type,
                text.len()
            );
            return Ok(RelayOutcome::Dropped(envelope.r#type));
        };

        match peer.push(text) {
            Ok(()) => {
                tracing::debug!(
                    "Relayed {:?} from {} to {} in room '{}' ({} bytes)",
                    envelope.r#type,
                    role,
                    role.opposite(),
                    room_id,
                    text.len()
                );
                Ok(RelayOutcome::Forwarded(envelope.r#type))
            }
            Err(e) => {
                tracing::debug!("Peer went away during relay, dropping: {}", e);
                Ok(RelayOutcome::Dropped(envelope.r#type))
            }
        }
    }
}
