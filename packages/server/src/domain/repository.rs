//! Repository trait 定義
//!
//! ドメイン層が必要とする Room Registry のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ConnectionId, PeerHandle, RegistryError, Role, Room, RoomId, SlotChange, SlotNotice,
};

/// Room Registry trait
///
/// ルーム ID から patient / doctor の接続ハンドルへのマッピングを管理する。
/// スロットの read-modify-write と、それに伴う通知の配送は 1 回の呼び出しの中で
/// アトミックに行われる。別の参加・退出の通知と順序が入れ替わることはない。
///
/// ## 依存性の逆転（DIP）
///
/// - UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない
/// - シャーディングや外部ストアへの差し替えはセッションロジックに影響しない
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Room を取得、存在しなければ空の Room を作成する（冪等）
    ///
    /// 参加処理は使わない（`set_slot` が同じロック内で Room を作成する）。
    async fn get_or_create_room(&self, room_id: &RoomId) -> Room;

    /// スロットにハンドルを格納し、`notice` を配送する（Room が無ければ作成）
    ///
    /// 開いたハンドルが既に占有していれば `SlotOccupied` で、Registry は変更されない。
    /// 成功時は格納時点の相手側ハンドルと配送結果を返す。
    async fn set_slot(
        &self,
        room_id: &RoomId,
        role: Role,
        handle: PeerHandle,
        notice: SlotNotice,
    ) -> Result<SlotChange, RegistryError>;

    /// 指定接続が保持するスロットを空け、残った相手へ `notice` を配送する
    ///
    /// 両スロットが空になれば Room を削除する。
    async fn clear_slot(
        &self,
        room_id: &RoomId,
        role: Role,
        connection_id: ConnectionId,
        notice: SlotNotice,
    ) -> Result<SlotChange, RegistryError>;

    /// 反対側スロットのハンドルを取得
    async fn peer_of(&self, room_id: &RoomId, role: Role) -> Option<PeerHandle>;

    /// Room のスナップショットを取得
    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// 全 Room のスナップショットを取得（RoomId 順）
    async fn list_rooms(&self) -> Vec<Room>;

    /// Room 数を取得
    async fn count_rooms(&self) -> usize;
}
