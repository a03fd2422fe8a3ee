//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! 1 つの `tokio::sync::Mutex` で HashMap 全体を保護します。
//! 想定する同時ルーム数は小さく、ロック保持中に await しないため競合は問題になりません。
//! 通知はロック保持中に送信キューへ積むため、参加・退出の通知順はスロット変更順と一致します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use teleconsult_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, PeerHandle, RegistryError, Role, Room, RoomId, RoomRegistry, SlotChange,
    SlotNotice, Timestamp,
};

/// インメモリ Room Registry 実装
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<RoomId, Room>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRegistry {
    /// システム時計を使う Registry を作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 任意の時計を使う Registry を作成（テスト用）
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn get_or_create_room(&self, room_id: &RoomId) -> Room {
        let created_at = self.now();
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone(), created_at))
            .clone()
    }

    async fn set_slot(
        &self,
        room_id: &RoomId,
        role: Role,
        handle: PeerHandle,
        notice: SlotNotice,
    ) -> Result<SlotChange, RegistryError> {
        let created_at = self.now();
        let mut rooms = self.rooms.lock().await;
        match rooms.get_mut(room_id) {
            Some(room) => room.occupy(role, handle, &notice),
            None => {
                let mut room = Room::new(room_id.clone(), created_at);
                let change = room.occupy(role, handle, &notice)?;
                rooms.insert(room_id.clone(), room);
                tracing::debug!("Room '{}' opened", room_id);
                Ok(change)
            }
        }
    }

    async fn clear_slot(
        &self,
        room_id: &RoomId,
        role: Role,
        connection_id: ConnectionId,
        notice: SlotNotice,
    ) -> Result<SlotChange, RegistryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or(RegistryError::NotInRoom(role))?;

        let change = room.vacate(role, connection_id, &notice)?;
        if room.is_empty() {
            rooms.remove(room_id);
            tracing::info!("Room '{}' removed from registry", room_id);
        }
        Ok(change)
    }

    async fn peer_of(&self, room_id: &RoomId, role: Role) -> Option<PeerHandle> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .and_then(|room| room.peer_of(role))
            .cloned()
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<Room> = rooms.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    async fn count_rooms(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleconsult_shared::time::FixedClock;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - スロットの格納・解放と、相手側ハンドルの取得
    // - 両スロットが空になった Room の削除（GC 不変条件）
    // - 同一ロールの二重格納の拒否
    //
    // 【なぜこのテストが必要か】
    // - Registry はプロセス内で唯一の共有可変状態
    // - 放棄された Room が残り続けるとメモリが単調増加する
    // ========================================

    const CREATED_AT: i64 = 1_700_000_000_000;

    fn create_test_registry() -> InMemoryRoomRegistry {
        InMemoryRoomRegistry::with_clock(Arc::new(FixedClock::new(CREATED_AT)))
    }

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn create_handle() -> (PeerHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PeerHandle::new(ConnectionId::generate(), tx, Timestamp::new(CREATED_AT)),
            rx,
        )
    }

    #[tokio::test]
    async fn test_get_or_create_room_is_idempotent() {
        // テスト項目: 同じ RoomId で複数回呼んでも Room は 1 つだけ
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");

        // when (操作):
        let first = registry.get_or_create_room(&id).await;
        let second = registry.get_or_create_room(&id).await;

        // then (期待する結果):
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at.value(), CREATED_AT);
        assert!(first.is_empty());
        assert_eq!(registry.count_rooms().await, 1);
    }

    #[tokio::test]
    async fn test_set_slot_creates_room() {
        // テスト項目: 最初の参加者の格納で Room が暗黙に作成される
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");
        let (doctor, _rx) = create_handle();

        // when (操作):
        let result = registry.set_slot(&id, Role::Doctor, doctor, SlotNotice::default()).await;

        // then (期待する結果):
        assert!(matches!(result, Ok(SlotChange { peer: None, .. })));
        let room = registry.get_room(&id).await.unwrap();
        assert!(room.doctor.is_some());
        assert!(room.patient.is_none());
    }

    #[tokio::test]
    async fn test_set_slot_occupied_is_rejected() {
        // テスト項目: 開いた接続が占有しているスロットへの格納は SlotOccupied
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");
        let (first, _first_rx) = create_handle();
        let first_id = first.connection_id();
        registry.set_slot(&id, Role::Doctor, first, SlotNotice::default()).await.unwrap();

        // when (操作):
        let (second, _second_rx) = create_handle();
        let result = registry.set_slot(&id, Role::Doctor, second, SlotNotice::default()).await;

        // then (期待する結果): 既存の占有者は影響を受けない
        assert!(matches!(result, Err(RegistryError::SlotOccupied(Role::Doctor))));
        let room = registry.get_room(&id).await.unwrap();
        assert_eq!(room.doctor.map(|h| h.connection_id()), Some(first_id));
    }

    #[tokio::test]
    async fn test_set_slot_returns_counterpart() {
        // テスト項目: 相手側が既にいる場合、格納時点の相手ハンドルが返される
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");
        let (doctor, _doctor_rx) = create_handle();
        let doctor_id = doctor.connection_id();
        registry.set_slot(&id, Role::Doctor, doctor, SlotNotice::default()).await.unwrap();

        // when (操作):
        let (patient, _patient_rx) = create_handle();
        let change = registry
            .set_slot(&id, Role::Patient, patient, SlotNotice::default())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(change.peer.map(|h| h.connection_id()), Some(doctor_id));
    }

    #[tokio::test]
    async fn test_clear_slot_keeps_room_while_peer_remains() {
        // テスト項目: 片方が抜けても相手が残っていれば Room は残る
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");
        let (doctor, _doctor_rx) = create_handle();
        let doctor_id = doctor.connection_id();
        let (patient, _patient_rx) = create_handle();
        let patient_id = patient.connection_id();
        registry.set_slot(&id, Role::Doctor, doctor, SlotNotice::default()).await.unwrap();
        registry.set_slot(&id, Role::Patient, patient, SlotNotice::default()).await.unwrap();

        // when (操作):
        let change = registry
            .clear_slot(&id, Role::Patient, patient_id, SlotNotice::default())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(change.peer.map(|h| h.connection_id()), Some(doctor_id));
        assert!(registry.get_room(&id).await.is_some());
        assert!(registry.peer_of(&id, Role::Doctor).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_last_slot_removes_room() {
        // テスト項目: 両スロットが空になると Room が削除される
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");
        let (doctor, _rx) = create_handle();
        let doctor_id = doctor.connection_id();
        registry.set_slot(&id, Role::Doctor, doctor, SlotNotice::default()).await.unwrap();

        // when (操作):
        let change = registry
            .clear_slot(&id, Role::Doctor, doctor_id, SlotNotice::default())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(change.peer.is_none());
        assert!(registry.get_room(&id).await.is_none());
        assert_eq!(registry.count_rooms().await, 0);
    }

    #[tokio::test]
    async fn test_clear_slot_unknown_room() {
        // テスト項目: 存在しない Room のスロット解放は NotInRoom
        // given (前提条件):
        let registry = create_test_registry();

        // when (操作):
        let result = registry
            .clear_slot(
                &room_id("ghost"),
                Role::Patient,
                ConnectionId::generate(),
                SlotNotice::default(),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::NotInRoom(Role::Patient))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_notices_follow_slot_order() {
        // テスト項目: 並行する参加でも、doctor の最後の通知は patient の有無と一致する
        // given (前提条件):
        let registry = Arc::new(create_test_registry());

        for i in 0..200 {
            let id = room_id(&format!("apt-{}", i));
            let (doctor_tx, mut doctor_rx) = mpsc::unbounded_channel();
            let (patient_tx, _patient_rx) = mpsc::unbounded_channel();
            let doctor = PeerHandle::new(ConnectionId::generate(), doctor_tx, Timestamp::new(0));
            let patient = PeerHandle::new(ConnectionId::generate(), patient_tx, Timestamp::new(0));

            // when (操作): doctor と patient が同時に参加
            let doctor_join = {
                let registry = registry.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let notice = SlotNotice::for_peer("peer-joined:doctor".to_string())
                        .when_alone("wait".to_string());
                    registry.set_slot(&id, Role::Doctor, doctor, notice).await
                })
            };
            let patient_join = {
                let registry = registry.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let notice = SlotNotice::for_peer("peer-joined:patient".to_string());
                    registry.set_slot(&id, Role::Patient, patient, notice).await
                })
            };
            doctor_join.await.unwrap().unwrap();
            patient_join.await.unwrap().unwrap();

            // then (期待する結果): doctor が受け取った通知は「wait → peer-joined」か「なし」のどちらか
            let mut frames = Vec::new();
            while let Ok(frame) = doctor_rx.try_recv() {
                frames.push(frame);
            }
            assert!(
                frames.is_empty() || frames == vec!["wait", "peer-joined:patient"],
                "unexpected doctor frames: {:?}",
                frames
            );
        }
    }

    #[tokio::test]
    async fn test_clear_slot_delivers_notice_before_next_join() {
        // テスト項目: 退出の通知は、後続の参加の通知より先に積まれる
        // given (前提条件):
        let registry = create_test_registry();
        let id = room_id("apt-42");
        let (doctor_tx, mut doctor_rx) = mpsc::unbounded_channel();
        let doctor = PeerHandle::new(ConnectionId::generate(), doctor_tx, Timestamp::new(0));
        let (first, _first_rx) = create_handle();
        let first_id = first.connection_id();
        registry
            .set_slot(&id, Role::Doctor, doctor, SlotNotice::default())
            .await
            .unwrap();
        registry
            .set_slot(&id, Role::Patient, first, SlotNotice::default())
            .await
            .unwrap();

        // when (操作): patient が抜けた直後に別の patient が参加
        registry
            .clear_slot(&id, Role::Patient, first_id, SlotNotice::for_peer("left".to_string()))
            .await
            .unwrap();
        let (second, _second_rx) = create_handle();
        registry
            .set_slot(
                &id,
                Role::Patient,
                second,
                SlotNotice::for_peer("peer-joined".to_string()),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(doctor_rx.try_recv().unwrap(), "left");
        assert_eq!(doctor_rx.try_recv().unwrap(), "peer-joined");
    }

    #[tokio::test]
    async fn test_list_rooms_sorted_by_id() {
        // テスト項目: Room 一覧は RoomId 順に返される
        // given (前提条件):
        let registry = create_test_registry();
        let (a, _a_rx) = create_handle();
        let (b, _b_rx) = create_handle();
        registry
            .set_slot(&room_id("b-room"), Role::Doctor, b, SlotNotice::default())
            .await
            .unwrap();
        registry
            .set_slot(&room_id("a-room"), Role::Patient, a, SlotNotice::default())
            .await
            .unwrap();

        // when (操作):
        let rooms = registry.list_rooms().await;

        // then (期待する結果):
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a-room", "b-room"]);
    }
}
