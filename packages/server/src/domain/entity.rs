//! Entities
//!
//! - `Room`: 予約 ID をキーとする通話ルーム。patient / doctor のスロットを 1 つずつ持つ
//! - `PeerHandle`: 1 つの (room, role) に束縛された接続への送信口

use tokio::sync::mpsc;

use super::{ConnectionId, PushError, RegistryError, Role, RoomId, Timestamp};

/// 接続の送信キュー（WebSocket の pusher ループが受信側を保持する）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 接続ハンドル
///
/// Room のスロットに格納され、相手側セッションはこのハンドル経由でのみメッセージを送る。
#[derive(Debug, Clone)]
pub struct PeerHandle {
    connection_id: ConnectionId,
    sender: PusherChannel,
    joined_at: Timestamp,
}

impl PeerHandle {
    pub fn new(connection_id: ConnectionId, sender: PusherChannel, joined_at: Timestamp) -> Self {
        Self {
            connection_id,
            sender,
            joined_at,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn joined_at(&self) -> Timestamp {
        self.joined_at
    }

    /// 受信側（WebSocket の pusher ループ）がまだ生きているか
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// 接続の送信キューにメッセージを積む
    pub fn push(&self, content: &str) -> Result<(), PushError> {
        self.sender
            .send(content.to_string())
            .map_err(|_| PushError::ChannelClosed(self.connection_id.to_string()))
    }
}

/// スロット変更と同時に配送する通知（エンコード済みフレーム）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotNotice {
    /// 相手がいる場合に相手へ送る
    pub to_peer: Option<String>,
    /// 相手がいない場合に格納した接続自身へ送る（`occupy` のみ）
    pub to_self_when_alone: Option<String>,
}

impl SlotNotice {
    pub fn for_peer(content: String) -> Self {
        Self {
            to_peer: Some(content),
            to_self_when_alone: None,
        }
    }

    pub fn when_alone(mut self, content: String) -> Self {
        self.to_self_when_alone = Some(content);
        self
    }

    fn deliver_to_peer(&self, peer: &PeerHandle) -> Result<(), PushError> {
        match &self.to_peer {
            Some(content) => peer.push(content),
            None => Ok(()),
        }
    }
}

/// スロット変更の結果
#[derive(Debug, Clone)]
pub struct SlotChange {
    /// 変更時点の相手側ハンドル
    pub peer: Option<PeerHandle>,
    /// 通知の配送結果（配送する通知が無ければ `Ok`）
    pub delivery: Result<(), PushError>,
}

/// 通話ルーム
///
/// ## 不変条件
///
/// - patient / doctor のスロットはそれぞれ高々 1 つのハンドルを保持する
/// - Registry 上では、少なくとも 1 つのハンドルを持つ Room だけが存在する
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub patient: Option<PeerHandle>,
    pub doctor: Option<PeerHandle>,
    pub created_at: Timestamp,
}

impl Room {
    /// 空の Room を作成
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            patient: None,
            doctor: None,
            created_at,
        }
    }

    pub fn slot(&self, role: Role) -> Option<&PeerHandle> {
        match role {
            Role::Patient => self.patient.as_ref(),
            Role::Doctor => self.doctor.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<PeerHandle> {
        match role {
            Role::Patient => &mut self.patient,
            Role::Doctor => &mut self.doctor,
        }
    }

    /// 反対側スロットのハンドル
    pub fn peer_of(&self, role: Role) -> Option<&PeerHandle> {
        self.slot(role.opposite())
    }

    /// スロットにハンドルを格納し、通知を配送する
    ///
    /// 既に開いたハンドルが格納されていれば `SlotOccupied`。閉じたハンドルは置き換える。
    /// 相手がいれば `notice.to_peer` を相手へ、いなければ `notice.to_self_when_alone` を
    /// 格納したハンドル自身へ積む。通知は格納と同じ `&mut self` の中で積まれるため、
    /// Registry のロック内で呼べば他の参加・退出の通知と順序が入れ替わらない。
    pub fn occupy(
        &mut self,
        role: Role,
        handle: PeerHandle,
        notice: &SlotNotice,
    ) -> Result<SlotChange, RegistryError> {
        if self.slot(role).is_some_and(PeerHandle::is_open) {
            return Err(RegistryError::SlotOccupied(role));
        }
        let peer = self.peer_of(role).cloned();
        let delivery = match (&peer, &notice.to_self_when_alone) {
            (Some(peer), _) => notice.deliver_to_peer(peer),
            (None, Some(content)) => handle.push(content),
            (None, None) => Ok(()),
        };
        *self.slot_mut(role) = Some(handle);
        Ok(SlotChange { peer, delivery })
    }

    /// 指定接続が保持しているスロットを空け、残った相手へ通知を配送する
    ///
    /// 別の接続が保持している場合は `NotInRoom`（新しい占有者を追い出さない）。
    pub fn vacate(
        &mut self,
        role: Role,
        connection_id: ConnectionId,
        notice: &SlotNotice,
    ) -> Result<SlotChange, RegistryError> {
        let held = self
            .slot(role)
            .is_some_and(|handle| handle.connection_id() == connection_id);
        if !held {
            return Err(RegistryError::NotInRoom(role));
        }
        *self.slot_mut(role) = None;
        let peer = self.peer_of(role).cloned();
        let delivery = match &peer {
            Some(peer) => notice.deliver_to_peer(peer),
            None => Ok(()),
        };
        Ok(SlotChange { peer, delivery })
    }

    /// 両スロットとも空か
    pub fn is_empty(&self) -> bool {
        self.patient.is_none() && self.doctor.is_none()
    }
}
