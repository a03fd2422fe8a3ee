//! Connection Session
//!
//! 1 つの WebSocket 接続に対して 1 つ作られるアクター。
//! 接続の受信側を所有し、相手とは Registry 上のハンドル経由でのみやり取りする。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - join → relay → close の一連の状態遷移
//! - 通話シナリオ全体（wait / peer-joined / offer / answer / left / Room 削除）
//!
//! ### なぜこのテストが必要か
//! - close は何度呼ばれても left を 1 回しか送ってはいけない
//! - 拒否された接続の close が既存の占有者を追い出してはいけない

use std::sync::Arc;

use crate::domain::{ConnectionId, PusherChannel, SessionState};

use super::{
    error::JoinError,
    join_room::{JoinOutcome, JoinRequest, JoinRoomUseCase},
    leave_room::{LeaveOutcome, LeaveRoomUseCase},
    relay_signal::{RelayOutcome, RelaySignalUseCase},
};

/// 受信フレーム処理後に接続を続けるかどうか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Close,
}

/// 接続セッション
pub struct ConnectionSession {
    connection_id: ConnectionId,
    state: SessionState,
    /// join 成功後の (room, role)
    binding: Option<JoinRequest>,
    join_usecase: Arc<JoinRoomUseCase>,
    relay_usecase: Arc<RelaySignalUseCase>,
    leave_usecase: Arc<LeaveRoomUseCase>,
}

impl ConnectionSession {
    /// `Connecting` 状態のセッションを作成
    pub fn new(
        join_usecase: Arc<JoinRoomUseCase>,
        relay_usecase: Arc<RelaySignalUseCase>,
        leave_usecase: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            connection_id: ConnectionId::generate(),
            state: SessionState::Connecting,
            binding: None,
            join_usecase,
            relay_usecase,
            leave_usecase,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// 現在の状態
    ///
    /// `Joined` / `Relaying` は、このセッションが最後に Registry とやり取りした時点
    /// （join、リレー、`refresh_state`）の相手の在否を表す。
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 相手の在否を Registry から読み直し、`Joined` / `Relaying` を更新する
    ///
    /// 相手側の参加・退出はこのセッションの状態を直接は変えないため、
    /// 最新の在否が必要な場合に呼ぶ。登録前・終了後は何もしない。
    pub async fn refresh_state(&mut self) -> SessionState {
        let Some(request) = self.binding.as_ref().filter(|_| self.state.is_registered()) else {
            return self.state;
        };
        let present = self
            .relay_usecase
            .peer_present(&request.room_id, request.role)
            .await;
        self.advance(if present {
            SessionState::Relaying
        } else {
            SessionState::Joined
        });
        self.state
    }

    pub fn binding(&self) -> Option<&JoinRequest> {
        self.binding.as_ref()
    }

    fn advance(&mut self, to: SessionState) {
        match self.state.transition(to) {
            Ok(next) => self.state = next,
            Err(e) => tracing::warn!("Connection {}: {}", self.connection_id, e),
        }
    }

    /// join パラメータを検証し、Room に登録する
    ///
    /// 失敗した場合セッションは `Closed` になり、Registry は変更されない。
    /// 呼び出し側は `JoinError::client_message()` を接続に返してから切断する。
    pub async fn join(
        &mut self,
        room: Option<&str>,
        role: Option<&str>,
        sender: PusherChannel,
    ) -> Result<JoinOutcome, JoinError> {
        let result = match JoinRequest::parse(room, role) {
            Ok(request) => self
                .join_usecase
                .execute(&request, self.connection_id, sender)
                .await
                .map(|outcome| (request, outcome)),
            Err(e) => Err(e),
        };

        match result {
            Ok((request, outcome)) => {
                self.advance(SessionState::Joined);
                if outcome == JoinOutcome::PeerNotified {
                    self.advance(SessionState::Relaying);
                }
                self.binding = Some(request);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!("Connection {} join rejected: {}", self.connection_id, e);
                self.advance(SessionState::Closed);
                Err(e)
            }
        }
    }

    /// 受信したテキストフレームを処理する
    pub async fn on_text(&mut self, text: &str) -> SessionControl {
        let Some(request) = self.binding.as_ref().filter(|_| self.state.is_registered()) else {
            return SessionControl::Close;
        };

        match self
            .relay_usecase
            .execute(&request.room_id, request.role, text)
            .await
        {
            Ok(RelayOutcome::Forwarded(_)) => {
                self.advance(SessionState::Relaying);
                SessionControl::Continue
            }
            Ok(RelayOutcome::Dropped(_)) => {
                self.advance(SessionState::Joined);
                SessionControl::Continue
            }
            Ok(RelayOutcome::Leave) => {
                tracing::info!("Connection {} requested leave", self.connection_id);
                SessionControl::Close
            }
            Err(e) => {
                tracing::warn!("Connection {} sent {}, closing", self.connection_id, e);
                SessionControl::Close
            }
        }
    }

    /// セッションを終了する（冪等）
    ///
    /// 登録済みであればスロットを解放し、相手に left を送る。
    /// 2 回目以降の呼び出しは何もしない。
    pub async fn close(&mut self) -> Option<LeaveOutcome> {
        if self.state == SessionState::Closed {
            return None;
        }
        let registered = self.state.is_registered();
        self.advance(SessionState::Closed);

        let request = self.binding.as_ref().filter(|_| registered)?;
        match self
            .leave_usecase
            .execute(&request.room_id, request.role, self.connection_id)
            .await
        {
            Ok(outcome) => {
                if outcome.room_closed {
                    tracing::info!("Room '{}' closed", request.room_id);
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!("Connection {}: {}", self.connection_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Role, RoomId, RoomRegistry},
        infrastructure::{dto::websocket::ServerEvent, repository::InMemoryRoomRegistry},
    };
    use tokio::sync::mpsc;

    struct Harness {
        registry: Arc<InMemoryRoomRegistry>,
        join: Arc<JoinRoomUseCase>,
        relay: Arc<RelaySignalUseCase>,
        leave: Arc<LeaveRoomUseCase>,
    }

    impl Harness {
        fn new() -> Self {
            let registry = Arc::new(InMemoryRoomRegistry::new());
            Self {
                join: Arc::new(JoinRoomUseCase::new(registry.clone())),
                relay: Arc::new(RelaySignalUseCase::new(registry.clone())),
                leave: Arc::new(LeaveRoomUseCase::new(registry.clone())),
                registry,
            }
        }

        fn session(&self) -> ConnectionSession {
            ConnectionSession::new(self.join.clone(), self.relay.clone(), self.leave.clone())
        }

        async fn connect(
            &self,
            room: &str,
            role: &str,
        ) -> (
            ConnectionSession,
            mpsc::UnboundedReceiver<String>,
            Result<JoinOutcome, JoinError>,
        ) {
            let mut session = self.session();
            let (tx, rx) = mpsc::unbounded_channel();
            let result = session.join(Some(room), Some(role), tx).await;
            (session, rx, result)
        }
    }

    fn apt42() -> RoomId {
        RoomId::new("apt-42".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_consultation_scenario() {
        // テスト項目: doctor 先着 → patient 参加 → offer / answer → 双方退出の一連の流れ
        // given (前提条件):
        let harness = Harness::new();

        // when (操作): doctor が参加
        let (mut doctor, mut doctor_rx, result) = harness.connect("apt-42", "doctor").await;

        // then (期待する結果): doctor に wait
        assert_eq!(result, Ok(JoinOutcome::Waiting));
        assert_eq!(doctor.state(), SessionState::Joined);
        assert_eq!(doctor_rx.try_recv().unwrap(), ServerEvent::wait().to_json());

        // when (操作): patient が参加
        let (mut patient, mut patient_rx, result) = harness.connect("apt-42", "patient").await;

        // then (期待する結果): doctor に peer-joined、patient には何も届かない
        assert_eq!(result, Ok(JoinOutcome::PeerNotified));
        assert_eq!(patient.state(), SessionState::Relaying);
        assert_eq!(
            doctor_rx.try_recv().unwrap(),
            ServerEvent::peer_joined(Role::Patient).to_json()
        );
        assert!(patient_rx.try_recv().is_err());

        // when (操作): patient が offer を送る
        let offer = r#"{"type":"offer","sdp":"X"}"#;
        let control = patient.on_text(offer).await;

        // then (期待する結果): doctor にそのまま届く
        assert_eq!(control, SessionControl::Continue);
        assert_eq!(doctor_rx.try_recv().unwrap(), offer);

        // when (操作): doctor が answer を返す
        let answer = r#"{"type":"answer","sdp":"Y"}"#;
        let control = doctor.on_text(answer).await;

        // then (期待する結果): patient にそのまま届く
        assert_eq!(control, SessionControl::Continue);
        assert_eq!(doctor.state(), SessionState::Relaying);
        assert_eq!(patient_rx.try_recv().unwrap(), answer);

        // when (操作): patient が切断
        let outcome = patient.close().await;

        // then (期待する結果): doctor に left、Room は doctor のために残る
        assert_eq!(
            outcome,
            Some(LeaveOutcome {
                peer_notified: true,
                room_closed: false,
            })
        );
        assert_eq!(doctor_rx.try_recv().unwrap(), ServerEvent::Left.to_json());
        assert!(harness.registry.get_room(&apt42()).await.is_some());

        // when (操作): doctor が切断
        let outcome = doctor.close().await;

        // then (期待する結果): Room が削除される
        assert_eq!(
            outcome,
            Some(LeaveOutcome {
                peer_notified: false,
                room_closed: true,
            })
        );
        assert!(harness.registry.get_room(&apt42()).await.is_none());
    }

    #[tokio::test]
    async fn test_second_doctor_rejected_first_unaffected() {
        // テスト項目: 二人目の doctor は拒否され、close しても一人目のスロットは残る
        // given (前提条件):
        let harness = Harness::new();
        let (first, mut first_rx, _) = harness.connect("apt-42", "doctor").await;
        first_rx.try_recv().unwrap(); // wait

        // when (操作):
        let (mut second, mut second_rx, result) = harness.connect("apt-42", "doctor").await;
        let outcome = second.close().await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::SlotOccupied(Role::Doctor)));
        assert_eq!(
            result.unwrap_err().client_message(),
            "Doctor already in room"
        );
        assert_eq!(second.state(), SessionState::Closed);
        assert!(outcome.is_none());
        assert!(second_rx.try_recv().is_err());
        let room = harness.registry.get_room(&apt42()).await.unwrap();
        assert_eq!(
            room.doctor.map(|h| h.connection_id()),
            Some(first.connection_id())
        );
        assert!(first_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_join_has_no_registry_effect() {
        // テスト項目: 不正な join はセッションを閉じ、Registry を変更しない
        // given (前提条件):
        let harness = Harness::new();
        let mut session = harness.session();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = session.join(Some("apt-42"), None, tx).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinError::InvalidJoinRequest("Room and role required"))
        );
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(harness.registry.count_rooms().await, 0);
        assert_eq!(session.on_text(r#"{"type":"offer"}"#).await, SessionControl::Close);
    }

    #[tokio::test]
    async fn test_message_without_peer_is_dropped_silently() {
        // テスト項目: 相手不在で送ったメッセージは破棄され、セッションは継続する
        // given (前提条件):
        let harness = Harness::new();
        let (mut patient, mut patient_rx, _) = harness.connect("apt-42", "patient").await;

        // when (操作):
        let control = patient
            .on_text(r#"{"type":"candidate","candidate":{"candidate":"c"}}"#)
            .await;

        // then (期待する結果):
        assert_eq!(control, SessionControl::Continue);
        assert_eq!(patient.state(), SessionState::Joined);
        assert!(patient_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        // テスト項目: close を何度呼んでも相手には left が 1 回だけ届く
        // given (前提条件):
        let harness = Harness::new();
        let (_doctor, mut doctor_rx, _) = harness.connect("apt-42", "doctor").await;
        let (mut patient, _patient_rx, _) = harness.connect("apt-42", "patient").await;
        doctor_rx.try_recv().unwrap(); // wait
        doctor_rx.try_recv().unwrap(); // peer-joined

        // when (操作):
        patient.close().await;
        let second = patient.close().await;

        // then (期待する結果):
        assert!(second.is_none());
        assert_eq!(doctor_rx.try_recv().unwrap(), ServerEvent::Left.to_json());
        assert!(doctor_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_leave_and_malformed_frames_close_session() {
        // テスト項目: leave と不正なフレームはどちらも Close を返す
        // given (前提条件):
        let harness = Harness::new();
        let (mut doctor, _doctor_rx, _) = harness.connect("apt-42", "doctor").await;
        let (mut patient, _patient_rx, _) = harness.connect("apt-7", "patient").await;

        // when (操作) / then (期待する結果):
        assert_eq!(doctor.on_text(r#"{"type":"leave"}"#).await, SessionControl::Close);
        assert_eq!(patient.on_text("{not json").await, SessionControl::Close);
    }

    #[tokio::test]
    async fn test_join_frame_is_forwarded_to_peer() {
        // テスト項目: クライアントの join 確認フレームも相手へそのまま転送される
        // given (前提条件):
        let harness = Harness::new();
        let (_patient, mut patient_rx, _) = harness.connect("apt-42", "patient").await;
        let (mut doctor, _doctor_rx, _) = harness.connect("apt-42", "doctor").await;
        patient_rx.try_recv().unwrap(); // peer-joined

        // when (操作):
        let join = r#"{"type":"join","role":"doctor"}"#;
        doctor.on_text(join).await;

        // then (期待する結果):
        assert_eq!(patient_rx.try_recv().unwrap(), join);
    }

    #[tokio::test]
    async fn test_refresh_state_tracks_peer_arrival_and_departure() {
        // テスト項目: 相手の参加・退出後、refresh_state で Joined / Relaying が追従する
        // given (前提条件):
        let harness = Harness::new();
        let (mut patient, _patient_rx, _) = harness.connect("apt-42", "patient").await;
        assert_eq!(patient.state(), SessionState::Joined);

        // when (操作): doctor が参加
        let (mut doctor, _doctor_rx, _) = harness.connect("apt-42", "doctor").await;

        // then (期待する結果): patient は Relaying に進む
        assert_eq!(patient.refresh_state().await, SessionState::Relaying);
        assert_eq!(patient.state(), SessionState::Relaying);

        // when (操作): patient が退出
        patient.close().await;

        // then (期待する結果): doctor は Joined に戻り、閉じた patient は Closed のまま
        assert_eq!(doctor.state(), SessionState::Relaying);
        assert_eq!(doctor.refresh_state().await, SessionState::Joined);
        assert_eq!(patient.refresh_state().await, SessionState::Closed);
    }
}
