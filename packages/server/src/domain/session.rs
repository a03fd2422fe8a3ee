//! 接続セッションの状態遷移
//!
//! ```text
//! Connecting ──join──▶ Joined ◀──peer present / absent──▶ Relaying
//!     │                  │                                   │
//!     └──────────────────┴──────────────close────────────────┴──▶ Closed
//! ```
//!
//! `Joined` と `Relaying` は同じ定常状態で、相手側が存在するかどうかだけが異なる。

use super::SessionStateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 接続直後、join パラメータ検証前
    Connecting,
    /// Room に登録済み、相手なし
    Joined,
    /// Room に登録済み、相手あり
    Relaying,
    /// 終了
    Closed,
}

impl SessionState {
    /// 状態遷移を検証して遷移先を返す
    pub fn transition(self, to: SessionState) -> Result<SessionState, SessionStateError> {
        use SessionState::*;

        let allowed = matches!(
            (self, to),
            (Connecting, Joined)
                | (Connecting, Closed)
                | (Joined, Relaying)
                | (Relaying, Joined)
                | (Joined, Joined)
                | (Relaying, Relaying)
                | (Joined, Closed)
                | (Relaying, Closed)
        );

        if allowed {
            Ok(to)
        } else {
            Err(SessionStateError { from: self, to })
        }
    }

    /// Room に登録されている状態か
    pub fn is_registered(self) -> bool {
        matches!(self, SessionState::Joined | SessionState::Relaying)
    }
}
