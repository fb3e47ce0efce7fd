//! Entities
//!
//! Connection / WaitingEntry / Session / ChatMessage。
//! いずれも所有者は一つ（Connection は ConnectionRegistry、WaitingEntry は WaitingPool、
//! Session は Lobby のセッションテーブル）。

use serde::Serialize;

use super::value_object::{
    ConnectionId, DisplayName, MessageContent, MessageId, SessionId, Timestamp, UserId,
};

/// 1 本の生きたクライアント接続
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub connected_at: Timestamp,
    pub current_session_id: Option<SessionId>,
    pub in_waiting_pool: bool,
    /// クライアントが最後に申告したオンライン状態（update_online_status）
    pub reported_online: bool,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            display_name,
            connected_at,
            current_session_id: None,
            in_waiting_pool: false,
            reported_online: true,
        }
    }

    pub fn is_in_session(&self) -> bool {
        self.current_session_id.is_some()
    }
}

/// Waiting Pool 内の 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingEntry {
    pub user_id: UserId,
    pub enqueued_at: Timestamp,
}

/// Session の状態遷移: `Active -> Ending -> Gone`
///
/// `Ending` は teardown 中にだけ現れ、相手への通知を一度きりにするために使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Ending,
    Gone,
}

/// 2 人の参加者のペアリング
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub participant_a: UserId,
    pub participant_b: UserId,
    pub created_at: Timestamp,
    pub state: SessionState,
}

impl Session {
    pub fn new(
        id: SessionId,
        participant_a: UserId,
        participant_b: UserId,
        created_at: Timestamp,
    ) -> Self {
        debug_assert_ne!(participant_a, participant_b);
        Self {
            id,
            participant_a,
            participant_b,
            created_at,
            state: SessionState::Active,
        }
    }

    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.participant_a == user_id || &self.participant_b == user_id
    }

    /// `user_id` から見た相手。参加者でなければ `None`
    pub fn partner_of(&self, user_id: &UserId) -> Option<&UserId> {
        if &self.participant_a == user_id {
            Some(&self.participant_b)
        } else if &self.participant_b == user_id {
            Some(&self.participant_a)
        } else {
            None
        }
    }
}

/// 中継されたチャットメッセージ（外部ストアへの書き込み用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub from: UserId,
    pub to: UserId,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_partner_of_returns_other_participant() {
        // テスト項目: partner_of は相手側の参加者を返す
        // given (前提条件):
        let session = Session::new(
            SessionId::generate(),
            user("alice"),
            user("bob"),
            Timestamp::new(1000),
        );

        // when (操作):
        let from_alice = session.partner_of(&user("alice"));
        let from_bob = session.partner_of(&user("bob"));
        let from_charlie = session.partner_of(&user("charlie"));

        // then (期待する結果):
        assert_eq!(from_alice, Some(&user("bob")));
        assert_eq!(from_bob, Some(&user("alice")));
        assert_eq!(from_charlie, None);
        assert_eq!(session.state, SessionState::Active);
    }
}
