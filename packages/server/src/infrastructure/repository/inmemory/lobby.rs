//! InMemory Lobby Repository 実装
//!
//! ドメイン層が定義する LobbyRepository trait の具体的な実装。
//!
//! ## ロック規律
//!
//! Connection Registry / Waiting Pool / Session テーブルは `Lobby` 1 つにまとまっており、
//! それを 1 本の `Mutex` で守る。すべてのメソッドはロックを 1 回だけ取り、
//! ロックを保持したまま `.await` しない。MessagePusher など他のロックを
//! このロックの内側で取ることはない（通知は戻り値として外に出し、ロック解放後に配送する）。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, DisplayName, LeaveOutcome, Lobby, LobbyRegistration, LobbyRepository,
    LobbySnapshot, LobbyStats, MatchError, MatchOutcome, RelayError, Route, SessionId,
    TeardownNotice, TeardownReason, Timestamp, Unregistration, UserId,
};

/// インメモリ Lobby Repository 実装
pub struct InMemoryLobbyRepository {
    lobby: Arc<Mutex<Lobby>>,
}

impl InMemoryLobbyRepository {
    pub fn new(lobby: Arc<Mutex<Lobby>>) -> Self {
        Self { lobby }
    }
}

impl Default for InMemoryLobbyRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(Lobby::new())))
    }
}

#[async_trait]
impl LobbyRepository for InMemoryLobbyRepository {
    async fn register(
        &self,
        user_id: UserId,
        display_name: DisplayName,
        now: Timestamp,
    ) -> LobbyRegistration {
        self.lobby.lock().await.register(user_id, display_name, now)
    }

    async fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> Unregistration {
        self.lobby.lock().await.unregister(user_id, connection_id)
    }

    async fn request_match(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<MatchOutcome, MatchError> {
        self.lobby.lock().await.request_match(user_id, now)
    }

    async fn leave(&self, user_id: &UserId) -> LeaveOutcome {
        self.lobby.lock().await.leave(user_id)
    }

    async fn teardown(
        &self,
        session_id: &SessionId,
        initiator: &UserId,
        reason: TeardownReason,
    ) -> Option<TeardownNotice> {
        self.lobby.lock().await.teardown(session_id, initiator, reason)
    }

    async fn route(&self, from: &UserId) -> Result<Route, RelayError> {
        self.lobby.lock().await.route(from)
    }

    async fn set_reported_online(&self, user_id: &UserId, is_online: bool) -> bool {
        self.lobby.lock().await.set_reported_online(user_id, is_online)
    }

    async fn online_statuses(&self, user_ids: &[UserId]) -> HashMap<UserId, bool> {
        self.lobby.lock().await.online_statuses(user_ids)
    }

    async fn user_ids_except(&self, exclude: &UserId) -> Vec<UserId> {
        self.lobby.lock().await.user_ids_except(exclude)
    }

    async fn stats(&self) -> LobbyStats {
        self.lobby.lock().await.stats()
    }

    async fn snapshot(&self) -> LobbySnapshot {
        self.lobby.lock().await.snapshot()
    }
}
