//! UseCase: Lobby の状態取得（HTTP / デバッグ用）

use std::sync::Arc;

use crate::domain::{LobbyRepository, LobbySnapshot, LobbyStats};

pub struct GetLobbyStateUseCase {
    lobby: Arc<dyn LobbyRepository>,
}

impl GetLobbyStateUseCase {
    pub fn new(lobby: Arc<dyn LobbyRepository>) -> Self {
        Self { lobby }
    }

    pub async fn stats(&self) -> LobbyStats {
        self.lobby.stats().await
    }

    /// 全 Connection / WaitingEntry / Session と不変条件違反の一覧
    pub async fn snapshot(&self) -> LobbySnapshot {
        self.lobby.snapshot().await
    }
}
