//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::HashMap;

use async_trait::async_trait;

use super::{
    entity::ChatMessage,
    error::{MatchError, RelayError, RepositoryError},
    lobby::{
        LeaveOutcome, LobbyRegistration, LobbySnapshot, LobbyStats, MatchOutcome, Route,
        TeardownNotice, Unregistration,
    },
    value_object::{ConnectionId, DisplayName, SessionId, TeardownReason, Timestamp, UserId},
};

/// Lobby Repository trait
///
/// Connection Registry / Waiting Pool / Session テーブルへのアクセス。
/// 各メソッドは 1 回のロック取得の中で完結する複合操作で、
/// 呼び出し同士が交錯しても途中状態は観測されない。
#[async_trait]
pub trait LobbyRepository: Send + Sync {
    async fn register(
        &self,
        user_id: UserId,
        display_name: DisplayName,
        now: Timestamp,
    ) -> LobbyRegistration;

    /// 接続削除 + Waiting Pool 削除 + Session 破棄
    async fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> Unregistration;

    async fn request_match(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<MatchOutcome, MatchError>;

    async fn leave(&self, user_id: &UserId) -> LeaveOutcome;

    async fn teardown(
        &self,
        session_id: &SessionId,
        initiator: &UserId,
        reason: TeardownReason,
    ) -> Option<TeardownNotice>;

    async fn route(&self, from: &UserId) -> Result<Route, RelayError>;

    /// 申告されたオンライン状態を記録。未登録なら `false`
    async fn set_reported_online(&self, user_id: &UserId, is_online: bool) -> bool;

    async fn online_statuses(&self, user_ids: &[UserId]) -> HashMap<UserId, bool>;

    async fn user_ids_except(&self, exclude: &UserId) -> Vec<UserId>;

    async fn stats(&self) -> LobbyStats;

    async fn snapshot(&self) -> LobbySnapshot;
}

/// 外部メッセージストア（チャット履歴）
///
/// 書き込みはクリティカルパスの外で行われ、失敗しても中継は止めない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn save_message(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// Session のメッセージを古い順に返す
    async fn messages_in_session(&self, session_id: &SessionId) -> Vec<ChatMessage>;
}
