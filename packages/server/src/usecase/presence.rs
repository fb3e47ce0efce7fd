//! UseCase: Presence Notifier
//!
//! オンライン状態の変化を他の全接続にブロードキャストする。
//! ソーシャルグラフは外部サービスにあるので、コアは宛先を絞らない。

use std::{collections::HashMap, sync::Arc};

use crate::domain::{LobbyRepository, MessagePusher, Notification, UserId};

pub struct PresenceNotifierUseCase {
    lobby: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl PresenceNotifierUseCase {
    pub fn new(lobby: Arc<dyn LobbyRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            lobby,
            message_pusher,
        }
    }

    /// 状態を記録し、本人以外の全接続に通知する
    ///
    /// 切断直後など既に登録が消えている場合は記録をせず通知だけ行う。
    pub async fn set_online(&self, user_id: &UserId, is_online: bool) {
        let recorded = self.lobby.set_reported_online(user_id, is_online).await;
        let targets = self.lobby.user_ids_except(user_id).await;
        tracing::debug!(
            "'{}' is {} (recorded: {}), notifying {} connections",
            user_id,
            if is_online { "online" } else { "offline" },
            recorded,
            targets.len()
        );
        if targets.is_empty() {
            return;
        }

        let notification = Notification::StatusChange {
            user_id: user_id.clone(),
            is_online,
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(targets, &notification)
            .await
        {
            tracing::debug!("Status change of '{}' partially delivered: {}", user_id, e);
        }
    }

    /// 各 ID が現在接続中かを返す（副作用なし）
    pub async fn query_statuses(
        &self,
        requester: &UserId,
        friend_ids: &[UserId],
    ) -> HashMap<UserId, bool> {
        tracing::debug!(
            "'{}' asked for the status of {} users",
            requester,
            friend_ids.len()
        );
        self.lobby.online_statuses(friend_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{infrastructure::dto::websocket::ServerEvent, usecase::test_support::TestWorld};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_set_online_broadcasts_to_everyone_else() {
        // テスト項目: 状態の変化が本人以外の全接続に届く
        // given (前提条件):
        let world = TestWorld::new();
        let mut alice = world.connect("alice").await;
        let mut bob = world.connect("bob").await;
        let mut carol = world.connect("carol").await;
        let usecase = PresenceNotifierUseCase::new(world.lobby.clone(), world.pusher.clone());

        // when (操作):
        usecase.set_online(&alice.user_id, false).await;

        // then (期待する結果):
        let expected = vec![ServerEvent::UserStatusChange {
            user_id: "alice".to_string(),
            is_online: false,
        }];
        assert_eq!(bob.drain(), expected);
        assert_eq!(carol.drain(), expected);
        assert!(alice.drain().is_empty());
        let snapshot = world.lobby.snapshot().await;
        let alice_connection = snapshot
            .connections
            .iter()
            .find(|c| c.user_id == alice.user_id)
            .unwrap();
        assert!(!alice_connection.reported_online);
    }

    #[tokio::test]
    async fn test_query_statuses_reflects_registry() {
        // テスト項目: 接続中の ID だけが true になり、何も変更されない
        // given (前提条件):
        let world = TestWorld::new();
        let alice = world.connect("alice").await;
        let _bob = world.connect("bob").await;
        let usecase = PresenceNotifierUseCase::new(world.lobby.clone(), world.pusher.clone());
        let before = world.lobby.stats().await;

        // when (操作):
        let statuses = usecase
            .query_statuses(&alice.user_id, &[user("bob"), user("dave")])
            .await;

        // then (期待する結果):
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses.get(&user("bob")), Some(&true));
        assert_eq!(statuses.get(&user("dave")), Some(&false));
        assert_eq!(world.lobby.stats().await, before);
    }
}
