//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - UserId ごとに WebSocket の `UnboundedSender` を 1 本だけ管理
//! - 通知を `ServerEvent` の JSON にエンコードして送信（push_to, broadcast）
//!
//! ## 置き換え
//!
//! 同じ UserId で `register_client` されると古い sender はここで破棄される。
//! 古いソケットの送信ループは受信側が閉じたことで終了し、ソケットも閉じられる。
//! 古い接続からの `unregister_client` は ConnectionId が一致しないので無視される。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, Notification, PusherChannel, UserId},
    infrastructure::dto::websocket::ServerEvent,
};

/// 登録中のクライアント
pub struct PusherClient {
    pub connection_id: ConnectionId,
    pub sender: PusherChannel,
}

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// Key: user_id
    clients: Arc<Mutex<HashMap<UserId, PusherClient>>>,
}

impl WebSocketMessagePusher {
    pub fn new(clients: Arc<Mutex<HashMap<UserId, PusherClient>>>) -> Self {
        Self { clients }
    }

    fn encode(notification: &Notification) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEvent::from(notification.clone()))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) {
        let mut clients = self.clients.lock().await;
        // ConnectionId は登録順に増える。追い越された古い登録は送信チャンネルごと捨てる
        if let Some(current) = clients.get(&user_id)
            && current.connection_id > connection_id
        {
            tracing::debug!(
                "Client '{}' already has newer {}, dropping {}",
                user_id,
                current.connection_id,
                connection_id
            );
            return;
        }
        let previous = clients.insert(
            user_id.clone(),
            PusherClient {
                connection_id,
                sender,
            },
        );
        match previous {
            Some(old) => tracing::info!(
                "Client '{}' re-registered ({} -> {}), dropping old channel",
                user_id,
                old.connection_id,
                connection_id
            ),
            None => tracing::debug!("Client '{}' registered to MessagePusher", user_id),
        }
    }

    async fn unregister_client(&self, user_id: &UserId, connection_id: ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients
            .get(user_id)
            .is_some_and(|c| c.connection_id == connection_id)
        {
            clients.remove(user_id);
            tracing::debug!("Client '{}' unregistered from MessagePusher", user_id);
        } else {
            tracing::debug!(
                "Ignoring unregister of stale connection {} for '{}'",
                connection_id,
                user_id
            );
        }
    }

    async fn push_to(
        &self,
        user_id: &UserId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(notification)?;
        let clients = self.clients.lock().await;

        let client = clients
            .get(user_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(user_id.to_string()))?;
        client
            .sender
            .send(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to client '{}'", user_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<UserId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(notification)?;
        let clients = self.clients.lock().await;

        for target in targets {
            if let Some(client) = clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = client.sender.send(content.clone()) {
                    tracing::warn!("Failed to push message to client '{}': {}", target, e);
                }
            } else {
                tracing::debug!("Client '{}' not found during broadcast, skipping", target);
            }
        }

        Ok(())
    }
}
