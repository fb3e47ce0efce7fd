//! InMemory Message Repository 実装
//!
//! 外部のリレーショナルストアの代わりに、直近のメッセージを上限付きで保持する。
//! 上限に達したら最も古いメッセージから捨てる。

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, MessageRepository, RepositoryError, SessionId};

/// デフォルトの保持上限
pub const DEFAULT_MESSAGE_CAPACITY: usize = 10_000;

pub struct InMemoryMessageRepository {
    /// 古い順
    messages: Mutex<VecDeque<ChatMessage>>,
    capacity: usize,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MESSAGE_CAPACITY)
    }

    /// `capacity` は 1 以上に切り上げる
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn count(&self) -> usize {
        self.messages.lock().await.len()
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save_message(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        while messages.len() >= self.capacity {
            if let Some(evicted) = messages.pop_front() {
                tracing::trace!("Evicted message {} from the store", evicted.id);
            }
        }
        messages.push_back(message);
        Ok(())
    }

    async fn messages_in_session(&self, session_id: &SessionId) -> Vec<ChatMessage> {
        let messages = self.messages.lock().await;
        messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect()
    }
}
