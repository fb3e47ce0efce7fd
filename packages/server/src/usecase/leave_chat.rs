//! UseCase: チャット離脱（leave_chat）

use std::sync::Arc;

use crate::domain::{LeaveOutcome, LobbyRepository, MessagePusher, UserId};

use super::{notify::deliver_teardown, sequencer::EventSequencer};

pub struct LeaveChatUseCase {
    lobby: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<EventSequencer>,
}

impl LeaveChatUseCase {
    pub fn new(
        lobby: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        sequencer: Arc<EventSequencer>,
    ) -> Self {
        Self {
            lobby,
            message_pusher,
            sequencer,
        }
    }

    /// 待機中なら Pool から抜け、Session 中なら破棄して相手に partner_left を送る
    pub async fn execute(&self, user_id: &UserId) -> LeaveOutcome {
        let _section = self.sequencer.lock().await;
        let outcome = self.lobby.leave(user_id).await;

        if let Some(notice) = &outcome.teardown {
            deliver_teardown(self.message_pusher.as_ref(), notice).await;
        } else if outcome.left_pool {
            tracing::info!("'{}' stopped searching", user_id);
        }

        outcome
    }
}
