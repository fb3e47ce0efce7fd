//! UseCase: マッチング要求（search_chat）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RequestMatchUseCase::execute() メソッド
//! - 要求した側に searching / chat_connected、待っていた側に chat_connected が届くこと
//! - ペア成立の通知と、直後の切断による partner_left の順序
//!
//! ### なぜこのテストが必要か
//! - 要求した側の chat_connected より先に partner_left が届くと、クライアントは
//!   存在しない Session にいると思い込む
//!
//! ### どのような状況を想定しているか
//! - 正常系：待機、ペア成立
//! - 異常系：Session 中の再要求、未登録ユーザー
//! - エッジケース：ペア成立の通知中に相手が切断

use std::sync::Arc;

use tandem_shared::time::Clock;

use crate::domain::{
    LobbyRepository, MatchError, MatchOutcome, MessagePusher, Notification, Timestamp, UserId,
};

use super::sequencer::EventSequencer;

/// マッチング要求のユースケース
pub struct RequestMatchUseCase {
    lobby: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<EventSequencer>,
}

impl RequestMatchUseCase {
    pub fn new(
        lobby: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<EventSequencer>,
    ) -> Self {
        Self {
            lobby,
            message_pusher,
            clock,
            sequencer,
        }
    }

    /// マッチングを要求する
    ///
    /// 結果は要求した側にも MessagePusher 経由で通知する。ペア成立時は
    /// 要求した側、待っていた側の順に chat_connected を送る。
    ///
    /// # Returns
    ///
    /// * `Ok(MatchOutcome::Searching)` - Waiting Pool に入った
    /// * `Ok(MatchOutcome::Paired)` - ペア成立。双方に通知済み
    /// * `Err(MatchError)` - Session 中、または未登録
    pub async fn execute(&self, user_id: &UserId) -> Result<MatchOutcome, MatchError> {
        let _section = self.sequencer.lock().await;
        let now = Timestamp::new(self.clock.now_millis());
        let outcome = self.lobby.request_match(user_id, now).await?;

        match &outcome {
            MatchOutcome::Searching => {
                tracing::info!("'{}' is waiting for a partner", user_id);
                self.notify(user_id, &Notification::Searching).await;
            }
            MatchOutcome::Paired {
                session_id,
                me,
                partner,
            } => {
                tracing::info!(
                    "Paired '{}' with '{}' in session {}",
                    me.user_id,
                    partner.user_id,
                    session_id
                );
                let to_me = Notification::ChatConnected {
                    session_id: session_id.clone(),
                    partner: partner.clone(),
                };
                self.notify(&me.user_id, &to_me).await;
                let to_partner = Notification::ChatConnected {
                    session_id: session_id.clone(),
                    partner: me.clone(),
                };
                self.notify(&partner.user_id, &to_partner).await;
            }
        }

        Ok(outcome)
    }

    async fn notify(&self, user_id: &UserId, notification: &Notification) {
        if let Err(e) = self.message_pusher.push_to(user_id, notification).await {
            tracing::warn!("Failed to notify '{}' of match: {}", user_id, e);
        }
    }
}
