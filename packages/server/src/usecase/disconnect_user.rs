//! UseCase: ユーザー切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUserUseCase::execute() メソッド
//! - Registry からの削除と、それに連鎖する Waiting Pool 削除・Session 破棄
//!
//! ### なぜこのテストが必要か
//! - 切断したユーザーが Pool に残ってマッチングされる「幽霊マッチ」を防ぐ
//! - Session 相手に partner_left がちょうど 1 回届くことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：待機中・Session 中のユーザーの切断
//! - エッジケース：二重切断、再接続で置き換えられた古い接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionId, LobbyRepository, MessagePusher, Unregistration, UserId};

use super::{notify::deliver_teardown, sequencer::EventSequencer};

/// ユーザー切断のユースケース
pub struct DisconnectUserUseCase {
    lobby: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<EventSequencer>,
}

impl DisconnectUserUseCase {
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

    /// 切断を実行
    ///
    /// `connection_id` が既に置き換えられている場合は何もしない。
    pub async fn execute(&self, user_id: &UserId, connection_id: ConnectionId) -> Unregistration {
        let _section = self.sequencer.lock().await;

        // 1. Registry / Waiting Pool / Session をまとめて片付ける
        let unregistration = self.lobby.unregister(user_id, connection_id).await;

        // 2. MessagePusher から登録解除（置き換え済みなら新しい送信チャンネルは残る）
        self.message_pusher
            .unregister_client(user_id, connection_id)
            .await;

        // 3. Session 相手に通知
        if let Some(notice) = &unregistration.teardown {
            deliver_teardown(self.message_pusher.as_ref(), notice).await;
        }

        if unregistration.removed {
            tracing::info!("'{}' disconnected ({})", user_id, connection_id);
        } else {
            tracing::debug!(
                "Ignoring disconnect of stale {} for '{}'",
                connection_id,
                user_id
            );
        }

        unregistration
    }
}
