//! UseCase: ユーザー接続（authenticate）処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::execute() メソッド
//! - トークン検証、Registry への登録、MessagePusher への登録
//!
//! ### なぜこのテストが必要か
//! - 検証サービスが落ちていてもマッチングは続けられること（ゲスト身元へのフォールバック）
//! - 同じ UserId の再接続で古い Session の相手に通知が届くこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：トークン検証成功
//! - 異常系：検証失敗・検証サービス未設定
//! - エッジケース：Session 中の UserId による再接続

use std::sync::Arc;

use tandem_shared::time::Clock;

use crate::domain::{
    ConnectionId, LobbyRepository, MessagePusher, PusherChannel, Timestamp, TokenVerifier,
    VerifiedIdentity,
};

use super::{notify::deliver_teardown, sequencer::EventSequencer};

/// 接続結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedUser {
    pub identity: VerifiedIdentity,
    pub connection_id: ConnectionId,
    /// 置き換えた古い接続
    pub superseded: Option<ConnectionId>,
    /// 外部サービスで検証された身元か（false ならゲスト）
    pub verified: bool,
}

/// ユーザー接続のユースケース
pub struct ConnectUserUseCase {
    lobby: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    /// 未設定ならすべての接続がゲストになる
    token_verifier: Option<Arc<dyn TokenVerifier>>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<EventSequencer>,
}

impl ConnectUserUseCase {
    pub fn new(
        lobby: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        token_verifier: Option<Arc<dyn TokenVerifier>>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<EventSequencer>,
    ) -> Self {
        Self {
            lobby,
            message_pusher,
            token_verifier,
            clock,
            sequencer,
        }
    }

    /// トークンを検証して登録する
    ///
    /// # Arguments
    ///
    /// * `token` - クライアントが送ってきた認証トークン
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    pub async fn execute(&self, token: &str, sender: PusherChannel) -> ConnectedUser {
        let (identity, verified) = self.resolve_identity(token).await;

        let _section = self.sequencer.lock().await;
        let now = Timestamp::new(self.clock.now_millis());

        // 1. Registry に登録（古い接続があれば Pool / Session ごと片付く）
        let registration = self
            .lobby
            .register(identity.user_id.clone(), identity.username.clone(), now)
            .await;

        // 2. MessagePusher に登録（古い送信チャンネルはここで閉じる）
        self.message_pusher
            .register_client(identity.user_id.clone(), registration.connection_id, sender)
            .await;

        // 3. 古い接続の Session 相手に通知
        if let Some(notice) = &registration.teardown {
            deliver_teardown(self.message_pusher.as_ref(), notice).await;
        }

        if let Some(old) = registration.superseded {
            tracing::info!(
                "'{}' reconnected, {} supersedes {}",
                identity.user_id,
                registration.connection_id,
                old
            );
        }

        ConnectedUser {
            identity,
            connection_id: registration.connection_id,
            superseded: registration.superseded,
            verified,
        }
    }

    /// 検証に失敗してもエラーにはせず、ゲスト身元にフォールバックする
    async fn resolve_identity(&self, token: &str) -> (VerifiedIdentity, bool) {
        let Some(verifier) = &self.token_verifier else {
            return (VerifiedIdentity::guest(), false);
        };

        match verifier.verify(token).await {
            Ok(identity) => (identity, true),
            Err(e) => {
                let guest = VerifiedIdentity::guest();
                tracing::warn!(
                    "Token verification failed ({}), continuing as '{}'",
                    e,
                    guest.user_id
                );
                (guest, false)
            }
        }
    }
}
