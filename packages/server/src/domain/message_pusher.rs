//! MessagePusher trait 定義
//!
//! 接続中のクライアントへ通知を届けるためのインターフェース。
//! 配送は at-most-once / best-effort で、キューイングはしない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::MessagePushError,
    notification::Notification,
    value_object::{ConnectionId, UserId},
};

/// クライアントの送信キュー（エンコード済みのテキストフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録する。
    ///
    /// 同じ UserId の古いチャンネルは破棄される（古いソケットの送信ループが終了する）。
    async fn register_client(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    );

    /// `connection_id` が現在のものである場合に限り登録解除する
    async fn unregister_client(&self, user_id: &UserId, connection_id: ConnectionId);

    /// 特定のクライアントに送信
    async fn push_to(
        &self,
        user_id: &UserId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントに送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<UserId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;
}
