//! Lobby の状態遷移と、それに伴う通知の enqueue を一続きにするための直列化ロック
//!
//! LobbyRepository は状態遷移を一度きりに確定させるが、通知は遷移後に
//! MessagePusher へ送られる。その間に別のユースケースが割り込むと、
//! 同じユーザーへの通知が遷移の順と逆に届いてしまう。
//! 状態を変えて相手に通知するユースケースは、このロックを取ってから
//! Lobby を操作し、通知を送り終えるまで保持する。
//!
//! ロックの順序は EventSequencer -> Lobby -> MessagePusher の一方向のみ。

use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct EventSequencer {
    gate: Mutex<()>,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 遷移と通知の区間を開始する。ガードを落とすと区間が終わる
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}
