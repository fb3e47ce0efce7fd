//! Session 破棄通知の配送
//!
//! 破棄そのものは LobbyRepository の中で一度きりに確定している。
//! ここでは確定した `TeardownNotice` を相手に届けるだけで、届かなくても何もしない。

use crate::domain::{MessagePusher, Notification, TeardownNotice};

pub(crate) async fn deliver_teardown(message_pusher: &dyn MessagePusher, notice: &TeardownNotice) {
    let notification = Notification::from(notice);
    match message_pusher.push_to(&notice.notify, &notification).await {
        Ok(()) => tracing::info!(
            "Session {} ended by '{}' ({:?}), notified '{}'",
            notice.session_id,
            notice.initiator,
            notice.reason,
            notice.notify
        ),
        Err(e) => tracing::debug!(
            "Session {} ended but '{}' could not be notified: {}",
            notice.session_id,
            notice.notify,
            e
        ),
    }
}
