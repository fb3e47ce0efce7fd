//! Notifications pushed from the core to a connected user.
//!
//! These are the server-initiated events the relay and presence notifier
//! produce. The transport decides how to encode them (see
//! `infrastructure::dto::conversion`).

use serde_json::Value;

use super::{
    entity::ChatMessage,
    lobby::{PeerInfo, TeardownNotice},
    value_object::{SessionId, SignalKind, TeardownReason, UserId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Entered the waiting pool
    Searching,
    /// Paired with `partner`
    ChatConnected {
        session_id: SessionId,
        partner: PeerInfo,
    },
    MessageReceived(ChatMessage),
    PartnerTyping {
        is_typing: bool,
    },
    /// Partner left the chat or disconnected
    PartnerLeft {
        session_id: SessionId,
    },
    /// Partner ended the video call (and with it the session)
    VideoCallEnded {
        session_id: SessionId,
        from: UserId,
    },
    /// Opaque WebRTC signaling payload
    Signal {
        kind: SignalKind,
        from: UserId,
        payload: Value,
    },
    FriendRequest {
        from: PeerInfo,
    },
    StatusChange {
        user_id: UserId,
        is_online: bool,
    },
}

impl From<&TeardownNotice> for Notification {
    fn from(notice: &TeardownNotice) -> Self {
        match notice.reason {
            TeardownReason::PartnerLeft | TeardownReason::Disconnected => Self::PartnerLeft {
                session_id: notice.session_id.clone(),
            },
            TeardownReason::CallEnded => Self::VideoCallEnded {
                session_id: notice.session_id.clone(),
                from: notice.initiator.clone(),
            },
        }
    }
}
