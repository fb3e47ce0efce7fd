//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by `type` (snake_case event name);
//! payload fields are camelCase, e.g.
//! `{"type":"chat_connected","partnerId":"u1","username":"Alice","sessionId":"..."}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client -> server events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Authenticate {
        token: String,
    },
    SearchChat,
    SendMessage {
        content: String,
    },
    Typing {
        is_typing: bool,
    },
    LeaveChat,
    VideoOffer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        payload: Value,
    },
    VideoAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        payload: Value,
    },
    IceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        payload: Value,
    },
    EndVideoCall {
        partner_id: String,
    },
    SendFriendRequest,
    UpdateOnlineStatus {
        is_online: bool,
    },
    CheckFriendsStatus {
        friend_ids: Vec<String>,
    },
}

/// Server -> client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Authenticated {
        user_id: String,
        username: String,
    },
    Searching,
    ChatConnected {
        partner_id: String,
        username: String,
        session_id: String,
    },
    ReceiveMessage {
        id: String,
        from: String,
        content: String,
        timestamp: i64,
    },
    PartnerTyping {
        is_typing: bool,
    },
    PartnerLeft {
        session_id: String,
    },
    /// Acknowledges the caller's own leave_chat / end_video_call
    ChatEnded {
        session_id: String,
    },
    VideoOffer {
        from: String,
        payload: Value,
    },
    VideoAnswer {
        from: String,
        payload: Value,
    },
    IceCandidate {
        from: String,
        payload: Value,
    },
    VideoCallEnded {
        from: String,
        session_id: String,
    },
    FriendRequestReceived {
        from: String,
        username: String,
    },
    UserStatusChange {
        user_id: String,
        is_online: bool,
    },
    FriendsStatusUpdate {
        statuses: BTreeMap<String, bool>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotAuthenticated,
    AlreadyAuthenticated,
    AlreadyInSession,
    NotInSession,
    InvalidPayload,
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
