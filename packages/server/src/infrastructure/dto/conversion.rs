//! Conversion logic between DTOs and domain types.

use crate::domain::{MatchError, Notification, PeerInfo, RelayError, SessionId, SignalKind};
use crate::infrastructure::dto::websocket::{ErrorCode, ServerEvent};

// ========================================
// Domain -> DTO
// ========================================

impl From<Notification> for ServerEvent {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::Searching => Self::Searching,
            Notification::ChatConnected {
                session_id,
                partner,
            } => chat_connected(&session_id, partner),
            Notification::MessageReceived(message) => Self::ReceiveMessage {
                id: message.id.as_str().to_string(),
                from: message.from.into_string(),
                content: message.content.into_string(),
                timestamp: message.timestamp.value(),
            },
            Notification::PartnerTyping { is_typing } => Self::PartnerTyping { is_typing },
            Notification::PartnerLeft { session_id } => Self::PartnerLeft {
                session_id: session_id.as_str().to_string(),
            },
            Notification::VideoCallEnded { session_id, from } => Self::VideoCallEnded {
                from: from.into_string(),
                session_id: session_id.as_str().to_string(),
            },
            Notification::Signal {
                kind,
                from,
                payload,
            } => {
                let from = from.into_string();
                match kind {
                    SignalKind::Offer => Self::VideoOffer { from, payload },
                    SignalKind::Answer => Self::VideoAnswer { from, payload },
                    SignalKind::IceCandidate => Self::IceCandidate { from, payload },
                }
            }
            Notification::FriendRequest { from } => Self::FriendRequestReceived {
                from: from.user_id.into_string(),
                username: from.display_name.into_string(),
            },
            Notification::StatusChange { user_id, is_online } => Self::UserStatusChange {
                user_id: user_id.into_string(),
                is_online,
            },
        }
    }
}

/// `chat_connected` as seen by the side that receives `partner`
fn chat_connected(session_id: &SessionId, partner: PeerInfo) -> ServerEvent {
    ServerEvent::ChatConnected {
        partner_id: partner.user_id.into_string(),
        username: partner.display_name.into_string(),
        session_id: session_id.as_str().to_string(),
    }
}

impl From<&MatchError> for ServerEvent {
    fn from(error: &MatchError) -> Self {
        let code = match error {
            MatchError::AlreadyInSession => ErrorCode::AlreadyInSession,
            MatchError::NotRegistered(_) => ErrorCode::NotAuthenticated,
        };
        ServerEvent::error(code, error.to_string())
    }
}

impl From<&RelayError> for ServerEvent {
    fn from(error: &RelayError) -> Self {
        let code = match error {
            RelayError::NotInSession => ErrorCode::NotInSession,
            RelayError::NotRegistered(_) => ErrorCode::NotAuthenticated,
        };
        ServerEvent::error(code, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ChatMessage, DisplayName, MessageContent, MessageId, Timestamp, UserId,
    };
    use serde_json::json;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_message_notification_to_receive_message() {
        // テスト項目: MessageReceived が receive_message に変換される
        // given (前提条件):
        let message = ChatMessage {
            id: MessageId::generate(),
            session_id: SessionId::generate(),
            from: user("alice"),
            to: user("bob"),
            content: MessageContent::new("hello".to_string()).unwrap(),
            timestamp: Timestamp::new(2000),
        };
        let id = message.id.as_str().to_string();

        // when (操作):
        let event: ServerEvent = Notification::MessageReceived(message).into();

        // then (期待する結果):
        assert_eq!(
            event,
            ServerEvent::ReceiveMessage {
                id,
                from: "alice".to_string(),
                content: "hello".to_string(),
                timestamp: 2000,
            }
        );
    }

    #[test]
    fn test_signal_kind_selects_event_type() {
        // テスト項目: SignalKind ごとに video_offer / video_answer / ice_candidate になる
        // given (前提条件):
        let payload = json!({"sdp": "v=0"});

        // when (操作):
        let answer: ServerEvent = Notification::Signal {
            kind: SignalKind::Answer,
            from: user("bob"),
            payload: payload.clone(),
        }
        .into();

        // then (期待する結果):
        assert_eq!(
            answer,
            ServerEvent::VideoAnswer {
                from: "bob".to_string(),
                payload,
            }
        );
    }

    #[test]
    fn test_chat_connected_carries_partner() {
        // テスト項目: chat_connected に相手の ID と名前が入る
        // given (前提条件):
        let session_id = SessionId::generate();
        let partner = PeerInfo {
            user_id: user("u1"),
            display_name: DisplayName::new("Alice".to_string()).unwrap(),
        };

        // when (操作):
        let event = chat_connected(&session_id, partner);

        // then (期待する結果):
        assert_eq!(
            event,
            ServerEvent::ChatConnected {
                partner_id: "u1".to_string(),
                username: "Alice".to_string(),
                session_id: session_id.as_str().to_string(),
            }
        );
    }

    #[test]
    fn test_match_error_maps_to_error_code() {
        // テスト項目: AlreadyInSession は already_in_session エラーになる
        // given (前提条件):
        let error = MatchError::AlreadyInSession;

        // when (操作):
        let event = ServerEvent::from(&error);

        // then (期待する結果):
        assert!(matches!(
            event,
            ServerEvent::Error {
                code: ErrorCode::AlreadyInSession,
                ..
            }
        ));
    }
}
