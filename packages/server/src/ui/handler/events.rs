//! Per-connection dispatch of client events to the use cases.

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::{mpsc, watch};

use crate::{
    domain::{MessageContent, PusherChannel, SignalKind, UserId},
    infrastructure::dto::websocket::{ClientEvent, ErrorCode, ServerEvent},
    ui::state::AppState,
    usecase::EndCallError,
};

use super::websocket::Authenticated;

/// State of one socket between frames
pub(super) struct ClientSession {
    state: Arc<AppState>,
    /// Direct replies to this socket. Weak so that dropping the pusher's sender closes the socket.
    replies: mpsc::WeakUnboundedSender<String>,
    /// Handed to the MessagePusher on `authenticate`
    pusher_channel: Option<PusherChannel>,
    identity: watch::Sender<Option<Authenticated>>,
}

impl ClientSession {
    pub fn new(
        state: Arc<AppState>,
        channel: PusherChannel,
        identity: watch::Sender<Option<Authenticated>>,
    ) -> Self {
        Self {
            state,
            replies: channel.downgrade(),
            pusher_channel: Some(channel),
            identity,
        }
    }

    pub async fn handle_text(&mut self, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("Malformed client event: {}", e);
                self.reply_error(ErrorCode::InvalidPayload, format!("malformed event: {e}"));
                return;
            }
        };

        match event {
            ClientEvent::Authenticate { token } => self.authenticate(&token).await,
            event => match self.user_id() {
                Some(user_id) => self.dispatch(&user_id, event).await,
                None => self.reply_error(ErrorCode::NotAuthenticated, "authenticate first"),
            },
        }
    }

    async fn authenticate(&mut self, token: &str) {
        let Some(channel) = self.pusher_channel.take() else {
            self.reply_error(ErrorCode::AlreadyAuthenticated, "already authenticated");
            return;
        };

        let connected = self
            .state
            .connect_user_usecase
            .execute(token, channel)
            .await;
        let user_id = connected.identity.user_id.clone();
        self.identity.send_replace(Some(Authenticated {
            user_id: user_id.clone(),
            connection_id: connected.connection_id,
        }));

        tracing::info!(
            "'{}' authenticated as {} (verified: {})",
            user_id,
            connected.connection_id,
            connected.verified
        );
        self.reply(&ServerEvent::Authenticated {
            user_id: user_id.as_str().to_string(),
            username: connected.identity.username.into_string(),
        });

        self.state.presence_usecase.set_online(&user_id, true).await;
    }

    async fn dispatch(&self, user_id: &UserId, event: ClientEvent) {
        match event {
            ClientEvent::Authenticate { .. } => {
                self.reply_error(ErrorCode::AlreadyAuthenticated, "already authenticated");
            }
            ClientEvent::SearchChat => {
                // searching / chat_connected arrive through the MessagePusher
                if let Err(e) = self.state.request_match_usecase.execute(user_id).await {
                    self.reply(&ServerEvent::from(&e));
                }
            }
            ClientEvent::SendMessage { content } => {
                let content = match MessageContent::new(content) {
                    Ok(content) => content,
                    Err(e) => {
                        self.reply_error(ErrorCode::InvalidPayload, e.to_string());
                        return;
                    }
                };
                if let Err(e) = self.state.relay_usecase.send(user_id, content).await {
                    self.reply(&ServerEvent::from(&e));
                }
            }
            ClientEvent::Typing { is_typing } => {
                self.state.relay_usecase.set_typing(user_id, is_typing).await;
            }
            ClientEvent::LeaveChat => {
                let outcome = self.state.leave_chat_usecase.execute(user_id).await;
                if let Some(notice) = outcome.teardown {
                    self.reply(&ServerEvent::ChatEnded {
                        session_id: notice.session_id.as_str().to_string(),
                    });
                }
            }
            ClientEvent::VideoOffer { to, payload } => {
                self.relay_signal(user_id, SignalKind::Offer, to, payload)
                    .await;
            }
            ClientEvent::VideoAnswer { to, payload } => {
                self.relay_signal(user_id, SignalKind::Answer, to, payload)
                    .await;
            }
            ClientEvent::IceCandidate { to, payload } => {
                self.relay_signal(user_id, SignalKind::IceCandidate, to, payload)
                    .await;
            }
            ClientEvent::EndVideoCall { partner_id } => {
                let partner_id = match UserId::new(partner_id) {
                    Ok(id) => id,
                    Err(e) => {
                        self.reply_error(ErrorCode::InvalidPayload, e.to_string());
                        return;
                    }
                };
                match self.state.relay_usecase.end_call(user_id, &partner_id).await {
                    Ok(Some(session_id)) => self.reply(&ServerEvent::ChatEnded {
                        session_id: session_id.as_str().to_string(),
                    }),
                    Ok(None) => {}
                    Err(EndCallError::Relay(e)) => self.reply(&ServerEvent::from(&e)),
                    Err(e @ EndCallError::PartnerMismatch(_)) => {
                        self.reply_error(ErrorCode::NotInSession, e.to_string());
                    }
                }
            }
            ClientEvent::SendFriendRequest => {
                if let Err(e) = self.state.relay_usecase.send_friend_request(user_id).await {
                    self.reply(&ServerEvent::from(&e));
                }
            }
            ClientEvent::UpdateOnlineStatus { is_online } => {
                self.state
                    .presence_usecase
                    .set_online(user_id, is_online)
                    .await;
            }
            ClientEvent::CheckFriendsStatus { friend_ids } => {
                self.check_friends_status(user_id, friend_ids).await;
            }
        }
    }

    async fn relay_signal(
        &self,
        user_id: &UserId,
        kind: SignalKind,
        to: Option<String>,
        payload: serde_json::Value,
    ) {
        let to = match to.map(UserId::new).transpose() {
            Ok(to) => to,
            Err(e) => {
                self.reply_error(ErrorCode::InvalidPayload, e.to_string());
                return;
            }
        };
        if let Err(e) = self
            .state
            .relay_usecase
            .relay_signal(user_id, kind, payload, to.as_ref())
            .await
        {
            self.reply(&ServerEvent::from(&e));
        }
    }

    /// Ids that are not valid user ids cannot be registered, so they are reported offline
    async fn check_friends_status(&self, user_id: &UserId, friend_ids: Vec<String>) {
        let mut statuses: BTreeMap<String, bool> = BTreeMap::new();
        let mut valid = Vec::with_capacity(friend_ids.len());
        for raw in friend_ids {
            match UserId::new(raw.clone()) {
                Ok(id) => valid.push(id),
                Err(_) => {
                    statuses.insert(raw, false);
                }
            }
        }

        let online = self
            .state
            .presence_usecase
            .query_statuses(user_id, &valid)
            .await;
        statuses.extend(
            online
                .into_iter()
                .map(|(id, is_online)| (id.into_string(), is_online)),
        );

        self.reply(&ServerEvent::FriendsStatusUpdate { statuses });
    }

    fn user_id(&self) -> Option<UserId> {
        self.identity
            .borrow()
            .as_ref()
            .map(|authenticated| authenticated.user_id.clone())
    }

    fn reply_error(&self, code: ErrorCode, message: impl Into<String>) {
        self.reply(&ServerEvent::error(code, message));
    }

    fn reply(&self, event: &ServerEvent) {
        let Some(sender) = self.replies.upgrade() else {
            tracing::debug!("Reply dropped, socket is closing");
            return;
        };
        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = sender.send(json) {
                    tracing::debug!("Reply dropped: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to encode server event: {}", e),
        }
    }
}
