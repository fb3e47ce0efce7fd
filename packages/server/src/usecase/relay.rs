//! UseCase: Session Relay
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionRelayUseCase の send / set_typing / relay_signal / end_call / teardown / send_friend_request
//!
//! ### なぜこのテストが必要か
//! - Session 相手にだけ、送信者 ID つきで届くことを保証
//! - 相手が消えた直後（teardown 前）の送信が送信者へのエラーにならないこと
//! - メッセージストアの失敗・遅延が中継を止めないこと
//! - end_video_call の通知がちょうど 1 回であること
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャット・シグナリングの中継
//! - 異常系：Session 外からの送信、相手 ID の食い違い
//! - エッジケース：相手の Connection だけが消えている競合状態、二重 end_video_call

use std::sync::Arc;

use serde_json::Value;
use tandem_shared::time::Clock;

use crate::domain::{
    ChatMessage, LobbyRepository, MessageContent, MessageId, MessagePusher, MessageRepository,
    Notification, RelayError, Route, SessionId, SignalKind, TeardownReason, Timestamp, UserId,
};

use super::{error::EndCallError, notify::deliver_teardown, sequencer::EventSequencer};

/// `send` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { message: ChatMessage },
    /// 相手の Connection が既に無い（teardown 待ちの競合）。メッセージは捨てられる
    PartnerOffline,
}

/// Session 内の中継のユースケース
pub struct SessionRelayUseCase {
    lobby: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    message_repository: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    sequencer: Arc<EventSequencer>,
}

impl SessionRelayUseCase {
    pub fn new(
        lobby: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        message_repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        sequencer: Arc<EventSequencer>,
    ) -> Self {
        Self {
            lobby,
            message_pusher,
            message_repository,
            clock,
            sequencer,
        }
    }

    /// チャットメッセージを相手に転送する
    ///
    /// メッセージストアへの書き込みは別タスクで行い、完了を待たない。
    pub async fn send(
        &self,
        from: &UserId,
        content: MessageContent,
    ) -> Result<SendOutcome, RelayError> {
        let _section = self.sequencer.lock().await;
        let route = self.lobby.route(from).await?;
        if !route.partner_registered {
            tracing::debug!("Dropping message from '{}': partner is gone", from);
            return Ok(SendOutcome::PartnerOffline);
        }

        let message = ChatMessage {
            id: MessageId::generate(),
            session_id: route.session_id,
            from: from.clone(),
            to: route.partner.clone(),
            content,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };

        // 1. メッセージストアへの書き込み（クリティカルパスの外）
        let repository = self.message_repository.clone();
        let record = message.clone();
        tokio::spawn(async move {
            let id = record.id.clone();
            if let Err(e) = repository.save_message(record).await {
                tracing::warn!("Failed to store message {}: {}", id, e);
            }
        });

        // 2. 相手に転送
        let notification = Notification::MessageReceived(message.clone());
        match self
            .message_pusher
            .push_to(&route.partner, &notification)
            .await
        {
            Ok(()) => Ok(SendOutcome::Delivered { message }),
            Err(e) => {
                tracing::debug!("Message from '{}' not delivered: {}", from, e);
                Ok(SendOutcome::PartnerOffline)
            }
        }
    }

    /// 入力中フラグを転送する。Session 外なら黙って捨てる
    pub async fn set_typing(&self, from: &UserId, is_typing: bool) {
        let _section = self.sequencer.lock().await;
        let Some(route) = self.partner_route(from).await else {
            return;
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&route.partner, &Notification::PartnerTyping { is_typing })
            .await
        {
            tracing::debug!("Typing flag from '{}' not delivered: {}", from, e);
        }
    }

    /// WebRTC のシグナリングを送信者 ID つきでそのまま転送する
    ///
    /// `to` はクライアントの申告で、現在の相手と違えば転送しない。
    pub async fn relay_signal(
        &self,
        from: &UserId,
        kind: SignalKind,
        payload: Value,
        to: Option<&UserId>,
    ) -> Result<(), RelayError> {
        let _section = self.sequencer.lock().await;
        let route = self.lobby.route(from).await?;
        if let Some(to) = to
            && to != &route.partner
        {
            tracing::warn!(
                "Dropping {:?} from '{}' addressed to '{}', partner is '{}'",
                kind,
                from,
                to,
                route.partner
            );
            return Ok(());
        }

        let notification = Notification::Signal {
            kind,
            from: from.clone(),
            payload,
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&route.partner, &notification)
            .await
        {
            tracing::debug!("{:?} from '{}' not delivered: {}", kind, from, e);
        }
        Ok(())
    }

    /// ビデオ通話を終了し、Session も破棄する
    ///
    /// # Returns
    ///
    /// * `Ok(Some(session_id))` - この呼び出しで破棄した（相手には video_call_ended を通知済み）
    /// * `Ok(None)` - 競合して既に破棄されていた
    pub async fn end_call(
        &self,
        from: &UserId,
        partner_id: &UserId,
    ) -> Result<Option<SessionId>, EndCallError> {
        let _section = self.sequencer.lock().await;
        let route = self.lobby.route(from).await?;
        if &route.partner != partner_id {
            return Err(EndCallError::PartnerMismatch(partner_id.to_string()));
        }
        let torn_down = self
            .teardown_in_section(&route.session_id, from, TeardownReason::CallEnded)
            .await;
        Ok(torn_down.then_some(route.session_id))
    }

    /// Session を破棄し、`initiator` でない側に通知する。既に消えていれば `false`
    pub async fn teardown(
        &self,
        session_id: &SessionId,
        initiator: &UserId,
        reason: TeardownReason,
    ) -> bool {
        let _section = self.sequencer.lock().await;
        self.teardown_in_section(session_id, initiator, reason)
            .await
    }

    /// 呼び出し側が EventSequencer を保持していること
    async fn teardown_in_section(
        &self,
        session_id: &SessionId,
        initiator: &UserId,
        reason: TeardownReason,
    ) -> bool {
        match self.lobby.teardown(session_id, initiator, reason).await {
            Some(notice) => {
                deliver_teardown(self.message_pusher.as_ref(), &notice).await;
                true
            }
            None => false,
        }
    }

    /// フレンド申請を Session 相手に転送する（承認は外部サービスの責務）
    pub async fn send_friend_request(&self, from: &UserId) -> Result<(), RelayError> {
        let _section = self.sequencer.lock().await;
        let route = self.lobby.route(from).await?;
        let notification = Notification::FriendRequest { from: route.from };
        if let Err(e) = self
            .message_pusher
            .push_to(&route.partner, &notification)
            .await
        {
            tracing::debug!("Friend request from '{}' not delivered: {}", from, e);
        }
        Ok(())
    }

    async fn partner_route(&self, from: &UserId) -> Option<Route> {
        match self.lobby.route(from).await {
            Ok(route) => Some(route),
            Err(e) => {
                tracing::debug!("Nothing to relay for '{}': {}", from, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RepositoryError, repository::MockMessageRepository},
        infrastructure::{
            dto::websocket::ServerEvent, repository::InMemoryMessageRepository,
        },
        usecase::test_support::{TestClient, TestWorld},
    };
    use serde_json::json;
    use std::time::Duration;

    struct Paired {
        world: TestWorld,
        alice: TestClient,
        bob: TestClient,
        session_id: SessionId,
    }

    async fn paired() -> Paired {
        let world = TestWorld::new();
        let alice = world.connect("alice").await;
        let bob = world.connect("bob").await;
        world
            .lobby
            .request_match(&alice.user_id, world.clock_now())
            .await
            .unwrap();
        world
            .lobby
            .request_match(&bob.user_id, world.clock_now())
            .await
            .unwrap();
        let session_id = world.lobby.route(&alice.user_id).await.unwrap().session_id;
        Paired {
            world,
            alice,
            bob,
            session_id,
        }
    }

    fn relay_with(world: &TestWorld, repository: Arc<dyn MessageRepository>) -> SessionRelayUseCase {
        SessionRelayUseCase::new(
            world.lobby.clone(),
            world.pusher.clone(),
            repository,
            world.clock.clone(),
            world.sequencer.clone(),
        )
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    async fn wait_for_count(repository: &InMemoryMessageRepository, expected: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while repository.count().await < expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("message was not stored in time");
    }

    #[tokio::test]
    async fn test_send_delivers_to_partner_and_stores() {
        // テスト項目: メッセージが相手に届き、メッセージストアにも保存される
        // given (前提条件):
        let Paired {
            world,
            mut alice,
            mut bob,
            session_id,
        } = paired().await;
        alice.drain();
        bob.drain();
        let repository = Arc::new(InMemoryMessageRepository::new());
        let relay = relay_with(&world, repository.clone());

        // when (操作):
        let outcome = relay.send(&alice.user_id, content("hello")).await.unwrap();

        // then (期待する結果):
        let SendOutcome::Delivered { message } = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(message.to, bob.user_id);
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::ReceiveMessage {
                id: message.id.as_str().to_string(),
                from: "alice".to_string(),
                content: "hello".to_string(),
                timestamp: 1_700_000_000_000,
            }]
        );
        assert!(alice.drain().is_empty());
        wait_for_count(&repository, 1).await;
        let stored = repository.messages_in_session(&session_id).await;
        assert_eq!(stored, vec![message]);
    }

    #[tokio::test]
    async fn test_send_preserves_order() {
        // テスト項目: 同じ送信者からのメッセージは送った順に届く
        // given (前提条件):
        let Paired {
            world,
            alice,
            mut bob,
            ..
        } = paired().await;
        bob.drain();
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        for text in ["one", "two", "three"] {
            relay.send(&alice.user_id, content(text)).await.unwrap();
        }

        // then (期待する結果):
        let received: Vec<String> = bob
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                ServerEvent::ReceiveMessage { content, .. } => Some(content),
                _ => None,
            })
            .collect();
        assert_eq!(received, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_send_survives_store_failure() {
        // テスト項目: メッセージストアが失敗しても中継は成功する
        // given (前提条件):
        let Paired {
            world,
            alice,
            mut bob,
            ..
        } = paired().await;
        bob.drain();
        let mut repository = MockMessageRepository::new();
        repository
            .expect_save_message()
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let relay = relay_with(&world, Arc::new(repository));

        // when (操作):
        let outcome = relay.send(&alice.user_id, content("still here")).await;

        // then (期待する結果):
        assert!(matches!(outcome, Ok(SendOutcome::Delivered { .. })));
        assert_eq!(bob.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_send_outside_session_is_rejected() {
        // テスト項目: Session 外からの send_message は NotInSession
        // given (前提条件):
        let world = TestWorld::new();
        let alice = world.connect("alice").await;
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        let result = relay.send(&alice.user_id, content("anyone?")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NotInSession));
    }

    #[tokio::test]
    async fn test_send_to_vanished_partner_reports_offline() {
        // テスト項目: 相手の送信チャンネルが消えていても送信者にはエラーにならない
        // given (前提条件):
        let Paired {
            world,
            alice,
            bob,
            ..
        } = paired().await;
        world
            .pusher
            .unregister_client(&bob.user_id, bob.connection_id)
            .await;
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        let outcome = relay.send(&alice.user_id, content("hello?")).await;

        // then (期待する結果):
        assert_eq!(outcome, Ok(SendOutcome::PartnerOffline));
    }

    #[tokio::test]
    async fn test_typing_is_forwarded_and_ignored_outside_session() {
        // テスト項目: 入力中フラグは相手に届き、Session 外では何も起きない
        // given (前提条件):
        let Paired {
            world,
            alice,
            mut bob,
            ..
        } = paired().await;
        bob.drain();
        let loner = world.connect("carol").await;
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        relay.set_typing(&alice.user_id, true).await;
        relay.set_typing(&loner.user_id, true).await;

        // then (期待する結果):
        assert_eq!(bob.drain(), vec![ServerEvent::PartnerTyping { is_typing: true }]);
    }

    #[tokio::test]
    async fn test_typing_to_vanished_partner_is_dropped() {
        // テスト項目: 相手の送信チャンネルが消えていても入力中フラグは捨てられるだけで Session は残る
        // given (前提条件):
        let Paired {
            world,
            mut alice,
            bob,
            ..
        } = paired().await;
        alice.drain();
        world
            .pusher
            .unregister_client(&bob.user_id, bob.connection_id)
            .await;
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        relay.set_typing(&alice.user_id, true).await;

        // then (期待する結果):
        assert!(alice.drain().is_empty());
        assert_eq!(world.lobby.stats().await.sessions, 1);
    }

    #[tokio::test]
    async fn test_signals_are_tagged_with_sender() {
        // テスト項目: offer / answer が送信者 ID つきでそのまま相手に届く
        // given (前提条件):
        let Paired {
            world,
            mut alice,
            mut bob,
            ..
        } = paired().await;
        alice.drain();
        bob.drain();
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));
        let offer = json!({"type": "offer", "sdp": "v=0..."});
        let answer = json!({"type": "answer", "sdp": "v=0..."});

        // when (操作):
        relay
            .relay_signal(&alice.user_id, SignalKind::Offer, offer.clone(), Some(&bob.user_id))
            .await
            .unwrap();
        relay
            .relay_signal(&bob.user_id, SignalKind::Answer, answer.clone(), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::VideoOffer {
                from: "alice".to_string(),
                payload: offer,
            }]
        );
        assert_eq!(
            alice.drain(),
            vec![ServerEvent::VideoAnswer {
                from: "bob".to_string(),
                payload: answer,
            }]
        );
    }

    #[tokio::test]
    async fn test_signal_to_someone_else_is_dropped() {
        // テスト項目: 現在の相手以外を宛先にしたシグナリングは転送されない
        // given (前提条件):
        let Paired {
            world,
            alice,
            mut bob,
            ..
        } = paired().await;
        bob.drain();
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));
        let mallory = UserId::new("mallory".to_string()).unwrap();

        // when (操作):
        let result = relay
            .relay_signal(
                &alice.user_id,
                SignalKind::IceCandidate,
                json!({"candidate": "a=1"}),
                Some(&mallory),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_end_call_notifies_partner_exactly_once() {
        // テスト項目: end_video_call を両側から送っても video_call_ended は 1 回だけ
        // given (前提条件):
        let Paired {
            world,
            mut alice,
            mut bob,
            session_id,
        } = paired().await;
        alice.drain();
        bob.drain();
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        let first = relay.end_call(&alice.user_id, &bob.user_id).await;
        let second = relay.end_call(&bob.user_id, &alice.user_id).await;

        // then (期待する結果):
        assert_eq!(first, Ok(Some(session_id.clone())));
        assert_eq!(second, Err(EndCallError::Relay(RelayError::NotInSession)));
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::VideoCallEnded {
                from: "alice".to_string(),
                session_id: session_id.as_str().to_string(),
            }]
        );
        assert!(alice.drain().is_empty());
        assert_eq!(world.lobby.stats().await.sessions, 0);
    }

    #[tokio::test]
    async fn test_end_call_with_wrong_partner_is_rejected() {
        // テスト項目: 相手 ID が食い違う end_video_call は Session を壊さない
        // given (前提条件):
        let Paired { world, alice, .. } = paired().await;
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));
        let mallory = UserId::new("mallory".to_string()).unwrap();

        // when (操作):
        let result = relay.end_call(&alice.user_id, &mallory).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(EndCallError::PartnerMismatch("mallory".to_string()))
        );
        assert_eq!(world.lobby.stats().await.sessions, 1);
    }

    #[tokio::test]
    async fn test_concurrent_teardown_notifies_once() {
        // テスト項目: 同じ Session への teardown を並行に呼んでも通知は 1 回
        // given (前提条件):
        let Paired {
            world,
            alice,
            mut bob,
            session_id,
        } = paired().await;
        bob.drain();
        let relay = Arc::new(relay_with(&world, Arc::new(InMemoryMessageRepository::new())));

        // when (操作):
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let relay = relay.clone();
                let session_id = session_id.clone();
                let initiator = alice.user_id.clone();
                tokio::spawn(async move {
                    relay
                        .teardown(&session_id, &initiator, TeardownReason::PartnerLeft)
                        .await
                })
            })
            .collect();
        let mut torn_down = 0;
        for handle in handles {
            if handle.await.unwrap() {
                torn_down += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(torn_down, 1);
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::PartnerLeft {
                session_id: session_id.as_str().to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_friend_request_reaches_partner() {
        // テスト項目: フレンド申請が送信者の ID と名前つきで相手に届く
        // given (前提条件):
        let Paired {
            world,
            alice,
            mut bob,
            ..
        } = paired().await;
        bob.drain();
        let relay = relay_with(&world, Arc::new(InMemoryMessageRepository::new()));

        // when (操作):
        relay.send_friend_request(&alice.user_id).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::FriendRequestReceived {
                from: "alice".to_string(),
                username: "ALICE".to_string(),
            }]
        );
    }
}
