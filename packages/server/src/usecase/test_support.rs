//! UseCase テスト用の組み立てヘルパー

use std::sync::Arc;

use tokio::sync::mpsc;

use tandem_shared::time::{Clock, FixedClock};

use crate::{
    domain::{ConnectionId, DisplayName, LobbyRepository, MessagePusher, UserId},
    infrastructure::{
        dto::websocket::ServerEvent, message_pusher::WebSocketMessagePusher,
        repository::InMemoryLobbyRepository,
    },
    usecase::EventSequencer,
};

pub struct TestClient {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub rx: mpsc::UnboundedReceiver<String>,
}

impl TestClient {
    /// 受信済みのイベントをすべて取り出す
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(text) = self.rx.try_recv() {
            events.push(serde_json::from_str(&text).unwrap());
        }
        events
    }
}

pub struct TestWorld {
    pub lobby: Arc<InMemoryLobbyRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub clock: Arc<dyn Clock>,
    pub sequencer: Arc<EventSequencer>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            lobby: Arc::new(InMemoryLobbyRepository::default()),
            pusher: Arc::new(WebSocketMessagePusher::default()),
            clock: Arc::new(FixedClock::new(1_700_000_000_000)),
            sequencer: Arc::new(EventSequencer::new()),
        }
    }

    /// Lobby と MessagePusher の両方に登録する
    pub async fn connect(&self, id: &str) -> TestClient {
        let user_id = UserId::new(id.to_string()).unwrap();
        let registration = self
            .lobby
            .register(
                user_id.clone(),
                DisplayName::new(id.to_uppercase()).unwrap(),
                self.clock_now(),
            )
            .await;
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher
            .register_client(user_id.clone(), registration.connection_id, tx)
            .await;
        TestClient {
            user_id,
            connection_id: registration.connection_id,
            rx,
        }
    }

    pub fn clock_now(&self) -> crate::domain::Timestamp {
        crate::domain::Timestamp::new(self.clock.now_millis())
    }
}
