//! Anonymous one-to-one chat matchmaking server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-server
//! cargo run --bin tandem-server -- --host 0.0.0.0 --port 3000
//! TANDEM_VERIFIER_URL=http://localhost:4000/verify cargo run --bin tandem-server
//! ```

use std::{collections::HashMap, sync::Arc};

use clap::Parser;
use tokio::sync::Mutex;

use tandem_server::{
    config::ServerConfig,
    domain::TokenVerifier,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryLobbyRepository, InMemoryMessageRepository},
        verifier::HttpTokenVerifier,
    },
    ui::Server,
    usecase::{
        ConnectUserUseCase, DisconnectUserUseCase, GetLobbyStateUseCase, LeaveChatUseCase,
        EventSequencer, PresenceNotifierUseCase, RequestMatchUseCase, SessionRelayUseCase,
    },
};
use tandem_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_BIN_NAME"),
        &config.log_level,
    );

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. TokenVerifier
    // 4. UseCases
    // 5. Server

    // 1. Create Repositories (in-memory)
    let lobby = Arc::new(InMemoryLobbyRepository::default());
    let message_repository = Arc::new(InMemoryMessageRepository::with_capacity(
        config.message_capacity,
    ));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_clients = Arc::new(Mutex::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

    // 3. Create TokenVerifier (optional)
    let token_verifier: Option<Arc<dyn TokenVerifier>> = match &config.verifier_url {
        Some(url) => match HttpTokenVerifier::new(url.clone(), config.verifier_timeout()) {
            Ok(verifier) => {
                tracing::info!("Verifying tokens against {}", url);
                Some(Arc::new(verifier))
            }
            Err(e) => {
                tracing::error!("Failed to create token verifier: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("No verifier configured, every connection is a guest");
            None
        }
    };

    // 4. Create UseCases
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sequencer = Arc::new(EventSequencer::new());
    let connect_user_usecase = Arc::new(ConnectUserUseCase::new(
        lobby.clone(),
        message_pusher.clone(),
        token_verifier,
        clock.clone(),
        sequencer.clone(),
    ));
    let disconnect_user_usecase = Arc::new(DisconnectUserUseCase::new(
        lobby.clone(),
        message_pusher.clone(),
        sequencer.clone(),
    ));
    let request_match_usecase = Arc::new(RequestMatchUseCase::new(
        lobby.clone(),
        message_pusher.clone(),
        clock.clone(),
        sequencer.clone(),
    ));
    let leave_chat_usecase = Arc::new(LeaveChatUseCase::new(
        lobby.clone(),
        message_pusher.clone(),
        sequencer.clone(),
    ));
    let relay_usecase = Arc::new(SessionRelayUseCase::new(
        lobby.clone(),
        message_pusher.clone(),
        message_repository,
        clock,
        sequencer,
    ));
    let presence_usecase = Arc::new(PresenceNotifierUseCase::new(
        lobby.clone(),
        message_pusher.clone(),
    ));
    let get_lobby_state_usecase = Arc::new(GetLobbyStateUseCase::new(lobby));

    // 5. Create and run the server
    let server = Server::new(
        connect_user_usecase,
        disconnect_user_usecase,
        request_match_usecase,
        leave_chat_usecase,
        relay_usecase,
        presence_usecase,
        get_lobby_state_usecase,
    );
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
