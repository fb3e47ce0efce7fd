//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ConnectUserUseCase, DisconnectUserUseCase, GetLobbyStateUseCase, LeaveChatUseCase,
    PresenceNotifierUseCase, RequestMatchUseCase, SessionRelayUseCase,
};

use super::{
    handler::{debug_lobby_state, get_lobby_summary, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket matchmaking server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_user_usecase,
///     disconnect_user_usecase,
///     request_match_usecase,
///     leave_chat_usecase,
///     relay_usecase,
///     presence_usecase,
///     get_lobby_state_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        connect_user_usecase: Arc<ConnectUserUseCase>,
        disconnect_user_usecase: Arc<DisconnectUserUseCase>,
        request_match_usecase: Arc<RequestMatchUseCase>,
        leave_chat_usecase: Arc<LeaveChatUseCase>,
        relay_usecase: Arc<SessionRelayUseCase>,
        presence_usecase: Arc<PresenceNotifierUseCase>,
        get_lobby_state_usecase: Arc<GetLobbyStateUseCase>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                connect_user_usecase,
                disconnect_user_usecase,
                request_match_usecase,
                leave_chat_usecase,
                relay_usecase,
                presence_usecase,
                get_lobby_state_usecase,
            }),
        }
    }

    /// Build the router with every endpoint mounted
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/lobby", get(get_lobby_summary))
            .route("/debug/lobby", get(debug_lobby_state))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Matchmaking server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
