//! Server state shared by every connection handler.

use std::sync::Arc;

use crate::usecase::{
    ConnectUserUseCase, DisconnectUserUseCase, GetLobbyStateUseCase, LeaveChatUseCase,
    PresenceNotifierUseCase, RequestMatchUseCase, SessionRelayUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectUserUseCase（authenticate）
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    /// DisconnectUserUseCase（トランスポート切断）
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
    /// RequestMatchUseCase（search_chat）
    pub request_match_usecase: Arc<RequestMatchUseCase>,
    /// LeaveChatUseCase（leave_chat）
    pub leave_chat_usecase: Arc<LeaveChatUseCase>,
    /// SessionRelayUseCase（メッセージ・シグナリングの中継）
    pub relay_usecase: Arc<SessionRelayUseCase>,
    /// PresenceNotifierUseCase（オンライン状態）
    pub presence_usecase: Arc<PresenceNotifierUseCase>,
    /// GetLobbyStateUseCase（HTTP / デバッグ）
    pub get_lobby_state_usecase: Arc<GetLobbyStateUseCase>,
}
