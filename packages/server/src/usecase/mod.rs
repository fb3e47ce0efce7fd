//! UseCase layer: one struct per client-facing operation, wired to the
//! repository and pusher traits from the domain layer.

pub mod connect_user;
pub mod disconnect_user;
pub mod error;
pub mod get_lobby_state;
pub mod leave_chat;
mod notify;
pub mod presence;
pub mod relay;
pub mod request_match;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_user::{ConnectUserUseCase, ConnectedUser};
pub use disconnect_user::DisconnectUserUseCase;
pub use error::EndCallError;
pub use get_lobby_state::GetLobbyStateUseCase;
pub use leave_chat::LeaveChatUseCase;
pub use presence::PresenceNotifierUseCase;
pub use relay::{SendOutcome, SessionRelayUseCase};
pub use request_match::RequestMatchUseCase;
pub use sequencer::EventSequencer;
