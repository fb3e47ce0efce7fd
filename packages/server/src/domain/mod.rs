//! Domain layer: value objects, entities, the in-memory matchmaking aggregate
//! and the traits the outer layers implement.

pub mod entity;
pub mod error;
pub mod lobby;
pub mod message_pusher;
pub mod notification;
pub mod registry;
pub mod repository;
pub mod token_verifier;
pub mod value_object;
pub mod waiting_pool;

pub use entity::{ChatMessage, Connection, Session, SessionState, WaitingEntry};
pub use error::{
    MatchError, MessagePushError, RelayError, RepositoryError, ValueObjectError, VerifyError,
};
pub use lobby::{
    LeaveOutcome, Lobby, LobbyRegistration, LobbySnapshot, LobbyStats, MatchOutcome, PeerInfo,
    Route, TeardownNotice, Unregistration,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notification::Notification;
pub use registry::{ConnectionRegistry, Registration};
pub use repository::{LobbyRepository, MessageRepository};
pub use token_verifier::{TokenVerifier, VerifiedIdentity};
pub use value_object::{
    ConnectionId, DisplayName, MessageContent, MessageId, SessionId, SignalKind, TeardownReason,
    Timestamp, UserId,
};
pub use waiting_pool::WaitingPool;
