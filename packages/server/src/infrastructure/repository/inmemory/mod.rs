//! InMemory 実装

pub mod lobby;
pub mod message;

pub use lobby::InMemoryLobbyRepository;
pub use message::InMemoryMessageRepository;
