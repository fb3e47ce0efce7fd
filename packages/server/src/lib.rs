//! Anonymous one-to-one chat matchmaking and WebRTC signaling relay.
//!
//! Users connect over WebSocket, wait in a FIFO pool, get paired into a
//! two-party session and exchange chat messages and signaling payloads
//! through the server until one side leaves or disconnects.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
