//! HTTP and WebSocket handlers.

mod events;
mod http;
mod websocket;

pub use http::{debug_lobby_state, get_lobby_summary, health_check};
pub use websocket::websocket_handler;
