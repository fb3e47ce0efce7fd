//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    domain::LobbySnapshot, infrastructure::dto::http::LobbySummaryDto, ui::state::AppState,
};
use tandem_shared::time::{get_timestamp, timestamp_to_rfc3339};

/// Debug endpoint exposing every connection, waiting entry and session
pub async fn debug_lobby_state(State(state): State<Arc<AppState>>) -> Json<LobbySnapshot> {
    let snapshot = state.get_lobby_state_usecase.snapshot().await;
    if !snapshot.invariant_violations.is_empty() {
        tracing::error!(
            "Lobby invariants violated: {:?}",
            snapshot.invariant_violations
        );
    }
    Json(snapshot)
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Counts of online users, waiting users and active sessions
pub async fn get_lobby_summary(State(state): State<Arc<AppState>>) -> Json<LobbySummaryDto> {
    let stats = state.get_lobby_state_usecase.stats().await;

    // Domain Model から DTO への変換
    Json(LobbySummaryDto {
        online_users: stats.online,
        waiting_users: stats.waiting,
        active_sessions: stats.sessions,
        generated_at: timestamp_to_rfc3339(get_timestamp()),
    })
}
