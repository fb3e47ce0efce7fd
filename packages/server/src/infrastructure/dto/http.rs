//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/lobby`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySummaryDto {
    pub online_users: usize,
    pub waiting_users: usize,
    pub active_sessions: usize,
    pub generated_at: String,
}
