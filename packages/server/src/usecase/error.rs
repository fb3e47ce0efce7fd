//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::RelayError;

/// end_video_call の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndCallError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("'{0}' is not your current partner")]
    PartnerMismatch(String),
}
