//! Domain errors

use thiserror::Error;

/// Value Object の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long ({actual} > {max} chars)")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// マッチング要求の失敗
///
/// どちらもクライアント側の状態ずれを意味するため、コアは再試行しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("user '{0}' is not registered")]
    NotRegistered(String),

    #[error("already in a chat session; leave it before searching again")]
    AlreadyInSession,
}

/// Session を介した中継の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("user '{0}' is not registered")]
    NotRegistered(String),

    #[error("not in a chat session")]
    NotInSession,
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 外部ストア（メッセージ履歴）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// 外部トークン検証サービスのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token rejected")]
    InvalidToken,

    #[error("token verifier unavailable: {0}")]
    Unavailable(String),

    #[error("malformed verifier response: {0}")]
    MalformedResponse(String),
}
