//! TokenVerifier trait 定義
//!
//! 認証トークンの発行・検証は外部サービスの責務。コアは `verify` を呼ぶだけ。

use async_trait::async_trait;

use super::{
    error::VerifyError,
    value_object::{DisplayName, UserId},
};

/// 検証済みの身元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: UserId,
    pub username: DisplayName,
}

impl VerifiedIdentity {
    /// 検証に失敗したときのローカル生成の身元
    pub fn guest() -> Self {
        let user_id = UserId::generate_guest();
        let username = DisplayName::for_guest(&user_id);
        Self { user_id, username }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}
