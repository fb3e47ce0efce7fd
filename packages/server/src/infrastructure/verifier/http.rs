//! HTTP token verifier.
//!
//! POSTs `{"token": "..."}` to an external verification endpoint and expects
//! `{"userId": "...", "username": "..."}` back. Any non-success status is a
//! rejected token; transport failures and timeouts are reported as
//! `Unavailable` so the caller can fall back to a guest identity.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::{DisplayName, TokenVerifier, UserId, VerifiedIdentity, VerifyError};

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    user_id: String,
    username: String,
}

impl TryFrom<VerifyResponse> for VerifiedIdentity {
    type Error = VerifyError;

    fn try_from(response: VerifyResponse) -> Result<Self, Self::Error> {
        let user_id = UserId::new(response.user_id)
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;
        let username = DisplayName::new(response.username)
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;
        Ok(Self { user_id, username })
    }
}

pub struct HttpTokenVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenVerifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body: VerifyResponse = response
                    .json()
                    .await
                    .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;
                body.try_into()
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
                Err(VerifyError::InvalidToken)
            }
            status => Err(VerifyError::Unavailable(format!(
                "verifier answered {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
    use serde_json::{Value, json};

    async fn fake_verifier(Json(body): Json<Value>) -> Result<Json<Value>, AxumStatus> {
        match body["token"].as_str() {
            Some("good") => Ok(Json(json!({"userId": "u-42", "username": "Alice"}))),
            Some("broken") => Ok(Json(json!({"userId": "", "username": "Alice"}))),
            _ => Err(AxumStatus::UNAUTHORIZED),
        }
    }

    async fn spawn_fake_verifier() -> String {
        let app = Router::new().route("/verify", post(fake_verifier));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/verify")
    }

    #[tokio::test]
    async fn test_verify_accepts_valid_token() {
        // テスト項目: 検証サービスが受理したトークンから身元が得られる
        // given (前提条件):
        let endpoint = spawn_fake_verifier().await;
        let verifier = HttpTokenVerifier::new(endpoint, Duration::from_secs(2)).unwrap();

        // when (操作):
        let identity = verifier.verify("good").await.unwrap();

        // then (期待する結果):
        assert_eq!(identity.user_id.as_str(), "u-42");
        assert_eq!(identity.username.as_str(), "Alice");
    }

    #[tokio::test]
    async fn test_verify_rejects_invalid_token() {
        // テスト項目: 401 は InvalidToken になる
        // given (前提条件):
        let endpoint = spawn_fake_verifier().await;
        let verifier = HttpTokenVerifier::new(endpoint, Duration::from_secs(2)).unwrap();

        // when (操作):
        let result = verifier.verify("bad").await;

        // then (期待する結果):
        assert_eq!(result, Err(VerifyError::InvalidToken));
    }

    #[tokio::test]
    async fn test_verify_reports_malformed_identity() {
        // テスト項目: 空の userId を返されたら MalformedResponse
        // given (前提条件):
        let endpoint = spawn_fake_verifier().await;
        let verifier = HttpTokenVerifier::new(endpoint, Duration::from_secs(2)).unwrap();

        // when (操作):
        let result = verifier.verify("broken").await;

        // then (期待する結果):
        assert!(matches!(result, Err(VerifyError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_verify_unreachable_service() {
        // テスト項目: 接続できない場合は Unavailable
        // given (前提条件):
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let verifier =
            HttpTokenVerifier::new(format!("http://{addr}/verify"), Duration::from_secs(2))
                .unwrap();

        // when (操作):
        let result = verifier.verify("good").await;

        // then (期待する結果):
        assert!(matches!(result, Err(VerifyError::Unavailable(_))));
    }
}
