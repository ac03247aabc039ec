use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::backend::{AuthBackend, BackendError, ChildToken, SessionGrant};

/// Exchange response envelope.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Rotation and child-token responses carry only the new token.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    value: String,
}

/// HTTP gateway implementing the remote authentication service.
///
/// Paths:
/// - POST {base_url}/v1/auth                 — identity token -> session grant
/// - POST {base_url}/v1/uid/rotate           — rotate the identity token
/// - POST {base_url}/v1/uid/child            — derive a child token
/// - GET  {base_url}/v1/secret?name={name}   — fetch a secret (404 = no value)
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    http_client: Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("creating HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    /// Create a gateway client from environment variables.
    ///
    /// Environment variables:
    /// - `UID_GATEWAY_URL`: Base URL (e.g., https://api.gateway.example)
    ///
    /// Returns `Ok(None)` when the gateway is not configured.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var("UID_GATEWAY_URL").ok() {
            Some(base_url) => {
                debug!("gateway client initialized with base_url={}", base_url);
                Ok(Some(Self::new(base_url)?))
            }
            None => {
                debug!("gateway not configured (missing UID_GATEWAY_URL)");
                Ok(None)
            }
        }
    }

    async fn read_failure(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        BackendError::Rejected(format!("status {status}: {body}"))
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn decode_error(err: reqwest::Error) -> BackendError {
    BackendError::Malformed(err.to_string())
}

#[async_trait]
impl AuthBackend for GatewayClient {
    async fn exchange(
        &self,
        uid_token: &str,
        access_id: &str,
    ) -> Result<SessionGrant, BackendError> {
        let url = format!("{}/v1/auth", self.base_url);
        debug!(%url, "requesting session credentials");

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "access_id": access_id,
                "access_type": "universal_identity",
                "uid_token": uid_token,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let auth: AuthResponse = response.json().await.map_err(decode_error)?;
        Ok(SessionGrant {
            token: auth.token,
            expires_at: auth.expires_at,
        })
    }

    async fn rotate(&self, uid_token: &str) -> Result<String, BackendError> {
        let url = format!("{}/v1/uid/rotate", self.base_url);
        debug!(%url, "rotating identity token");

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({ "uid_token": uid_token }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let rotated: TokenResponse = response.json().await.map_err(decode_error)?;
        Ok(rotated.token)
    }

    async fn derive_child(
        &self,
        uid_token: &str,
        ttl: Duration,
    ) -> Result<ChildToken, BackendError> {
        let url = format!("{}/v1/uid/child", self.base_url);
        debug!(%url, ttl_secs = ttl.as_secs(), "deriving child token");

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "uid_token": uid_token,
                "child_ttl_minutes": ttl.as_secs() / 60,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let child: TokenResponse = response.json().await.map_err(decode_error)?;
        Ok(ChildToken {
            token: child.token,
            ttl,
        })
    }

    async fn fetch_secret(
        &self,
        session_token: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let url = format!("{}/v1/secret", self.base_url);
        debug!(%url, secret = %name, "fetching secret");

        let response = self
            .http_client
            .get(&url)
            .query(&[("name", name)])
            .header("X-Session-Token", session_token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let secret: SecretResponse = response.json().await.map_err(decode_error)?;
        Ok(Some(secret.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_from_env() {
        std::env::remove_var("UID_GATEWAY_URL");
        let result = GatewayClient::from_env();
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());

        std::env::set_var("UID_GATEWAY_URL", "http://127.0.0.1:8200");
        let result = GatewayClient::from_env().unwrap();
        assert!(result.is_some());

        std::env::remove_var("UID_GATEWAY_URL");
    }
}
