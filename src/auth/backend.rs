use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Session credentials returned by a token exchange.
///
/// `expires_at` is what the service reported; `None` means the service did
/// not say, and the client falls back to its configured default window.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Derived credential with a caller-chosen lifetime. The client hands it
/// back once and keeps nothing; the caller owns its lifecycle.
#[derive(Debug, Clone)]
pub struct ChildToken {
    pub token: String,
    pub ttl: Duration,
}

/// Failures reported by the remote service.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("service unreachable: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// The remote authentication/secret service, as the lifecycle core sees it.
///
/// Every operation returns structured data; the transport behind it (HTTP,
/// RPC, anything) is an implementation detail. Timeouts and cancellation
/// surface as ordinary errors.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a long-lived identity token for short-lived session
    /// credentials under the given auth method.
    async fn exchange(&self, uid_token: &str, access_id: &str)
        -> Result<SessionGrant, BackendError>;

    /// Rotate the identity token, returning its replacement. The old token
    /// stays valid until the service confirms the new one.
    async fn rotate(&self, uid_token: &str) -> Result<String, BackendError>;

    /// Derive a scoped child token with the given time-to-live.
    async fn derive_child(&self, uid_token: &str, ttl: Duration)
        -> Result<ChildToken, BackendError>;

    /// Fetch a secret value using session credentials. `Ok(None)` means the
    /// service has no value under that name.
    async fn fetch_secret(&self, session_token: &str, name: &str)
        -> Result<Option<String>, BackendError>;
}
