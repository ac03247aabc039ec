use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::store::{CredentialRecord, StoreError, TokenStore, UID_TOKEN};

use super::backend::{AuthBackend, ChildToken};
use super::error::{AuthError, ChildTokenError, RotationError, SecretError};

/// Explicit configuration for an identity client. No process-global paths:
/// the store location travels with the `TokenStore` the client is built on.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Authentication method identifier sent with every exchange.
    pub access_id: String,
    /// Session window assumed when the service reports no expiry. An
    /// approximation, not a guarantee; a reported expiry always wins.
    pub fallback_session_ttl: Duration,
    /// Safety margin subtracted from the expiry before a cached session
    /// token is considered stale.
    pub expiry_skew: Duration,
}

impl ClientConfig {
    pub fn new(access_id: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            fallback_session_ttl: Duration::from_secs(60 * 60),
            expiry_skew: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSession {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Lifecycle state machine for one non-human identity.
///
/// Holds the cached session token and its expiry, exchanges the persisted
/// identity token for fresh sessions on demand, rotates the identity token
/// with all-or-nothing persistence, and derives child tokens.
pub struct IdentityClient {
    store: Arc<dyn TokenStore>,
    backend: Arc<dyn AuthBackend>,
    config: ClientConfig,
    session: RwLock<Option<CachedSession>>,
    // Serializes the load-rotate-persist sequence so two rotations cannot
    // interleave.
    rotation: Mutex<()>,
}

impl IdentityClient {
    pub fn new(
        store: Arc<dyn TokenStore>,
        backend: Arc<dyn AuthBackend>,
        config: ClientConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            session: RwLock::new(None),
            rotation: Mutex::new(()),
        }
    }

    pub fn access_id(&self) -> &str {
        &self.config.access_id
    }

    fn identity_token(&self) -> Result<String, StoreError> {
        let record = self.store.load()?;
        Ok(record.require(UID_TOKEN)?.to_string())
    }

    fn skew(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.expiry_skew)
            .unwrap_or_else(|_| chrono::Duration::minutes(5))
    }

    /// Obtain session credentials, reusing the cached token while it is
    /// still comfortably inside its validity window.
    ///
    /// Repeated calls inside the window never touch the service. On exchange
    /// failure any previously cached session is left in place; it stays
    /// authoritative until its own expiry.
    pub async fn authenticate(&self, force_refresh: bool) -> Result<String, AuthError> {
        if !force_refresh {
            let session = self.session.read().await;
            if let Some(cached) = session.as_ref() {
                if Utc::now() < cached.expires_at - self.skew() {
                    debug!("using cached session token");
                    return Ok(cached.token.clone());
                }
            }
        }

        let uid_token = self.identity_token().map_err(AuthError::from_store)?;

        debug!(access_id = %self.config.access_id, "exchanging identity token for session credentials");
        let grant = self
            .backend
            .exchange(&uid_token, &self.config.access_id)
            .await
            .map_err(AuthError::ExchangeFailed)?;

        let expires_at = match grant.expires_at {
            Some(reported) => reported,
            None => {
                let fallback = chrono::Duration::from_std(self.config.fallback_session_ttl)
                    .unwrap_or_else(|_| chrono::Duration::hours(1));
                warn!("service reported no session expiry, assuming fallback window");
                Utc::now() + fallback
            }
        };

        let mut session = self.session.write().await;
        *session = Some(CachedSession {
            token: grant.token.clone(),
            expires_at,
        });
        info!(expires_at = %expires_at, "session credentials refreshed");

        Ok(grant.token)
    }

    /// Replace the identity token with a freshly rotated one.
    ///
    /// The persisted record changes only after the service confirms the new
    /// token, and the cached session is invalidated only after the record is
    /// safely persisted. A failure at any step leaves both untouched.
    pub async fn rotate_identity_token(&self) -> Result<(), RotationError> {
        let _guard = self.rotation.lock().await;

        let uid_token = self.identity_token().map_err(RotationError::from_store)?;

        let new_token = self
            .backend
            .rotate(&uid_token)
            .await
            .map_err(RotationError::RotateFailed)?;

        let mut update = CredentialRecord::new();
        update.set(UID_TOKEN, &new_token);
        self.store.save(&update).map_err(RotationError::Store)?;

        // The cached session was derived from the superseded token; drop it.
        let mut session = self.session.write().await;
        *session = None;
        info!("identity token rotated, session cache invalidated");

        Ok(())
    }

    /// Derive a scoped child token. Does not read or write the session
    /// cache; the caller owns the returned credential.
    pub async fn create_child_token(&self, ttl: Duration) -> Result<ChildToken, ChildTokenError> {
        let uid_token = self.identity_token().map_err(ChildTokenError::from_store)?;

        let child = self
            .backend
            .derive_child(&uid_token, ttl)
            .await
            .map_err(ChildTokenError::DeriveFailed)?;

        info!(ttl_secs = ttl.as_secs(), "child token derived");
        Ok(child)
    }

    /// Fetch a secret value, authenticating first if the cached session has
    /// gone stale.
    pub async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let session_token = self.authenticate(false).await?;

        debug!(secret = %name, "retrieving secret");
        let value = self
            .backend
            .fetch_secret(&session_token, name)
            .await
            .map_err(SecretError::FetchFailed)?;

        value.ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}
