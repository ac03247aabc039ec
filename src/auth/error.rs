use thiserror::Error;

use crate::store::StoreError;

use super::backend::BackendError;

/// Failures from `IdentityClient::authenticate`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no identity token available")]
    NoIdentityToken,

    #[error("token store: {0}")]
    Store(#[source] StoreError),

    #[error("identity token exchange failed: {0}")]
    ExchangeFailed(#[source] BackendError),
}

/// Failures from `IdentityClient::rotate_identity_token`.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("no identity token available")]
    NoIdentityToken,

    #[error("token store: {0}")]
    Store(#[source] StoreError),

    #[error("identity token rotation failed: {0}")]
    RotateFailed(#[source] BackendError),
}

/// Failures from `IdentityClient::create_child_token`.
#[derive(Debug, Error)]
pub enum ChildTokenError {
    #[error("no identity token available")]
    NoIdentityToken,

    #[error("token store: {0}")]
    Store(#[source] StoreError),

    #[error("child token derivation failed: {0}")]
    DeriveFailed(#[source] BackendError),
}

/// Failures from `IdentityClient::get_secret`.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret fetch failed: {0}")]
    FetchFailed(#[source] BackendError),
}

// An absent record and a record missing the token field mean the same thing
// to callers: bootstrap has not provisioned an identity token yet. Anything
// else is a persistence failure and stays distinguishable.

impl AuthError {
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound | StoreError::MissingField(_) => Self::NoIdentityToken,
            other => Self::Store(other),
        }
    }
}

impl RotationError {
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound | StoreError::MissingField(_) => Self::NoIdentityToken,
            other => Self::Store(other),
        }
    }
}

impl ChildTokenError {
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound | StoreError::MissingField(_) => Self::NoIdentityToken,
            other => Self::Store(other),
        }
    }
}
