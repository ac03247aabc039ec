pub mod backend;
pub mod client;
pub mod error;
pub mod gateway;
pub mod rotation;

pub use backend::{AuthBackend, BackendError, ChildToken, SessionGrant};
pub use client::{ClientConfig, IdentityClient};
pub use error::{AuthError, ChildTokenError, RotationError, SecretError};
pub use gateway::GatewayClient;
