pub mod file;
pub mod record;

use thiserror::Error;

pub use file::FileTokenStore;
pub use record::CredentialRecord;

/// Field holding the long-lived identity token.
pub const UID_TOKEN: &str = "UID_TOKEN";
/// Field holding the authentication method identifier.
pub const ACCESS_ID: &str = "ACCESS_ID";

/// Errors from the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no credential record found")]
    NotFound,

    #[error("field {0} missing from credential record")]
    MissingField(&'static str),

    #[error("credential store I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence seam for the identity token and its companion fields.
///
/// `save` merges into the existing record: fields already persisted but not
/// present in the given record survive a rewrite unchanged.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<CredentialRecord, StoreError>;
    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError>;
}
