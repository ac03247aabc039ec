use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{CredentialRecord, StoreError, TokenStore};

/// Owner-only permissions for the persisted record.
const RECORD_MODE: u32 = 0o600;

/// On-disk credential store using the canonical `FIELD=value` encoding.
///
/// Rewrites go through a temp file in the same directory followed by a
/// rename, so a concurrent `load` sees either the old record or the new one,
/// never a partial write.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<CredentialRecord, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(err) => return Err(StoreError::Io(err)),
        };
        debug!(path = %self.path.display(), "loaded credential record");
        Ok(CredentialRecord::parse(&text))
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Merge over whatever is already persisted so unrelated fields survive.
        let mut on_disk = match self.load() {
            Ok(existing) => existing,
            Err(StoreError::NotFound) => CredentialRecord::new(),
            Err(err) => return Err(err),
        };
        on_disk.merge(record);

        let tmp = self.tmp_path();
        fs::write(&tmp, on_disk.to_string())?;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(RECORD_MODE))?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "credential record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ACCESS_ID, UID_TOKEN};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("tokens/application-service-token"))
    }

    #[test]
    fn test_load_missing_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.load(), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut record = CredentialRecord::new();
        record.set(UID_TOKEN, "u-abc123");
        store.save(&record).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get(UID_TOKEN), Some("u-abc123"));
    }

    #[test]
    fn test_save_sets_owner_only_permissions() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut record = CredentialRecord::new();
        record.set(UID_TOKEN, "u-abc123");
        store.save(&record).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // Permissions hold on rewrite too.
        record.set(UID_TOKEN, "u-def456");
        store.save(&record).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_save_preserves_unrelated_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut initial = CredentialRecord::new();
        initial.set(UID_TOKEN, "u-abc123");
        initial.set(ACCESS_ID, "/demo/uid-non-human-auth");
        initial.set("CUSTOM_FIELD", "opaque=value");
        store.save(&initial).unwrap();

        let mut update = CredentialRecord::new();
        update.set(UID_TOKEN, "u-def456");
        store.save(&update).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get(UID_TOKEN), Some("u-def456"));
        assert_eq!(loaded.get(ACCESS_ID), Some("/demo/uid-non-human-auth"));
        assert_eq!(loaded.get("CUSTOM_FIELD"), Some("opaque=value"));
    }

    #[test]
    fn test_save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut record = CredentialRecord::new();
        record.set(UID_TOKEN, "u-abc123");
        store.save(&record).unwrap();

        assert!(!store.tmp_path().exists());
    }
}
