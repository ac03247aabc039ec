use std::fmt;

use super::StoreError;

/// Ordered set of `FIELD=value` assignments persisted as one unit.
///
/// Field order is preserved so a read-modify-write leaves untouched lines
/// where they were. Values may contain `=`; only the first one separates
/// the field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRecord {
    fields: Vec<(String, String)>,
}

impl CredentialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the canonical one-assignment-per-line encoding. Lines without
    /// an `=` carry no field and are skipped.
    pub fn parse(text: &str) -> Self {
        let mut record = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((name, value)) = line.split_once('=') {
                record.set(name, value);
            }
        }
        record
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like `get`, but a recognized field that is absent is an error.
    pub fn require(&self, name: &'static str) -> Result<&str, StoreError> {
        self.get(name).ok_or(StoreError::MissingField(name))
    }

    /// Set a field, replacing in place if it already exists.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    /// Overlay `other`'s fields onto this record. Fields only present here
    /// are left alone.
    pub fn merge(&mut self, other: &CredentialRecord) {
        for (name, value) in &other.fields {
            self.set(name, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            writeln!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ACCESS_ID, UID_TOKEN};

    #[test]
    fn test_parse_key_value_lines() {
        let record = CredentialRecord::parse("UID_TOKEN=u-abc123\nACCESS_ID=/demo/uid-non-human-auth\n");
        assert_eq!(record.get(UID_TOKEN), Some("u-abc123"));
        assert_eq!(record.get(ACCESS_ID), Some("/demo/uid-non-human-auth"));
    }

    #[test]
    fn test_parse_splits_on_first_equals_only() {
        let record = CredentialRecord::parse("NOTE=a=b=c\n");
        assert_eq!(record.get("NOTE"), Some("a=b=c"));
    }

    #[test]
    fn test_parse_skips_blank_and_bare_lines() {
        let record = CredentialRecord::parse("\nu-raw-token-without-assignment\n\nUID_TOKEN=u-1\n");
        assert_eq!(record.get(UID_TOKEN), Some("u-1"));
        assert!(record.get("u-raw-token-without-assignment").is_none());
    }

    #[test]
    fn test_require_missing_field() {
        let record = CredentialRecord::parse("ACCESS_ID=/demo/x\n");
        let err = record.require(UID_TOKEN).unwrap_err();
        assert!(matches!(err, StoreError::MissingField(UID_TOKEN)));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = CredentialRecord::parse("UID_TOKEN=u-old\nEXTRA=keep\n");
        record.set(UID_TOKEN, "u-new");
        assert_eq!(record.to_string(), "UID_TOKEN=u-new\nEXTRA=keep\n");
    }

    #[test]
    fn test_merge_preserves_unknown_fields() {
        let mut on_disk = CredentialRecord::parse("UID_TOKEN=u-old\nCUSTOM=opaque-value\n");
        let mut update = CredentialRecord::new();
        update.set(UID_TOKEN, "u-new");
        on_disk.merge(&update);

        assert_eq!(on_disk.get(UID_TOKEN), Some("u-new"));
        assert_eq!(on_disk.get("CUSTOM"), Some("opaque-value"));
    }

    #[test]
    fn test_display_round_trip() {
        let text = "UID_TOKEN=u-abc\nACCESS_ID=/demo/m\nCUSTOM=x=y\n";
        let record = CredentialRecord::parse(text);
        assert_eq!(record.to_string(), text);
    }
}
