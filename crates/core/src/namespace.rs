//! Key-space naming.
//!
//! A [`Namespace`] is the string under which a model's keys live in the
//! backing store (§6 of the design: `<ns>:<id>`, `<ns>:<field>:idx`, …).
//! Validation rules mirror the constraints the backing store itself places
//! on key names: non-empty, no NUL bytes, no internal `:` (the separator
//! the engine uses to build composite keys, so a namespace containing one
//! would let a crafted model name alias another model's keys).

use thiserror::Error;

/// Reserved separator used to build every derived key
/// (`<ns>:<field>:idx`, `<ns>:<id>`, …). A namespace may not contain it.
pub const KEY_SEPARATOR: char = ':';

/// A validated namespace (model name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Validate and wrap a namespace string.
    pub fn new(name: impl Into<String>) -> Result<Self, NamespaceError> {
        let name = name.into();
        validate_namespace(&name)?;
        Ok(Namespace(name))
    }

    /// Borrow the namespace as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the key for the primary-key counter: `<ns>:<pkey>:`.
    pub fn pkey_counter_key(&self) -> String {
        format!("{}:pkey:", self.0)
    }

    /// Build the key for a record's hash: `<ns>:<id>`.
    pub fn record_key(&self, id: u64) -> String {
        format!("{}:{}", self.0, id)
    }

    /// Build the key for the legacy flat manifest hash: `<ns>::`.
    pub fn legacy_manifest_key(&self) -> String {
        format!("{}::", self.0)
    }

    /// Build the key for a field's unique-index hash: `<ns>:<field>:uidx`.
    pub fn unique_index_key(&self, field: &str) -> String {
        format!("{}:{}:uidx", self.0, field)
    }

    /// Build the key for a field's scored index: `<ns>:<field>:idx`.
    pub fn scored_index_key(&self, field: &str) -> String {
        format!("{}:{}:idx", self.0, field)
    }

    /// Build the key for an inverted (set) index on one term:
    /// `<ns>:<field>:<term>:idx`.
    pub fn set_index_key(&self, field: &str, term: &str) -> String {
        format!("{}:{}:{}:idx", self.0, field, term)
    }

    /// Build the key for a field's prefix ZSET: `<ns>:<field>:pre`.
    pub fn prefix_index_key(&self, field: &str) -> String {
        format!("{}:{}:pre", self.0, field)
    }

    /// Build the key for a field's suffix ZSET: `<ns>:<field>:suf`.
    pub fn suffix_index_key(&self, field: &str) -> String {
        format!("{}:{}:suf", self.0, field)
    }

    /// Build the key for a named geo index: `<ns>:<name>:geo`.
    pub fn geo_index_key(&self, name: &str) -> String {
        format!("{}:{}:geo", self.0, name)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while validating a [`Namespace`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    /// Namespace is empty.
    #[error("namespace cannot be empty")]
    Empty,
    /// Namespace contains a NUL byte.
    #[error("namespace cannot contain NUL bytes")]
    ContainsNul,
    /// Namespace contains the reserved `:` separator.
    #[error("namespace cannot contain the reserved separator '{KEY_SEPARATOR}'")]
    ContainsSeparator,
}

fn validate_namespace(name: &str) -> Result<(), NamespaceError> {
    if name.is_empty() {
        return Err(NamespaceError::Empty);
    }
    if name.contains('\0') {
        return Err(NamespaceError::ContainsNul);
    }
    if name.contains(KEY_SEPARATOR) {
        return Err(NamespaceError::ContainsSeparator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_namespace_round_trips() {
        let ns = Namespace::new("User").unwrap();
        assert_eq!(ns.as_str(), "User");
        assert_eq!(ns.record_key(7), "User:7");
        assert_eq!(ns.scored_index_key("created"), "User:created:idx");
        assert_eq!(ns.unique_index_key("email"), "User:email:uidx");
    }

    #[test]
    fn empty_namespace_rejected() {
        assert_eq!(Namespace::new(""), Err(NamespaceError::Empty));
    }

    #[test]
    fn namespace_with_separator_rejected() {
        assert_eq!(
            Namespace::new("User:1"),
            Err(NamespaceError::ContainsSeparator)
        );
    }

    #[test]
    fn namespace_with_nul_rejected() {
        assert_eq!(
            Namespace::new("Us\0er"),
            Err(NamespaceError::ContainsNul)
        );
    }
}
