//! The per-record index manifest.
//!
//! A manifest is the single source of truth for "what must be removed from
//! the indexes if this record is deleted or re-indexed" (§3). It is stored
//! in the record's own hash under the reserved sub-key `-index-data-`
//! (with a fallback read path for the legacy flat `<ns>::` hash layout —
//! see [`crate::namespace::Namespace::legacy_manifest_key`]), encoded as a
//! JSON array of length 5 (§6: "Manifest encoding"):
//!
//! ```json
//! [set_terms, scored_terms, prefix_pairs, suffix_pairs, geo_names]
//! ```

use serde::{Deserialize, Serialize};

/// Reserved record sub-key the manifest is stored under.
pub const MANIFEST_FIELD: &str = "-index-data-";

/// A `(field, term)` pair recorded for a prefix or suffix index entry.
pub type FieldTermPair = (String, String);

/// The 5-tuple of index terms currently attributed to one record.
///
/// Invariant I1 (§3): after any successful write, the union of index
/// entries pointing at id `p` equals exactly the terms recorded here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// `<field>:<term>` set-index entries this record is a member of.
    pub set_terms: Vec<String>,
    /// Field names this record has a scored-index entry for.
    pub scored_terms: Vec<String>,
    /// `(field, term)` pairs this record has a prefix-ZSET entry for.
    pub prefix_pairs: Vec<FieldTermPair>,
    /// `(field, term)` pairs this record has a suffix-ZSET entry for.
    pub suffix_pairs: Vec<FieldTermPair>,
    /// Names of geo indexes this record has an entry in.
    pub geo_names: Vec<String>,
}

impl IndexManifest {
    /// True if this manifest names no index entries at all.
    pub fn is_empty(&self) -> bool {
        self.set_terms.is_empty()
            && self.scored_terms.is_empty()
            && self.prefix_pairs.is_empty()
            && self.suffix_pairs.is_empty()
            && self.geo_names.is_empty()
    }

    /// Encode as the JSON-array-of-5 wire form described by §6.
    pub fn encode(&self) -> String {
        let array = serde_json::json!([
            self.set_terms,
            self.scored_terms,
            self.prefix_pairs,
            self.suffix_pairs,
            self.geo_names,
        ]);
        array.to_string()
    }

    /// Decode a legacy flat-hash manifest: a JSON array of length 2,
    /// `[set_terms, scored_terms]`, written by versions that predate
    /// prefix/suffix/geo indexing. Used only as a migration fallback when
    /// no per-record manifest exists yet (§9: legacy manifests in `<ns>::`
    /// coexist with per-record manifests; the writer prefers the new
    /// location but keeps both clean).
    pub fn decode_legacy(raw: &str) -> Result<IndexManifest, ManifestDecodeError> {
        if raw.is_empty() {
            return Ok(IndexManifest::default());
        }
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| ManifestDecodeError(e.to_string()))?;
        let arr = value
            .as_array()
            .ok_or_else(|| ManifestDecodeError("legacy manifest is not a JSON array".into()))?;
        if arr.len() != 2 {
            return Err(ManifestDecodeError(format!(
                "legacy manifest array has {} elements, expected 2",
                arr.len()
            )));
        }
        let set_terms = serde_json::from_value(arr[0].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        let scored_terms = serde_json::from_value(arr[1].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        Ok(IndexManifest {
            set_terms,
            scored_terms,
            ..IndexManifest::default()
        })
    }

    /// Decode from the JSON-array-of-5 wire form. Returns `Ok(default)`
    /// (an empty manifest) for an empty string, matching "a record with no
    /// manifest yet" rather than treating it as a decode error.
    pub fn decode(raw: &str) -> Result<IndexManifest, ManifestDecodeError> {
        if raw.is_empty() {
            return Ok(IndexManifest::default());
        }
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| ManifestDecodeError(e.to_string()))?;
        let arr = value
            .as_array()
            .ok_or_else(|| ManifestDecodeError("manifest is not a JSON array".into()))?;
        if arr.len() != 5 {
            return Err(ManifestDecodeError(format!(
                "manifest array has {} elements, expected 5",
                arr.len()
            )));
        }
        let set_terms = serde_json::from_value(arr[0].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        let scored_terms = serde_json::from_value(arr[1].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        let prefix_pairs = serde_json::from_value(arr[2].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        let suffix_pairs = serde_json::from_value(arr[3].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        let geo_names = serde_json::from_value(arr[4].clone())
            .map_err(|e| ManifestDecodeError(e.to_string()))?;
        Ok(IndexManifest {
            set_terms,
            scored_terms,
            prefix_pairs,
            suffix_pairs,
            geo_names,
        })
    }
}

/// Error decoding a manifest's JSON-array-of-5 wire form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid index manifest: {0}")]
pub struct ManifestDecodeError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_round_trips() {
        let m = IndexManifest::default();
        assert!(m.is_empty());
        let encoded = m.encode();
        let decoded = IndexManifest::decode(&encoded).unwrap();
        assert_eq!(decoded, m);
    }

    #[test]
    fn empty_string_decodes_to_default() {
        let decoded = IndexManifest::decode("").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn populated_manifest_round_trips() {
        let m = IndexManifest {
            set_terms: vec!["tag:red".to_string()],
            scored_terms: vec!["created".to_string()],
            prefix_pairs: vec![("email".to_string(), "user@gmail.com".to_string())],
            suffix_pairs: vec![("email".to_string(), "user@gmail.com".to_string())],
            geo_names: vec!["location".to_string()],
        };
        let encoded = m.encode();
        assert!(encoded.starts_with('['));
        let decoded = IndexManifest::decode(&encoded).unwrap();
        assert_eq!(decoded, m);
    }

    #[test]
    fn wrong_arity_array_is_rejected() {
        let err = IndexManifest::decode("[1,2,3]").unwrap_err();
        assert!(err.to_string().contains("expected 5"));
    }

    #[test]
    fn legacy_manifest_decodes_into_partial_manifest() {
        let legacy = r#"[["tag:red"],["created"]]"#;
        let decoded = IndexManifest::decode_legacy(legacy).unwrap();
        assert_eq!(decoded.set_terms, vec!["tag:red".to_string()]);
        assert_eq!(decoded.scored_terms, vec!["created".to_string()]);
        assert!(decoded.prefix_pairs.is_empty());
        assert!(decoded.geo_names.is_empty());
    }
}
