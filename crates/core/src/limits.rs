//! Size limits enforced before a record ever reaches the backend.
//!
//! These are a purely local, pre-flight concern: the backing store itself
//! has no notion of "field" or "record", so nothing here is optional — it
//! exists precisely because the store wouldn't catch an oversized value or
//! a too-deep JSON document on its own.

use crate::value::FieldValue;

/// Configurable size limits for records, fields, and index terms.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum length of a namespace or field name, in bytes.
    pub max_name_bytes: usize,
    /// Maximum length of an encoded Text/Bytes field, in bytes.
    pub max_field_bytes: usize,
    /// Maximum number of tokens a `FULL_TEXT` keygen will emit for one
    /// field value (extras are dropped, not an error).
    pub max_full_text_terms: usize,
    /// Maximum JSON nesting depth accepted for a `Json` field.
    pub max_json_nesting_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_name_bytes: 256,
            max_field_bytes: 16 * 1024 * 1024,
            max_full_text_terms: 10_000,
            max_json_nesting_depth: 64,
        }
    }
}

impl Limits {
    /// Small limits for tests that want to exercise limit enforcement
    /// without building megabyte-sized fixtures.
    pub fn with_small_limits() -> Self {
        Limits {
            max_name_bytes: 32,
            max_field_bytes: 256,
            max_full_text_terms: 16,
            max_json_nesting_depth: 4,
        }
    }

    /// Returns a human-readable reason if `name` (a namespace or field
    /// name) exceeds [`Limits::max_name_bytes`].
    pub fn check_name(&self, name: &str) -> Option<String> {
        if name.len() > self.max_name_bytes {
            Some(format!(
                "name {name:?} is {} bytes, exceeds the {}-byte limit",
                name.len(),
                self.max_name_bytes
            ))
        } else {
            None
        }
    }

    /// Returns a human-readable reason if `value`'s encoded persisted form
    /// exceeds [`Limits::max_field_bytes`], or — for [`FieldValue::Json`] —
    /// its nesting depth exceeds [`Limits::max_json_nesting_depth`].
    pub fn check_field(&self, value: &FieldValue) -> Option<String> {
        if let Some(encoded) = value.encode() {
            if encoded.len() > self.max_field_bytes {
                return Some(format!(
                    "encoded value is {} bytes, exceeds the {}-byte limit",
                    encoded.len(),
                    self.max_field_bytes
                ));
            }
        }
        if let FieldValue::Json(json) = value {
            let depth = json_depth(json);
            if depth > self.max_json_nesting_depth {
                return Some(format!(
                    "JSON nesting depth {depth} exceeds the {} limit",
                    self.max_json_nesting_depth
                ));
            }
        }
        None
    }
}

fn json_depth(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        serde_json::Value::Object(map) => {
            1 + map.values().map(json_depth).max().unwrap_or(0)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_generous() {
        let limits = Limits::default();
        assert!(limits.max_field_bytes > 1024);
    }

    #[test]
    fn small_limits_are_small() {
        let limits = Limits::with_small_limits();
        assert_eq!(limits.max_name_bytes, 32);
    }

    #[test]
    fn check_name_rejects_oversized_names() {
        let limits = Limits::with_small_limits();
        assert!(limits.check_name(&"x".repeat(33)).is_some());
        assert!(limits.check_name("short").is_none());
    }

    #[test]
    fn check_field_rejects_oversized_values() {
        use crate::value::FieldValue;
        let limits = Limits::with_small_limits();
        let big = FieldValue::Text("x".repeat(257));
        assert!(limits.check_field(&big).is_some());
        let small = FieldValue::Text("ok".to_string());
        assert!(limits.check_field(&small).is_none());
    }

    #[test]
    fn check_field_rejects_deeply_nested_json() {
        use crate::value::FieldValue;
        let limits = Limits::with_small_limits();
        let nested = serde_json::json!({"a": {"b": {"c": {"d": {"e": 1}}}}});
        let value = FieldValue::Json(nested);
        assert!(limits.check_field(&value).is_some());
    }

    #[test]
    fn check_field_accepts_shallow_json() {
        use crate::value::FieldValue;
        let limits = Limits::with_small_limits();
        let value = FieldValue::Json(serde_json::json!({"a": 1}));
        assert!(limits.check_field(&value).is_none());
    }
}
