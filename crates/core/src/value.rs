//! Typed field values and their persisted string encoding.
//!
//! A record's fields are a mapping from field name to [`FieldValue`]. The
//! persisted form of every field is a string — the backing store's hash
//! sub-values are always strings — so every variant here knows how to
//! render itself to, and parse itself back from, that canonical string
//! form (§3: "Persisted form: a hash ... whose sub-values are the encoded
//! string form of each field").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value the backing store would return for a field whose sub-key is
/// present with an empty string — used only by [`FieldValue::Boolean`],
/// whose persisted "false" form is the *absence* of the sub-key rather
/// than an empty string (§3: persisted as `"1"` or empty).
pub const FIELD_DELETED_SENTINEL: &str = "";

/// A field's primary key map: field name → value. Fields absent from the
/// map are semantically null, matching the record hash's semantics.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Typed field value, independent of any particular backing-store wire
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Arbitrary-precision integer, persisted as its decimal string form.
    Integer(i128),
    /// IEEE-754 double, persisted via its canonical `ryu`-free `f64`
    /// `Display` form (Rust's shortest round-tripping representation).
    Float(f64),
    /// Exact decimal value, persisted verbatim as its decimal string.
    Decimal(String),
    /// Boolean, persisted as `"1"` (true) or the field being absent
    /// entirely (false) — see [`FIELD_DELETED_SENTINEL`].
    Boolean(bool),
    /// Seconds-since-epoch timestamp (date + time of day).
    Timestamp(f64),
    /// Calendar date with no time component, persisted as a
    /// seconds-since-epoch float at midnight UTC.
    Date(f64),
    /// Time of day with no date component, persisted as seconds since
    /// midnight.
    Time(f64),
    /// UTF-8 text.
    Text(String),
    /// Opaque octet string, transported as a latin-1 round-trip so every
    /// byte value 0..=255 maps to one `char`.
    Bytes(Vec<u8>),
    /// Nested JSON value, serialized canonically (stable key order).
    Json(serde_json::Value),
    /// The record's own primary key.
    PrimaryKey(u64),
    /// Another record's primary key.
    ForeignKey(u64),
}

/// Errors raised while decoding a field's persisted string form.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    /// The string did not parse as the expected numeric type.
    #[error("cannot parse {raw:?} as {expected}")]
    BadNumber {
        /// The raw persisted string.
        raw: String,
        /// The type it was expected to parse as.
        expected: &'static str,
    },
    /// The string was not valid latin-1 bytes (every `char` must be <=
    /// U+00FF).
    #[error("invalid latin-1 byte string: {0:?}")]
    BadBytes(String),
    /// The string was not valid JSON.
    #[error("invalid JSON: {0}")]
    BadJson(String),
}

impl FieldValue {
    /// Render this value to its persisted string form. Returns `None` for
    /// `Boolean(false)`, whose persisted form is field absence rather than
    /// a string (the writer must `HDEL` rather than `HSET` in that case).
    pub fn encode(&self) -> Option<String> {
        match self {
            FieldValue::Integer(v) => Some(v.to_string()),
            FieldValue::Float(v) => Some(format_float(*v)),
            FieldValue::Decimal(v) => Some(v.clone()),
            FieldValue::Boolean(true) => Some("1".to_string()),
            FieldValue::Boolean(false) => None,
            FieldValue::Timestamp(v) | FieldValue::Date(v) | FieldValue::Time(v) => {
                Some(format_float(*v))
            }
            FieldValue::Text(v) => Some(v.clone()),
            FieldValue::Bytes(v) => Some(encode_latin1(v)),
            FieldValue::Json(v) => Some(v.to_string()),
            FieldValue::PrimaryKey(v) | FieldValue::ForeignKey(v) => Some(v.to_string()),
        }
    }

    /// Decode a persisted string back into a value of the given kind.
    pub fn decode(kind: FieldKind, raw: &str) -> Result<FieldValue, DecodeError> {
        match kind {
            FieldKind::Integer => raw
                .parse()
                .map(FieldValue::Integer)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "Integer",
                }),
            FieldKind::Float => raw
                .parse()
                .map(FieldValue::Float)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "Float",
                }),
            FieldKind::Decimal => Ok(FieldValue::Decimal(raw.to_string())),
            FieldKind::Boolean => Ok(FieldValue::Boolean(true)),
            FieldKind::Timestamp => raw
                .parse()
                .map(FieldValue::Timestamp)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "Timestamp",
                }),
            FieldKind::Date => raw
                .parse()
                .map(FieldValue::Date)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "Date",
                }),
            FieldKind::Time => raw
                .parse()
                .map(FieldValue::Time)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "Time",
                }),
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Bytes => decode_latin1(raw).map(FieldValue::Bytes),
            FieldKind::Json => serde_json::from_str(raw)
                .map(FieldValue::Json)
                .map_err(|e| DecodeError::BadJson(e.to_string())),
            FieldKind::PrimaryKey => raw
                .parse()
                .map(FieldValue::PrimaryKey)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "PrimaryKey",
                }),
            FieldKind::ForeignKey => raw
                .parse()
                .map(FieldValue::ForeignKey)
                .map_err(|_| DecodeError::BadNumber {
                    raw: raw.to_string(),
                    expected: "ForeignKey",
                }),
        }
    }

    /// The [`FieldKind`] this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Decimal(_) => FieldKind::Decimal,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Time(_) => FieldKind::Time,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::Json(_) => FieldKind::Json,
            FieldValue::PrimaryKey(_) => FieldKind::PrimaryKey,
            FieldValue::ForeignKey(_) => FieldKind::ForeignKey,
        }
    }

    /// The value's numeric score, if it has one — used by `NUMERIC`
    /// keygens and by range filters. Text-like variants return `None`.
    pub fn numeric_score(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Decimal(v) => v.parse().ok(),
            FieldValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Timestamp(v) | FieldValue::Date(v) | FieldValue::Time(v) => Some(*v),
            FieldValue::PrimaryKey(v) | FieldValue::ForeignKey(v) => Some(*v as f64),
            FieldValue::Text(_) | FieldValue::Bytes(_) | FieldValue::Json(_) => None,
        }
    }

    /// The value's text content, if it has one — used by text-oriented
    /// keygens (`FULL_TEXT`, `SIMPLE`, `IDENTITY`, prefix/suffix).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            FieldValue::Decimal(v) => Some(v),
            _ => None,
        }
    }
}

/// The type tag of a field, independent of any particular value —
/// needed to decode a persisted string back into a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// See [`FieldValue::Integer`].
    Integer,
    /// See [`FieldValue::Float`].
    Float,
    /// See [`FieldValue::Decimal`].
    Decimal,
    /// See [`FieldValue::Boolean`].
    Boolean,
    /// See [`FieldValue::Timestamp`].
    Timestamp,
    /// See [`FieldValue::Date`].
    Date,
    /// See [`FieldValue::Time`].
    Time,
    /// See [`FieldValue::Text`].
    Text,
    /// See [`FieldValue::Bytes`].
    Bytes,
    /// See [`FieldValue::Json`].
    Json,
    /// See [`FieldValue::PrimaryKey`].
    PrimaryKey,
    /// See [`FieldValue::ForeignKey`].
    ForeignKey,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Integer => "Integer",
            FieldKind::Float => "Float",
            FieldKind::Decimal => "Decimal",
            FieldKind::Boolean => "Boolean",
            FieldKind::Timestamp => "Timestamp",
            FieldKind::Date => "Date",
            FieldKind::Time => "Time",
            FieldKind::Text => "Text",
            FieldKind::Bytes => "Bytes",
            FieldKind::Json => "Json",
            FieldKind::PrimaryKey => "PrimaryKey",
            FieldKind::ForeignKey => "ForeignKey",
        };
        f.write_str(name)
    }
}

fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn encode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_latin1(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(raw.len());
    for ch in raw.chars() {
        let code = ch as u32;
        if code > 0xFF {
            return Err(DecodeError::BadBytes(raw.to_string()));
        }
        out.push(code as u8);
    }
    Ok(out)
}
