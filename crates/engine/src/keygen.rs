//! Key-generators (§4.2, C2).
//!
//! A keygen is a pure function from a field's value to the index terms
//! that value should be recorded under. Keygens never touch the backing
//! store and never see the rest of the record — they are deterministic
//! and side-effect free by construction, which is what lets the writer
//! (§4.4) compute the full set of new index terms before it opens the
//! atomic write.

use rom_core::value::FieldValue;
use std::collections::BTreeSet;

/// The built-in keygen variants (§4.2). Represented as an enum, not
/// trait objects, so a model's schema can be round-tripped from data
/// alone and indexes rebuilt without recompiling against custom code
/// (§9: "keygens are values in the schema, not code-generated").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keygen {
    /// Index the field's numeric value directly, as the field's ordering
    /// score.
    Numeric,
    /// Index `"true"`/`"false"` as a single set term.
    Boolean,
    /// Tokenize on whitespace, strip leading/trailing ASCII punctuation,
    /// lowercase, dedupe, index each surviving token as a set term.
    FullText,
    /// Index the value's prefix score as the field's ordering score,
    /// case-sensitive.
    Simple,
    /// Same as [`Keygen::Simple`], lowercased first.
    SimpleCi,
    /// Index the whole value as one set term, case-sensitive.
    Identity,
    /// Same as [`Keygen::Identity`], lowercased first.
    IdentityCi,
    /// Index the referenced record's id as the field's ordering score.
    ForeignKey,
}

/// The terms a keygen produced for one field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Terms {
    /// No terms — the value was absent, or empty after tokenization.
    Empty,
    /// A set of set-index terms (`NUMERIC`/`FULL_TEXT`/`IDENTITY*` minus
    /// the ordering score).
    Set(BTreeSet<String>),
    /// A single ordering score for the field (`NUMERIC`/`SIMPLE*`/`FOREIGN_KEY`).
    Scored(f64),
}

const ASCII_PUNCTUATION: &[char] = &[
    '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', ':', ';', '<',
    '=', '>', '?', '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}', '~',
];

impl Keygen {
    /// Apply this keygen to a field's value.
    pub fn apply(self, value: &FieldValue) -> Terms {
        match self {
            Keygen::Numeric => match value.numeric_score() {
                Some(score) => Terms::Scored(score),
                None => Terms::Empty,
            },
            Keygen::Boolean => {
                let truthy = matches!(value, FieldValue::Boolean(true))
                    || matches!(value.numeric_score(), Some(n) if n != 0.0);
                let mut set = BTreeSet::new();
                set.insert(truthy.to_string());
                Terms::Set(set)
            }
            Keygen::FullText => {
                let Some(text) = value.as_text() else {
                    return Terms::Empty;
                };
                let tokens: BTreeSet<String> = text
                    .split_whitespace()
                    .map(|tok| {
                        tok.trim_matches(ASCII_PUNCTUATION)
                            .to_lowercase()
                    })
                    .filter(|tok| !tok.is_empty())
                    .collect();
                if tokens.is_empty() {
                    Terms::Empty
                } else {
                    Terms::Set(tokens)
                }
            }
            Keygen::Simple => match value.as_text() {
                Some(text) => Terms::Scored(rom_core::codec::prefix_score(text, false)),
                None => Terms::Empty,
            },
            Keygen::SimpleCi => match value.as_text() {
                Some(text) => Terms::Scored(rom_core::codec::prefix_score(
                    &text.to_lowercase(),
                    false,
                )),
                None => Terms::Empty,
            },
            Keygen::Identity => match value.as_text() {
                Some(text) if !text.is_empty() => {
                    let mut set = BTreeSet::new();
                    set.insert(text.to_string());
                    Terms::Set(set)
                }
                _ => Terms::Empty,
            },
            Keygen::IdentityCi => match value.as_text() {
                Some(text) if !text.is_empty() => {
                    let mut set = BTreeSet::new();
                    set.insert(text.to_lowercase());
                    Terms::Set(set)
                }
                _ => Terms::Empty,
            },
            Keygen::ForeignKey => match value {
                FieldValue::ForeignKey(id) | FieldValue::PrimaryKey(id) => {
                    Terms::Scored(*id as f64)
                }
                _ => Terms::Empty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_lowercases_tokenizes_and_dedupes() {
        let v = FieldValue::Text("Hello, hello WORLD!".to_string());
        let terms = Keygen::FullText.apply(&v);
        match terms {
            Terms::Set(set) => {
                assert_eq!(set.len(), 2);
                assert!(set.contains("hello"));
                assert!(set.contains("world"));
            }
            other => panic!("expected Set, got {other:?}"),
        }
    }

    #[test]
    fn full_text_on_empty_text_is_empty() {
        let v = FieldValue::Text("   ".to_string());
        assert_eq!(Keygen::FullText.apply(&v), Terms::Empty);
    }

    #[test]
    fn numeric_yields_scored_term() {
        let v = FieldValue::Float(42.5);
        assert_eq!(Keygen::Numeric.apply(&v), Terms::Scored(42.5));
    }

    #[test]
    fn boolean_yields_single_set_term() {
        let v = FieldValue::Boolean(true);
        match Keygen::Boolean.apply(&v) {
            Terms::Set(set) => assert_eq!(set, BTreeSet::from(["true".to_string()])),
            other => panic!("expected Set, got {other:?}"),
        }
    }

    #[test]
    fn identity_ci_lowercases_the_whole_value() {
        let v = FieldValue::Text("MixedCase".to_string());
        match Keygen::IdentityCi.apply(&v) {
            Terms::Set(set) => assert_eq!(set, BTreeSet::from(["mixedcase".to_string()])),
            other => panic!("expected Set, got {other:?}"),
        }
    }

    #[test]
    fn foreign_key_yields_referenced_id_as_score() {
        let v = FieldValue::ForeignKey(99);
        assert_eq!(Keygen::ForeignKey.apply(&v), Terms::Scored(99.0));
    }

    #[test]
    fn simple_on_non_text_value_is_empty() {
        let v = FieldValue::Integer(5);
        assert_eq!(Keygen::Simple.apply(&v), Terms::Empty);
    }
}
