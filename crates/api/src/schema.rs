//! Static model schema declaration (§4.9, C9).
//!
//! A schema is a plain, `const`-friendly description of a model's fields
//! and geo indexes — no macros, no codegen, no derive. Declaring one is
//! the only ceremony a caller needs to get `save`/`delete`/`get`/`get_by`
//! and the [`crate::query::Query`] builder for free.

use rom_core::value::FieldKind;
use rom_engine::Keygen;

/// One field's persisted type, indexing, and uniqueness.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name, matching the key [`crate::model::Model::to_fields`]
    /// uses in its returned [`rom_core::value::FieldMap`].
    pub name: &'static str,
    /// Persisted type, used to decode the field back out of a record
    /// hash.
    pub kind: FieldKind,
    /// Keygen applied to this field's value, if any. `None` means the
    /// field is stored but never indexed.
    pub keygen: Option<Keygen>,
    /// Whether this field carries a unique constraint. Multiple fields
    /// with the same `name` prefix convention are not supported here —
    /// composite uniques are out of scope for this minimal facade (the
    /// underlying [`rom_engine::writer::Writer`] supports them directly
    /// for callers that need more than a single-column unique).
    pub unique: bool,
    /// Maintain a prefix-ZSET entry (`startswith` queries).
    pub prefix: bool,
    /// Maintain a suffix-ZSET entry (`endswith` queries).
    pub suffix: bool,
}

impl FieldSpec {
    /// A plain, unindexed field.
    pub const fn plain(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            keygen: None,
            unique: false,
            prefix: false,
            suffix: false,
        }
    }
}

/// A named geo index sourced from a pair of longitude/latitude fields.
#[derive(Debug, Clone, Copy)]
pub struct GeoFieldSpec {
    /// Name of the geo index.
    pub name: &'static str,
    /// Field holding the point's longitude.
    pub lon_field: &'static str,
    /// Field holding the point's latitude.
    pub lat_field: &'static str,
}

/// A model's static schema: namespace, fields, geo indexes.
#[derive(Debug)]
pub struct ModelSchema {
    /// Namespace (model name) records of this type live under.
    pub namespace: &'static str,
    /// Every field the model persists.
    pub fields: &'static [FieldSpec],
    /// Geo indexes derived from pairs of fields in [`ModelSchema::fields`].
    pub geo: &'static [GeoFieldSpec],
}

impl ModelSchema {
    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}
