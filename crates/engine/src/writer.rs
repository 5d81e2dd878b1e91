//! Writer (§4.4, C4): the high-level, typed front door to the atomic
//! write script [`rom_backend::BackingStore::execute_write`] implements.
//!
//! The backend only knows about encoded strings and raw index terms;
//! `Writer` is where a caller's old/new [`FieldMap`]s, a model's unique
//! fields, and a model's keygens come together into one [`WriteRequest`]
//! and get translated back into [`RomError`] on failure.

use crate::keygen::{Keygen, Terms};
use rom_backend::{BackingStore, WriteOutcome as BackendOutcome, WriteRequest};
use rom_core::error::{RomError, RomResult};
use rom_core::limits::Limits;
use rom_core::namespace::Namespace;
use rom_core::value::{FieldMap, FieldValue};
use std::collections::BTreeMap;

/// A field's keygen assignment plus whether it participates in a unique
/// constraint. Multi-column unique constraints are expressed by giving
/// several fields the same `unique_group` name.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Keygen applied to this field's value, if any (a field with no
    /// keygen is persisted but never indexed).
    pub keygen: Option<Keygen>,
    /// Name of the unique-constraint group this field belongs to, if
    /// any. A single-column unique field uses its own name as the group.
    pub unique_group: Option<String>,
    /// Maintain a prefix-ZSET entry for this field's text value
    /// (§4.3/§4.7: `startswith` queries).
    pub prefix: bool,
    /// Maintain a suffix-ZSET entry for this field's text value
    /// (§4.3/§4.7: `endswith` queries).
    pub suffix: bool,
}

/// A named geo index sourced from a pair of longitude/latitude fields on
/// the same record (§3: "Geo index at `<ns>:<name>:geo`"). Geo indexing
/// spans two fields, so it cannot be expressed as a single [`FieldSpec`].
#[derive(Debug, Clone)]
pub struct GeoSpec {
    /// Name of the geo index (`<ns>:<name>:geo`).
    pub name: String,
    /// Field holding the point's longitude.
    pub lon_field: String,
    /// Field holding the point's latitude.
    pub lat_field: String,
}

/// Outcome of [`Writer::save`] / [`Writer::delete`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The write succeeded; carries the total count of index/hash
    /// mutations applied (unique commits/removals, field mutations,
    /// cleanup removals, and new index emissions).
    Saved(u64),
}

/// Composes [`WriteRequest`]s from typed field state and a model's field
/// specs, and translates [`BackendOutcome`] into [`RomResult`].
pub struct Writer<'a, S: BackingStore> {
    store: &'a S,
    ns: Namespace,
    fields: &'a [FieldSpec],
    geo: &'a [GeoSpec],
    limits: Limits,
}

impl<'a, S: BackingStore> Writer<'a, S> {
    /// Build a writer for `ns`, whose model declares `fields` and no geo
    /// indexes.
    pub fn new(store: &'a S, ns: Namespace, fields: &'a [FieldSpec]) -> Self {
        Writer {
            store,
            ns,
            fields,
            geo: &[],
            limits: Limits::default(),
        }
    }

    /// Build a writer for `ns`, whose model declares `fields` and `geo`
    /// indexes.
    pub fn with_geo(store: &'a S, ns: Namespace, fields: &'a [FieldSpec], geo: &'a [GeoSpec]) -> Self {
        Writer {
            store,
            ns,
            fields,
            geo,
            limits: Limits::default(),
        }
    }

    /// Build a writer with a caller-supplied [`Limits`] instead of the
    /// default (tests that want to exercise limit enforcement without
    /// megabyte-sized fixtures use [`Limits::with_small_limits`]).
    pub fn with_limits(
        store: &'a S,
        ns: Namespace,
        fields: &'a [FieldSpec],
        geo: &'a [GeoSpec],
        limits: Limits,
    ) -> Self {
        Writer {
            store,
            ns,
            fields,
            geo,
            limits,
        }
    }

    /// Allocate a fresh primary key for this namespace.
    pub fn next_id(&self) -> RomResult<u64> {
        self.store
            .incr(&self.ns.pkey_counter_key())
            .map_err(|e| RomError::Backend(e.to_string()))
    }

    /// Persist `new_values` for record `id`, given the caller's
    /// last-known `old_values` (used for the optimistic race check) and
    /// the changed field set.
    ///
    /// `old_values` should contain only the fields the caller is about
    /// to touch; fields never read by the caller are not raced on.
    pub fn save(
        &self,
        id: u64,
        old_values: &FieldMap,
        new_values: &FieldMap,
    ) -> RomResult<SaveOutcome> {
        let req = self.build_write_request(id, old_values, new_values, false)?;
        self.dispatch(id, req)
    }

    /// Remove record `id` and every index entry its manifest names.
    pub fn delete(&self, id: u64, old_values: &FieldMap) -> RomResult<SaveOutcome> {
        let empty = FieldMap::new();
        let req = self.build_write_request(id, old_values, &empty, true)?;
        self.dispatch(id, req)
    }

    fn dispatch(&self, id: u64, req: WriteRequest) -> RomResult<SaveOutcome> {
        let attempted: BTreeMap<String, String> = req.unique_new.iter().cloned().collect();
        let outcome = self
            .store
            .execute_write(&self.ns, req)
            .map_err(|e| RomError::Backend(e.to_string()))?;
        match outcome {
            BackendOutcome::Changed(n) => {
                tracing::debug!(target: "rom::writer", namespace = %self.ns, id, changes = n, "write committed");
                Ok(SaveOutcome::Saved(n))
            }
            BackendOutcome::Unique { field } => {
                let value = attempted.get(&field).cloned().unwrap_or_default();
                tracing::warn!(target: "rom::writer", namespace = %self.ns, id, field = %field, "unique constraint rejected write");
                Err(RomError::UniqueViolation {
                    namespace: self.ns.as_str().to_string(),
                    field,
                    value,
                })
            }
            BackendOutcome::Race { fields } => {
                // §4.4 step 1's special case: if the record itself no
                // longer exists, another writer deleted it rather than
                // merely changing the raced fields — report that
                // distinctly rather than as an ordinary contended-field
                // race (there is no separate primary-key *field* to check
                // in this representation; record existence is the direct
                // equivalent).
                let record_gone = !self
                    .store
                    .exists(&self.ns.record_key(id))
                    .map_err(|e| RomError::Backend(e.to_string()))?;
                if record_gone {
                    tracing::warn!(target: "rom::writer", namespace = %self.ns, id, "record deleted by another writer");
                    return Err(RomError::EntityDeleted {
                        namespace: self.ns.as_str().to_string(),
                        id,
                    });
                }
                tracing::warn!(target: "rom::writer", namespace = %self.ns, id, fields = ?fields, "data race rejected write");
                Err(RomError::DataRace {
                    namespace: self.ns.as_str().to_string(),
                    id,
                    fields,
                })
            }
        }
    }

    fn build_write_request(
        &self,
        id: u64,
        old_values: &FieldMap,
        new_values: &FieldMap,
        is_delete: bool,
    ) -> RomResult<WriteRequest> {
        let mut req = WriteRequest {
            namespace: self.ns.as_str().to_string(),
            id,
            is_delete,
            ..Default::default()
        };

        for (field, old) in old_values {
            req.race_check.push((field.clone(), old.encode()));
        }

        if is_delete {
            return Ok(req);
        }

        if let Some(reason) = self.limits.check_name(self.ns.as_str()) {
            return Err(RomError::InvalidColumn {
                namespace: self.ns.as_str().to_string(),
                field: String::new(),
                reason,
            });
        }
        for (field, value) in new_values {
            if let Some(reason) = self.limits.check_name(field) {
                return Err(RomError::InvalidColumn {
                    namespace: self.ns.as_str().to_string(),
                    field: field.clone(),
                    reason,
                });
            }
            if let Some(reason) = self.limits.check_field(value) {
                return Err(RomError::InvalidColumn {
                    namespace: self.ns.as_str().to_string(),
                    field: field.clone(),
                    reason,
                });
            }
        }

        // Composite/single-column unique constraints: every field sharing a
        // `unique_group` contributes one component to a single encoded
        // value for that group (§6: "Unique-constraint value encoding"),
        // so fields must be grouped before encoding rather than emitting
        // one `unique_new` entry per field.
        let is_new_record = old_values.is_empty();
        let mut groups: BTreeMap<&str, Vec<&FieldSpec>> = BTreeMap::new();
        for spec in self.fields {
            if let Some(group) = &spec.unique_group {
                groups.entry(group.as_str()).or_default().push(spec);
            }
        }
        for (group, members) in &groups {
            let new_components: Vec<Option<String>> = members
                .iter()
                .map(|m| new_values.get(&m.name).and_then(|v| v.encode()))
                .collect();
            let new_any_present = new_components.iter().any(Option::is_some);
            if !new_any_present {
                continue;
            }
            let new_refs: Vec<Option<&str>> = new_components.iter().map(|c| c.as_deref()).collect();
            let new_encoded = encode_unique_composite(&new_refs);

            let old_components: Vec<Option<String>> = members
                .iter()
                .map(|m| old_values.get(&m.name).and_then(|v| v.encode()))
                .collect();
            let old_refs: Vec<Option<&str>> = old_components.iter().map(|c| c.as_deref()).collect();
            let old_encoded = encode_unique_composite(&old_refs);

            if is_new_record || old_encoded != new_encoded {
                req.unique_new.push((group.to_string(), new_encoded));
                if !is_new_record {
                    req.unique_deleted.push((group.to_string(), old_encoded));
                }
            }
        }

        for (field, new_value) in new_values {
            match new_value.encode() {
                Some(encoded) => req.field_updates.push((field.clone(), encoded)),
                None => req.field_deletions.push(field.clone()),
            }
        }

        for spec in self.fields {
            let Some(value) = new_values.get(&spec.name) else {
                continue;
            };
            if let Some(keygen) = spec.keygen {
                match keygen.apply(value) {
                    Terms::Empty => {}
                    Terms::Scored(score) => req.scored_terms.push((spec.name.clone(), score)),
                    Terms::Set(terms) => {
                        for term in terms.into_iter().take(self.limits.max_full_text_terms) {
                            req.set_terms.push((spec.name.clone(), term));
                        }
                    }
                }
            }
            if let Some(text) = value.as_text() {
                if spec.prefix {
                    req.prefix_terms.push((spec.name.clone(), text.to_string()));
                }
                if spec.suffix {
                    req.suffix_terms.push((spec.name.clone(), text.to_string()));
                }
            }
        }

        for geo in self.geo {
            let lon = new_values.get(&geo.lon_field).and_then(|v| v.numeric_score());
            let lat = new_values.get(&geo.lat_field).and_then(|v| v.numeric_score());
            if let (Some(lon), Some(lat)) = (lon, lat) {
                req.geo_terms.push((geo.name.clone(), lon, lat));
            }
        }

        Ok(req)
    }
}

/// Encode a multi-column unique constraint's component values into the
/// null-separated wire form §6 describes: each component is UTF-8 encoded
/// (empty string for an absent value) and components are joined with
/// `\0\0`, with a single `\0` reserved as the separator within a
/// component's own encoding — this keeps component boundaries
/// unambiguous even when a component's encoded value itself contains a
/// `\0`.
pub fn encode_unique_composite(components: &[Option<&str>]) -> String {
    components
        .iter()
        .map(|c| c.unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\0\0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rom_backend::InMemoryBackend;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                name: "email".to_string(),
                keygen: None,
                unique_group: Some("email".to_string()),
                ..Default::default()
            },
            FieldSpec {
                name: "created".to_string(),
                keygen: Some(Keygen::Numeric),
                unique_group: None,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn save_persists_new_record_and_indexes() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = fields();
        let writer = Writer::new(&be, ns.clone(), &specs);

        let mut new = FieldMap::new();
        new.insert("email".to_string(), FieldValue::Text("a@b".to_string()));
        new.insert("created".to_string(), FieldValue::Float(100.0));

        let outcome = writer.save(1, &FieldMap::new(), &new).unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved(n) if n > 0));
    }

    #[test]
    fn save_rejects_duplicate_unique_value() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = fields();
        let writer = Writer::new(&be, ns.clone(), &specs);

        let mut new1 = FieldMap::new();
        new1.insert("email".to_string(), FieldValue::Text("a@b".to_string()));
        writer.save(1, &FieldMap::new(), &new1).unwrap();

        let mut new2 = FieldMap::new();
        new2.insert("email".to_string(), FieldValue::Text("a@b".to_string()));
        let err = writer.save(2, &FieldMap::new(), &new2).unwrap_err();
        assert!(matches!(err, RomError::UniqueViolation { .. }));
    }

    #[test]
    fn save_detects_data_race_on_stale_old_value() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = fields();
        let writer = Writer::new(&be, ns.clone(), &specs);

        let mut first = FieldMap::new();
        first.insert("created".to_string(), FieldValue::Float(1.0));
        writer.save(7, &FieldMap::new(), &first).unwrap();

        let mut stale_old = FieldMap::new();
        stale_old.insert("created".to_string(), FieldValue::Float(999.0));
        let mut new = FieldMap::new();
        new.insert("created".to_string(), FieldValue::Float(2.0));
        let err = writer.save(7, &stale_old, &new).unwrap_err();
        assert!(matches!(err, RomError::DataRace { .. }));
    }

    #[test]
    fn save_after_concurrent_delete_reports_entity_deleted() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = fields();
        let writer = Writer::new(&be, ns.clone(), &specs);

        let mut first = FieldMap::new();
        first.insert("created".to_string(), FieldValue::Float(1.0));
        writer.save(7, &FieldMap::new(), &first).unwrap();

        writer.delete(7, &first).unwrap();

        let mut new = FieldMap::new();
        new.insert("created".to_string(), FieldValue::Float(2.0));
        let err = writer.save(7, &first, &new).unwrap_err();
        assert!(matches!(err, RomError::EntityDeleted { id: 7, .. }));
        assert!(err.is_recoverable());
        assert!(err.is_data_race());
    }

    #[test]
    fn encode_unique_composite_joins_with_double_nul() {
        let encoded = encode_unique_composite(&[Some("a"), Some("b"), None]);
        assert_eq!(encoded, "a\0\0b\0\0");
    }

    #[test]
    fn unique_violation_carries_the_attempted_value() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = fields();
        let writer = Writer::new(&be, ns.clone(), &specs);

        let mut new1 = FieldMap::new();
        new1.insert("email".to_string(), FieldValue::Text("a@b".to_string()));
        writer.save(1, &FieldMap::new(), &new1).unwrap();

        let mut new2 = FieldMap::new();
        new2.insert("email".to_string(), FieldValue::Text("a@b".to_string()));
        let err = writer.save(2, &FieldMap::new(), &new2).unwrap_err();
        match err {
            RomError::UniqueViolation { field, value, .. } => {
                assert_eq!(field, "email");
                assert_eq!(value, "a@b");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[test]
    fn prefix_and_suffix_fields_emit_index_terms() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = vec![FieldSpec {
            name: "email".to_string(),
            prefix: true,
            suffix: true,
            ..Default::default()
        }];
        let writer = Writer::new(&be, ns.clone(), &specs);

        let mut new = FieldMap::new();
        new.insert(
            "email".to_string(),
            FieldValue::Text("user@gmail.com".to_string()),
        );
        writer.save(1, &FieldMap::new(), &new).unwrap();

        let pre_hits =
            crate::scanner::scan_literal(&be, &ns.prefix_index_key("email"), "user@", false)
                .unwrap();
        assert_eq!(pre_hits, vec![1]);

        let reversed: String = "@gmail.com".chars().rev().collect();
        let suf_hits =
            crate::scanner::scan_literal(&be, &ns.suffix_index_key("email"), &reversed, true)
                .unwrap();
        assert_eq!(suf_hits, vec![1]);
    }

    #[test]
    fn save_rejects_oversized_field_value_under_small_limits() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        let specs = fields();
        let writer = Writer::with_limits(&be, ns, &specs, &[], rom_core::limits::Limits::with_small_limits());

        let mut new = FieldMap::new();
        new.insert("email".to_string(), FieldValue::Text("x".repeat(300)));
        let err = writer.save(1, &FieldMap::new(), &new).unwrap_err();
        assert!(matches!(err, RomError::InvalidColumn { .. }));
    }

    #[test]
    fn save_truncates_full_text_terms_to_the_configured_limit() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("Post").unwrap();
        let specs = vec![FieldSpec {
            name: "body".to_string(),
            keygen: Some(Keygen::FullText),
            ..Default::default()
        }];
        let limits = rom_core::limits::Limits::with_small_limits();
        let writer = Writer::with_limits(&be, ns, &specs, &[], limits);

        let words: Vec<String> = (0..50).map(|i| format!("word{i}")).collect();
        let mut new = FieldMap::new();
        new.insert("body".to_string(), FieldValue::Text(words.join(" ")));
        writer.save(1, &FieldMap::new(), &new).unwrap();

        let present = (0..50)
            .filter(|i| {
                be.sismember(
                    &Namespace::new("Post").unwrap().set_index_key("body", &format!("word{i}")),
                    "1",
                )
                .unwrap()
            })
            .count();
        assert!(present <= 16, "expected at most 16 indexed terms, got {present}");
    }

    #[test]
    fn geo_spec_emits_geoadd_from_two_fields() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("Place".to_string()).unwrap();
        let specs: Vec<FieldSpec> = Vec::new();
        let geo = vec![GeoSpec {
            name: "geo".to_string(),
            lon_field: "lon".to_string(),
            lat_field: "lat".to_string(),
        }];
        let writer = Writer::with_geo(&be, ns.clone(), &specs, &geo);

        let mut new = FieldMap::new();
        new.insert("lon".to_string(), FieldValue::Float(0.0));
        new.insert("lat".to_string(), FieldValue::Float(50.0));
        writer.save(1, &FieldMap::new(), &new).unwrap();

        let hits = be
            .georadius(&ns.geo_index_key("geo"), 0.0, 50.0, 10.0, rom_backend::GeoUnit::Kilometers, None)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].member, "1");
    }
}
