//! Free functions operating generically over any [`Model`] (§4.9).
//!
//! Every piece of index/unique/race logic is delegated straight to
//! `rom-engine`; this module's only job is translating between a
//! model's [`ModelSchema`] and the typed [`rom_engine::writer::Writer`]/
//! [`rom_engine::IndexStore`] collaborators.

use crate::model::Model;
use crate::schema::ModelSchema;
use rom_backend::BackingStore;
use rom_core::error::{RomError, RomResult};
use rom_core::manifest::MANIFEST_FIELD;
use rom_core::namespace::Namespace;
use rom_core::value::{FieldKind, FieldMap, FieldValue};
use rom_engine::writer::{FieldSpec as EngineFieldSpec, GeoSpec, Writer};
use rom_engine::{IndexStore, Terms};

fn namespace_for(schema: &ModelSchema) -> RomResult<Namespace> {
    Namespace::new(schema.namespace).map_err(|e| RomError::ColumnError {
        namespace: schema.namespace.to_string(),
        reason: e.to_string(),
    })
}

fn engine_fields(schema: &ModelSchema) -> Vec<EngineFieldSpec> {
    schema
        .fields
        .iter()
        .map(|f| EngineFieldSpec {
            name: f.name.to_string(),
            keygen: f.keygen,
            unique_group: f.unique.then(|| f.name.to_string()),
            prefix: f.prefix,
            suffix: f.suffix,
        })
        .collect()
}

fn engine_geo(schema: &ModelSchema) -> Vec<GeoSpec> {
    schema
        .geo
        .iter()
        .map(|g| GeoSpec {
            name: g.name.to_string(),
            lon_field: g.lon_field.to_string(),
            lat_field: g.lat_field.to_string(),
        })
        .collect()
}

fn decode_record<S: BackingStore>(
    store: &S,
    ns: &Namespace,
    schema: &ModelSchema,
    id: u64,
) -> RomResult<Option<FieldMap>> {
    let key = ns.record_key(id);
    let raw = store
        .hgetall(&key)
        .map_err(|e| RomError::Backend(e.to_string()))?;
    if raw.is_empty() {
        return Ok(None);
    }
    let mut fields = FieldMap::new();
    for (name, value) in raw {
        if name == MANIFEST_FIELD {
            continue;
        }
        let Some(spec) = schema.field(&name) else {
            continue;
        };
        let decoded = FieldValue::decode(spec.kind, &value).map_err(|e| RomError::Encoding {
            namespace: ns.as_str().to_string(),
            field: name.clone(),
            reason: e.to_string(),
        })?;
        fields.insert(name, decoded);
    }
    // A `Boolean(false)` field has no persisted form (§3), so its absence
    // from the hash must decode back to `false` rather than "missing".
    for spec in schema.fields {
        if spec.kind == FieldKind::Boolean && !fields.contains_key(spec.name) {
            fields.insert(spec.name.to_string(), FieldValue::Boolean(false));
        }
    }
    Ok(Some(fields))
}

/// Load record `id` of model `M`, if it exists.
pub fn get<S: BackingStore, M: Model>(store: &S, id: u64) -> RomResult<Option<M>> {
    let schema = M::schema();
    let ns = namespace_for(schema)?;
    match decode_record(store, &ns, schema, id)? {
        Some(fields) => {
            let mut model = M::from_fields(id, fields.clone())?;
            model.set_loaded_snapshot(fields);
            Ok(Some(model))
        }
        None => Ok(None),
    }
}

/// Load every record of model `M` whose `field` carries `value` — an
/// exact lookup via the unique index (if `field` is unique) or the
/// field's inverted/scored index otherwise.
pub fn get_by<S: BackingStore, M: Model>(
    store: &S,
    field: &str,
    value: &FieldValue,
) -> RomResult<Vec<M>> {
    let schema = M::schema();
    let spec = schema
        .field(field)
        .ok_or_else(|| RomError::InvalidColumn {
            namespace: schema.namespace.to_string(),
            field: field.to_string(),
        })?;
    let ns = namespace_for(schema)?;

    let ids: Vec<u64> = if spec.unique {
        let encoded = value.encode().unwrap_or_default();
        let uidx_key = ns.unique_index_key(field);
        store
            .hget(&uidx_key, &encoded)
            .map_err(|e| RomError::Backend(e.to_string()))?
            .and_then(|raw| raw.parse().ok())
            .into_iter()
            .collect()
    } else {
        let keygen = spec.keygen.ok_or_else(|| RomError::QueryError {
            namespace: schema.namespace.to_string(),
            reason: format!("field {field} has no keygen and cannot be looked up"),
        })?;
        let idx = IndexStore::new(store, &ns);
        match keygen.apply(value) {
            Terms::Empty => Vec::new(),
            Terms::Set(terms) => {
                let mut ids = Vec::new();
                for term in terms {
                    ids.extend(
                        idx.members(field, &term)
                            .map_err(|e| RomError::Backend(e.to_string()))?,
                    );
                }
                ids.sort_unstable();
                ids.dedup();
                ids
            }
            Terms::Scored(score) => idx
                .range_scored(field, score, score)
                .map_err(|e| RomError::Backend(e.to_string()))?,
        }
    };

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(m) = get::<S, M>(store, id)? {
            out.push(m);
        }
    }
    Ok(out)
}

/// Create or overwrite `model`: allocates a primary key on first save,
/// otherwise sends the field values the caller's own [`Model::loaded_snapshot`]
/// last saw persisted as the write's optimistic race check (§4.4 step 1,
/// §5). A model that was never loaded (freshly constructed, never
/// `get`-ed) races against nothing, matching a first-write-wins insert.
pub fn save<S: BackingStore, M: Model>(store: &S, model: &mut M) -> RomResult<()> {
    let schema = M::schema();
    let ns = namespace_for(schema)?;
    let fields = engine_fields(schema);
    let geo = engine_geo(schema);
    let writer = Writer::with_geo(store, ns.clone(), &fields, &geo);

    let new_values = model.to_fields();
    let id = match model.id() {
        Some(id) => id,
        None => writer.next_id()?,
    };
    let old_values = model.loaded_snapshot().cloned().unwrap_or_default();

    writer.save(id, &old_values, &new_values)?;
    model.set_id(id);
    model.set_loaded_snapshot(new_values);
    Ok(())
}

/// Delete `model` and every index entry its manifest names.
pub fn delete<S: BackingStore, M: Model>(store: &S, model: &M) -> RomResult<()> {
    let schema = M::schema();
    let ns = namespace_for(schema)?;
    let id = model.id().ok_or_else(|| RomError::QueryError {
        namespace: schema.namespace.to_string(),
        reason: "cannot delete a model that was never saved".to_string(),
    })?;
    let old_values = decode_record(store, &ns, schema, id)?.unwrap_or_default();
    let fields = engine_fields(schema);
    let geo = engine_geo(schema);
    let writer = Writer::with_geo(store, ns, &fields, &geo);
    writer.delete(id, &old_values)?;
    Ok(())
}
