//! The [`Model`] trait: the one thing a caller implements to get
//! `save`/`delete`/`get`/`get_by` and [`crate::query::Query`] for a type.

use crate::schema::ModelSchema;
use rom_core::error::RomResult;
use rom_core::value::FieldMap;

/// A type backed by one namespace in the store.
///
/// Implementations are ordinary structs; there is no derive or macro
/// here (§4.9: "static, explicit ... declaration"). `to_fields`/
/// `from_fields` are the only places a model's Rust shape meets the
/// engine's [`FieldMap`] wire shape.
pub trait Model: Sized {
    /// This type's static schema.
    fn schema() -> &'static ModelSchema;

    /// The record's primary key, if it has been assigned one (i.e. the
    /// model has been saved at least once).
    fn id(&self) -> Option<u64>;

    /// Record the primary key a successful [`crate::ops::save`] assigned.
    fn set_id(&mut self, id: u64);

    /// Render this model's current state to its field map.
    fn to_fields(&self) -> FieldMap;

    /// Reconstruct a model from its primary key and decoded field map.
    fn from_fields(id: u64, fields: FieldMap) -> RomResult<Self>;

    /// The field values this instance last saw persisted — what [`crate::ops::get`]
    /// decoded it from, or what [`crate::ops::save`] just committed. `None`
    /// for a model that has never been loaded or saved.
    ///
    /// `save` sends this, not a fresh read of the store, as the "old
    /// values" of its optimistic race check (§4.4, §5): the race is
    /// between what the caller believes is there and what is actually
    /// there, not between the store and itself.
    fn loaded_snapshot(&self) -> Option<&FieldMap>;

    /// Replace the loaded-snapshot `loaded_snapshot` returns. Called by
    /// `get` after a decode and by `save` after a successful commit.
    fn set_loaded_snapshot(&mut self, fields: FieldMap);
}
