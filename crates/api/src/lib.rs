//! Model/Query facade over the `rom` indexing engine (§4.9, C9).
//!
//! This crate is intentionally thin: every piece of index/unique/race
//! logic lives in [`rom_engine`], and this crate only translates between
//! a caller's static [`schema::ModelSchema`] declaration and the typed
//! engine collaborators (`Writer`, `IndexStore`, the planner/executor).
//! It does not implement relationship-traversal sugar, per-thread
//! identity-map sessions, or a declaration macro — those stay out of
//! scope.
//!
//! - [`schema`]: static `FieldSpec` / `ModelSchema` declaration.
//! - [`model`]: the `Model` trait a caller implements once per type.
//! - [`ops`]: `save` / `delete` / `get` / `get_by` free functions.
//! - [`query`]: the `Query` builder over the planner/executor.

#![warn(missing_docs)]

pub mod model;
pub mod ops;
pub mod query;
pub mod schema;

pub use model::Model;
pub use ops::{delete, get, get_by, save};
pub use query::Query;
pub use schema::{FieldSpec, GeoFieldSpec, ModelSchema};
