//! `rom`: an entity-mapping and secondary-indexing engine over a
//! Redis-like key-value store.
//!
//! This top-level crate is a thin re-export of the workspace's four
//! layers, so a caller can depend on `rom` alone instead of naming each
//! crate:
//!
//! - [`rom_core`] — shared vocabulary: field values, the index manifest,
//!   namespace/key naming, the error taxonomy.
//! - [`rom_backend`] — the backing-store contract and its in-memory
//!   reference implementation.
//! - [`rom_engine`] — key-generators, the atomic writer, the query
//!   planner/executor, the prefix/suffix/pattern scanner, and the entity
//!   lock.
//! - [`rom_api`] — the `Model`/`Query` facade most callers want: `save`,
//!   `delete`, `get`, `get_by`, and the `Query` builder.
//!
//! ```no_run
//! use rom::{Model, Query, save, get};
//! use rom::backend::InMemoryBackend;
//! use rom::core::value::{FieldMap, FieldValue};
//!
//! struct User { id: Option<u64>, email: String, snapshot: Option<FieldMap> }
//!
//! impl Model for User {
//!     fn schema() -> &'static rom::ModelSchema { unimplemented!() }
//!     fn id(&self) -> Option<u64> { self.id }
//!     fn set_id(&mut self, id: u64) { self.id = Some(id); }
//!     fn to_fields(&self) -> FieldMap {
//!         let mut f = FieldMap::new();
//!         f.insert("email".into(), FieldValue::Text(self.email.clone()));
//!         f
//!     }
//!     fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
//!         let email = match f.remove("email") {
//!             Some(FieldValue::Text(v)) => v,
//!             _ => String::new(),
//!         };
//!         Ok(User { id: Some(id), email, snapshot: None })
//!     }
//!     fn loaded_snapshot(&self) -> Option<&FieldMap> { self.snapshot.as_ref() }
//!     fn set_loaded_snapshot(&mut self, f: FieldMap) { self.snapshot = Some(f); }
//! }
//!
//! let be = InMemoryBackend::default();
//! let mut user = User { id: None, email: "a@b.com".to_string(), snapshot: None };
//! save(&be, &mut user)?;
//! let _ = get::<InMemoryBackend, User>(&be, user.id().unwrap())?;
//! # Ok::<(), rom::core::error::RomError>(())
//! ```

#![warn(missing_docs)]

/// Shared types: field values, index manifest, namespace naming, errors.
pub use rom_core as core;

/// The backing-store contract and in-memory reference implementation.
pub use rom_backend as backend;

/// Key-generators, atomic writer, query planner/executor, scanner, lock.
pub use rom_engine as engine;

pub use rom_api::*;
