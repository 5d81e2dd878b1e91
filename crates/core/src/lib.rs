//! Shared types for the `rom` indexing and query-execution engine.
//!
//! This crate defines the vocabulary every other crate in the workspace
//! builds on:
//! - [`error`]: the unified `RomError` / `RomResult` error taxonomy
//! - [`value`]: the typed field-value model persisted in record hashes
//! - [`manifest`]: the per-record index manifest (the "what must be
//!   cleaned up" ledger described by the write-time protocol)
//! - [`namespace`]: key-space naming and validation
//! - [`limits`]: size limits enforced before anything reaches the backend
//! - [`codec`]: the prefix/suffix sortable-score encoding shared by the
//!   backend's index emission and the engine's scanner

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod limits;
pub mod manifest;
pub mod namespace;
pub mod value;

pub use error::{RomError, RomResult};
pub use limits::Limits;
pub use manifest::IndexManifest;
pub use namespace::Namespace;
pub use value::{DecodeError, FieldKind, FieldMap, FieldValue, FIELD_DELETED_SENTINEL};
