//! Key-generation, indexing, write-time atomicity, query planning/execution,
//! and pattern scanning for the `rom` engine.
//!
//! This crate is where the seven core components (§2, C1–C7) live, plus the
//! entity-lock primitive (§5, §9) the write path's optimistic concurrency
//! discipline explicitly calls out as an optional collaborator:
//!
//! - [`codec`] (re-exported from `rom_core`): the prefix/suffix score codec.
//! - [`keygen`]: the built-in key-generators (C2).
//! - [`index`]: read-only typed probes over a model's indexes (C3).
//! - [`writer`]: the atomic write-request builder and dispatcher (C4).
//! - [`scanner`]: the prefix/suffix/pattern ZSET scan (C7).
//! - [`planner`]: filter-atom cost estimation and reordering (C5).
//! - [`executor`]: plan execution, pagination, and result caching (C6).
//! - [`lock`]: SET-if-absent-with-TTL entity locking for callers needing
//!   mutual exclusion across multiple writes.

#![warn(missing_docs)]

pub mod executor;
pub mod index;
pub mod keygen;
pub mod lock;
pub mod planner;
pub mod scanner;
pub mod writer;

pub use rom_core::codec;

pub use index::IndexStore;
pub use keygen::{Keygen, Terms};
pub use lock::{EntityLock, LockError, LockHandle};
pub use planner::{FilterAtom, Plan, PlannedAtom};
pub use writer::{FieldSpec, GeoSpec, SaveOutcome, Writer};
