//! Error taxonomy for the `rom` indexing engine.
//!
//! `RomError` is the single error type returned by every fallible operation
//! in the workspace. Each variant corresponds to one of the error kinds
//! named in the write/query protocol:
//!
//! - [`RomError::UniqueViolation`] / [`RomError::DataRace`] /
//!   [`RomError::EntityDeleted`] are *recoverable*: the caller may retry
//!   after refreshing its view of the record.
//! - [`RomError::InvalidColumn`], [`RomError::MissingColumn`],
//!   [`RomError::QueryError`] and [`RomError::ColumnError`] are programming
//!   errors, raised before any mutation is attempted.
//! - [`RomError::Restrict`] is raised by a referential-integrity check that
//!   lives outside this crate; the core only needs to be able to carry it.
//! - [`RomError::Backend`] wraps connectivity/script failures from the
//!   backing store and is never constructed by the core itself.

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type RomResult<T> = std::result::Result<T, RomError>;

/// Unified error type for the `rom` indexing and query-execution engine.
#[derive(Debug, Error)]
pub enum RomError {
    /// A unique constraint rejected the write. Carries the namespace,
    /// field (or composite field name), and the attempted encoded value.
    #[error("unique constraint violation on {namespace}:{field} for value {value:?}")]
    UniqueViolation {
        /// Namespace (model name) the constraint belongs to.
        namespace: String,
        /// Field name, or composite-constraint name for multi-column
        /// uniques.
        field: String,
        /// The encoded value that collided with an existing entry.
        value: String,
    },

    /// The record was modified by another writer between read and write.
    /// Carries the names of every field whose expected old value no
    /// longer matched.
    #[error("data race on {namespace}:{id}, contended fields: {fields:?}")]
    DataRace {
        /// Namespace (model name) of the contended record.
        namespace: String,
        /// Primary key of the contended record.
        id: u64,
        /// Field names that changed under the writer.
        fields: Vec<String>,
    },

    /// Special case of [`RomError::DataRace`]: the primary-key field
    /// itself no longer matched, meaning another writer deleted the
    /// record.
    #[error("entity {namespace}:{id} was deleted by another writer")]
    EntityDeleted {
        /// Namespace (model name) of the deleted record.
        namespace: String,
        /// Primary key of the deleted record.
        id: u64,
    },

    /// A field value failed its type check before any write was
    /// attempted.
    #[error("invalid value for column {namespace}:{field}: {reason}")]
    InvalidColumn {
        /// Namespace (model name).
        namespace: String,
        /// Offending field name.
        field: String,
        /// Human-readable reason the value failed validation.
        reason: String,
    },

    /// A required field was absent at record construction.
    #[error("missing required column {namespace}:{field}")]
    MissingColumn {
        /// Namespace (model name).
        namespace: String,
        /// Missing field name.
        field: String,
    },

    /// A query filter referenced an unindexed field, supplied a range
    /// with the wrong arity, or used endpoints of the wrong type.
    #[error("query error on {namespace}: {reason}")]
    QueryError {
        /// Namespace (model name) being queried.
        namespace: String,
        /// Human-readable reason the query is invalid.
        reason: String,
    },

    /// Deleting this record would violate a referential-integrity
    /// "restrict" rule declared on a foreign-key-like relation. The
    /// relation logic itself lives outside this crate; the core only
    /// raises the condition when asked to.
    #[error("delete of {namespace}:{id} restricted by relation {relation}")]
    Restrict {
        /// Namespace (model name) of the record being deleted.
        namespace: String,
        /// Primary key of the record being deleted.
        id: u64,
        /// Name of the relation that forbids the delete.
        relation: String,
    },

    /// Invalid model declaration, e.g. a duplicate unique constraint.
    #[error("invalid model declaration for {namespace}: {reason}")]
    ColumnError {
        /// Namespace (model name).
        namespace: String,
        /// Human-readable reason the declaration is invalid.
        reason: String,
    },

    /// The backing store rejected or failed to execute a command.
    /// Connectivity errors propagate unwrapped through this variant.
    #[error("backend error: {0}")]
    Backend(String),

    /// A value could not be encoded to or decoded from its persisted
    /// string form.
    #[error("encoding error for {namespace}:{field}: {reason}")]
    Encoding {
        /// Namespace (model name).
        namespace: String,
        /// Field name.
        field: String,
        /// Human-readable reason the encode/decode failed.
        reason: String,
    },
}

impl RomError {
    /// True for [`RomError::UniqueViolation`] and [`RomError::DataRace`]
    /// (including [`RomError::EntityDeleted`]) — conditions the caller may
    /// recover from by refreshing and retrying, as opposed to programming
    /// errors that are never worth retrying verbatim.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RomError::UniqueViolation { .. }
                | RomError::DataRace { .. }
                | RomError::EntityDeleted { .. }
        )
    }

    /// True for [`RomError::DataRace`] and [`RomError::EntityDeleted`].
    pub fn is_data_race(&self) -> bool {
        matches!(
            self,
            RomError::DataRace { .. } | RomError::EntityDeleted { .. }
        )
    }
}
