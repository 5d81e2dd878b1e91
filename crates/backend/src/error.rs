//! Backend-local error type.
//!
//! Kept separate from [`rom_core::RomError`] so this crate has no upward
//! dependency on the engine's error taxonomy; `rom-engine` converts
//! [`BackendError`] into `RomError::Backend` at its own boundary.

use thiserror::Error;

/// Errors raised by a [`crate::BackingStore`] implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A key already holds a value of a different primitive type than the
    /// operation expects. The in-memory backend partitions hashes, sets,
    /// and sorted sets into separate namespaces so this can never actually
    /// fire there; it exists for a real key-value-backed implementation
    /// where all primitives share one keyspace.
    #[error("wrong type for key {key}: expected {expected}")]
    WrongType {
        /// The offending key.
        key: String,
        /// The type the caller expected.
        expected: &'static str,
    },
    /// The manifest stored on a record failed to decode.
    #[error("corrupt manifest for {namespace}:{id}: {reason}")]
    CorruptManifest {
        /// Namespace of the record.
        namespace: String,
        /// Primary key of the record.
        id: u64,
        /// Decode failure reason.
        reason: String,
    },
    /// Connectivity or I/O failure talking to the backing store. The
    /// in-memory reference implementation never raises this; it exists
    /// for real network-backed implementations.
    #[error("backend connectivity error: {0}")]
    Connectivity(String),
}
