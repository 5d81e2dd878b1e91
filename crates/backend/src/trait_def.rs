//! The backing-store contract (§6).
//!
//! `rom` assumes access to a data store providing hashes, sets, sorted
//! sets, a geo index built on sorted sets, and atomic server-side
//! scripting. [`BackingStore`] is the Rust encoding of that contract: one
//! method per primitive command, plus [`BackingStore::execute_write`],
//! which is the single indivisible script described in §4.4 — in a real
//! deployment this is what gets handed to `EVAL`; [`crate::mem::InMemoryBackend`]
//! instead runs it under a per-namespace lock.

use crate::error::BackendError;
use rom_core::namespace::Namespace;

/// Result type alias for [`BackingStore`] operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Units accepted by geo radius queries (§6: "Geo units").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoUnit {
    /// Meters.
    Meters,
    /// Kilometers.
    Kilometers,
    /// Miles.
    Miles,
    /// Feet.
    Feet,
}

impl GeoUnit {
    /// Parse from the short unit strings the query API accepts.
    pub fn parse(s: &str) -> Option<GeoUnit> {
        match s {
            "m" => Some(GeoUnit::Meters),
            "km" => Some(GeoUnit::Kilometers),
            "mi" => Some(GeoUnit::Miles),
            "ft" => Some(GeoUnit::Feet),
            _ => None,
        }
    }

    /// Meters per one unit of this kind.
    pub fn meters_per_unit(self) -> f64 {
        match self {
            GeoUnit::Meters => 1.0,
            GeoUnit::Kilometers => 1000.0,
            GeoUnit::Miles => 1609.344,
            GeoUnit::Feet => 0.3048,
        }
    }
}

/// One hit from a geo radius query: the member id and its distance from
/// the query point, in the unit the caller requested.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    /// The matching record id, as stored (member string, typically a
    /// decimal primary key).
    pub member: String,
    /// Distance from the query point, in the requested unit.
    pub distance: f64,
}

/// A single atomic write request: the Rust encoding of every argument the
/// §4.4 script takes.
#[derive(Debug, Clone, Default)]
pub struct WriteRequest {
    /// Namespace (model name) being written.
    pub namespace: String,
    /// Primary key of the record being written.
    pub id: u64,
    /// `(field, new_encoded_value)` pairs to commit into that field's
    /// unique-index hash, rejecting if another id already holds the
    /// value.
    pub unique_new: Vec<(String, String)>,
    /// `(field, old_encoded_value)` pairs to remove from the unique
    /// index, but only if the mapping still points at this id.
    pub unique_deleted: Vec<(String, String)>,
    /// Field names to `HDEL` from the record hash.
    pub field_deletions: Vec<String>,
    /// `(field, new_encoded_value)` pairs to `HSET` on the record hash.
    pub field_updates: Vec<(String, String)>,
    /// New set-index terms: `(field, term)`.
    pub set_terms: Vec<(String, String)>,
    /// New scored-index entries: `(field, score)`.
    pub scored_terms: Vec<(String, f64)>,
    /// New prefix-index entries: `(field, term)`.
    pub prefix_terms: Vec<(String, String)>,
    /// New suffix-index entries: `(field, term)`.
    pub suffix_terms: Vec<(String, String)>,
    /// New geo-index entries: `(index_name, longitude, latitude)`.
    pub geo_terms: Vec<(String, f64, f64)>,
    /// `(field, expected_encoded_value)` pairs read from the caller's
    /// last-known state; the write aborts if any current value differs.
    /// `None` means the caller expected the field to be absent.
    pub race_check: Vec<(String, Option<String>)>,
    /// True if this write is a deletion: cleanup runs, the record hash
    /// and manifest are removed, and no new index entries are emitted.
    pub is_delete: bool,
}

/// Outcome of [`BackingStore::execute_write`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The write succeeded; carries the number of index/hash mutations
    /// applied.
    Changed(u64),
    /// A unique constraint rejected the write. Carries the offending
    /// field name.
    Unique { field: String },
    /// The record changed under the writer. Carries the names of every
    /// field whose expected old value no longer matched.
    Race { fields: Vec<String> },
}

/// The backing-store contract §6 describes: hashes, sets, sorted sets, a
/// geo index, and one atomic composite write.
///
/// All methods are read/write primitives on raw key strings; namespacing
/// and key-shape concerns live in [`rom_core::namespace::Namespace`], one
/// layer up. Implementations must be `Send + Sync` — the planner and
/// executor may call into the store from multiple concurrent requests.
pub trait BackingStore: Send + Sync {
    // -- strings / counters ------------------------------------------------

    /// Atomically increment the counter at `key` by one and return the new
    /// value. Used for the per-model primary-key counter.
    fn incr(&self, key: &str) -> BackendResult<u64>;

    // -- hashes --------------------------------------------------------

    /// `HGET key field`.
    fn hget(&self, key: &str, field: &str) -> BackendResult<Option<String>>;
    /// `HSET key field value`.
    fn hset(&self, key: &str, field: &str, value: &str) -> BackendResult<()>;
    /// `HMGET key fields...`.
    fn hmget(&self, key: &str, fields: &[String]) -> BackendResult<Vec<Option<String>>>;
    /// `HDEL key field`.
    fn hdel(&self, key: &str, field: &str) -> BackendResult<bool>;
    /// `HGETALL key`.
    fn hgetall(&self, key: &str) -> BackendResult<Vec<(String, String)>>;
    /// `HEXISTS key field`.
    fn hexists(&self, key: &str, field: &str) -> BackendResult<bool>;
    /// `HLEN key`.
    fn hlen(&self, key: &str) -> BackendResult<u64>;

    // -- sets ------------------------------------------------------------

    /// `SADD key member`.
    fn sadd(&self, key: &str, member: &str) -> BackendResult<()>;
    /// `SREM key member`.
    fn srem(&self, key: &str, member: &str) -> BackendResult<()>;
    /// `SISMEMBER key member`.
    fn sismember(&self, key: &str, member: &str) -> BackendResult<bool>;
    /// `SCARD key`.
    fn scard(&self, key: &str) -> BackendResult<u64>;
    /// `SMEMBERS key`.
    fn smembers(&self, key: &str) -> BackendResult<Vec<String>>;

    // -- sorted sets -----------------------------------------------------

    /// `ZADD key score member`.
    fn zadd(&self, key: &str, member: &str, score: f64) -> BackendResult<()>;
    /// `ZREM key member`.
    fn zrem(&self, key: &str, member: &str) -> BackendResult<()>;
    /// `ZCARD key`.
    fn zcard(&self, key: &str) -> BackendResult<u64>;
    /// `ZRANK key member` — 0-based rank in ascending score order.
    fn zrank(&self, key: &str, member: &str) -> BackendResult<Option<u64>>;
    /// `ZRANGE key start stop` — members in ascending score order, with
    /// negative indices counting from the end (`-1` = last).
    fn zrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>>;
    /// `ZRANGEBYSCORE key min max` — members with `min <= score <= max`,
    /// ascending by score, in member order for ties.
    fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> BackendResult<Vec<(String, f64)>>;
    /// `ZREVRANGEBYSCORE key max min` — same window as
    /// [`BackingStore::zrange_by_score`], descending by score.
    fn zrevrange_by_score(
        &self,
        key: &str,
        max: f64,
        min: f64,
    ) -> BackendResult<Vec<(String, f64)>>;
    /// `ZREMRANGEBYSCORE key min max`.
    fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> BackendResult<()>;
    /// `ZUNIONSTORE dest {(src, weight)...}` — union of the sources into
    /// `dest`, summing weighted scores for members present in more than
    /// one source. Always overwrites `dest`.
    fn zunionstore(&self, dest: &str, sources: &[(String, f64)]) -> BackendResult<()>;
    /// `ZINTERSTORE dest {(src, weight)...}` — intersection of the sources
    /// into `dest`, summing weighted scores. Always overwrites `dest`.
    fn zinterstore(&self, dest: &str, sources: &[(String, f64)]) -> BackendResult<()>;

    // -- geo ---------------------------------------------------------------

    /// `GEOADD key member lon lat`.
    fn geoadd(&self, key: &str, member: &str, lon: f64, lat: f64) -> BackendResult<()>;
    /// `GEORADIUS key lon lat radius unit [COUNT count] STOREDIST` —
    /// members within `radius` of `(lon, lat)`, sorted nearest-first.
    fn georadius(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
        count: Option<u64>,
    ) -> BackendResult<Vec<GeoMatch>>;

    // -- keys --------------------------------------------------------------

    /// `DEL key`.
    fn del(&self, key: &str) -> BackendResult<()>;
    /// `EXISTS key`.
    fn exists(&self, key: &str) -> BackendResult<bool>;
    /// `EXPIRE key ttl_secs` — sets a relative TTL on a cached result key.
    fn expire(&self, key: &str, ttl_secs: u64) -> BackendResult<()>;
    /// `KEYS pattern` — every key (of any primitive type) whose name
    /// matches `pattern`'s `*`/`?` shell-style glob. A debug/admin
    /// primitive (e.g. enumerating a namespace's record keys before a
    /// bulk re-index); never called by the write or query path itself.
    fn keys(&self, pattern: &str) -> BackendResult<Vec<String>>;

    /// `SET key value NX EX ttl_secs` — sets `key` to `value` only if
    /// absent, with a relative TTL. Returns `false` without writing
    /// anything if `key` was already present. The primitive
    /// [`crate::trait_def`]'s entity-lock acquisition is built on.
    fn set_nx(&self, key: &str, value: &str, ttl_secs: u64) -> BackendResult<bool>;

    /// Compare-and-delete: removes `key` only if its current value equals
    /// `expected_value`, returning whether the removal happened. The
    /// compare-and-delete a real deployment would express as a tiny Lua
    /// script (`if redis.call("get", key) == expected then redis.call("del",
    /// key) end`) to release an entity lock without risking deleting a
    /// different holder's lock acquired after this one's TTL expired.
    fn delete_if_matches(&self, key: &str, expected_value: &str) -> BackendResult<bool>;

    // -- atomic composite script --------------------------------------------

    /// Execute the §4.4 write script atomically: race check, unique
    /// precheck/commit/removal, field mutation, manifest-driven index
    /// cleanup, and (unless `is_delete`) new index emission and manifest
    /// write. See [`WriteRequest`] / [`WriteOutcome`].
    fn execute_write(&self, ns: &Namespace, req: WriteRequest) -> BackendResult<WriteOutcome>;
}
