//! Index Store (§4.3, C3): typed, read-only probes over the index keys a
//! [`rom_backend::BackingStore`] maintains.
//!
//! Every method here is a thin, typed wrapper over one or two primitive
//! backend calls — mutation is funneled exclusively through
//! [`crate::writer::Writer`] (§4.3: "All operations are read-only;
//! mutation is funneled through C4").

use rom_backend::{BackendResult, BackingStore, GeoMatch, GeoUnit};
use rom_core::codec::prefix_score;
use rom_core::namespace::Namespace;

/// One hit from [`IndexStore::prefix_scan`] / suffix scan: the matching
/// record id.
pub type ScanHit = u64;

/// Read-only accessor over one model's secondary indexes.
pub struct IndexStore<'a, S: BackingStore> {
    store: &'a S,
    ns: &'a Namespace,
}

impl<'a, S: BackingStore> IndexStore<'a, S> {
    /// Borrow an index store for `ns` backed by `store`.
    pub fn new(store: &'a S, ns: &'a Namespace) -> Self {
        IndexStore { store, ns }
    }

    /// Cardinality of a field's scored index (no term) or a tagged set
    /// index (`Some(term)`).
    pub fn card(&self, field: &str, term: Option<&str>) -> BackendResult<u64> {
        match term {
            Some(term) => self.store.scard(&self.ns.set_index_key(field, term)),
            None => self.store.zcard(&self.ns.scored_index_key(field)),
        }
    }

    /// Ids whose scored index entry for `field` falls in `[lo, hi]`.
    pub fn range_scored(&self, field: &str, lo: f64, hi: f64) -> BackendResult<Vec<u64>> {
        let key = self.ns.scored_index_key(field);
        let hits = self.store.zrange_by_score(&key, lo, hi)?;
        Ok(hits.into_iter().filter_map(|(m, _)| m.parse().ok()).collect())
    }

    /// Ids recorded under `(field, term)` in the inverted (set) index.
    pub fn members(&self, field: &str, term: &str) -> BackendResult<Vec<u64>> {
        let key = self.ns.set_index_key(field, term);
        let hits = self.store.smembers(&key)?;
        Ok(hits.into_iter().filter_map(|m| m.parse().ok()).collect())
    }

    /// Ids whose `field` value literally starts with `prefix`, read from
    /// the field's prefix ZSET via a score-bounded window (§4.7).
    pub fn prefix_scan(&self, field: &str, prefix: &str) -> BackendResult<Vec<ScanHit>> {
        crate::scanner::scan_literal(self.store, &self.ns.prefix_index_key(field), prefix, false)
    }

    /// Ids whose `field` value literally ends with `suffix`, read from the
    /// field's suffix ZSET (the same scan over the reversed term).
    pub fn suffix_scan(&self, field: &str, suffix: &str) -> BackendResult<Vec<ScanHit>> {
        let reversed: String = suffix.chars().rev().collect();
        crate::scanner::scan_literal(self.store, &self.ns.suffix_index_key(field), &reversed, true)
    }

    /// Ids whose `field` value matches the glob `pattern` (§6: pattern
    /// syntax `?`/`*`/`+`/`!`).
    pub fn pattern_scan(&self, field: &str, pattern: &str) -> BackendResult<Vec<ScanHit>> {
        crate::scanner::scan_pattern(self.store, &self.ns.prefix_index_key(field), pattern)
    }

    /// Ids within `radius` (in `unit`) of `(lon, lat)` in the named geo
    /// index, nearest-first, optionally capped at `count`.
    pub fn geo_within(
        &self,
        name: &str,
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
        count: Option<u64>,
    ) -> BackendResult<Vec<GeoMatch>> {
        let key = self.ns.geo_index_key(name);
        self.store.georadius(&key, lon, lat, radius, unit, count)
    }

    /// Approximate cardinality of a named geo index, used only by the
    /// planner's `estimate_work` (§4.5) — the backing-store contract has
    /// no dedicated geo cardinality primitive, so this reuses
    /// `GEORADIUS` with an effectively unbounded radius.
    pub fn geo_card(&self, name: &str) -> BackendResult<u64> {
        let key = self.ns.geo_index_key(name);
        let hits = self
            .store
            .georadius(&key, 0.0, 0.0, f64::MAX, GeoUnit::Meters, None)?;
        Ok(hits.len() as u64)
    }

    /// Estimated window size of a prefix/suffix scan between `prefix`
    /// and its `next` bound — used by the planner's `estimate_work`
    /// (§4.5) without performing the full scan.
    pub fn estimate_prefix_window(&self, field: &str, prefix: &str) -> BackendResult<u64> {
        let key = self.ns.prefix_index_key(field);
        let lo = prefix_score(prefix, false);
        let hi = prefix_score(prefix, true);
        let hits = self.store.zrange_by_score(&key, lo, hi)?;
        Ok(hits.len() as u64)
    }
}
