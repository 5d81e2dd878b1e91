//! An in-process reference implementation of [`BackingStore`].
//!
//! Grounded in the teacher workspace's storage layer
//! (`strata-storage::sharded`): a `DashMap` keyed by shard name gives
//! lock-free routing to the right partition, and each partition is then a
//! `parking_lot::Mutex`-guarded bundle of the primitive collections. The
//! difference from the teacher's shard is the partitioning key: there it
//! is a `BranchId` for agent isolation, here it is the namespace prefix of
//! the key being touched — every key this engine ever constructs begins
//! with `<namespace>:`, so routing on that prefix gives exactly the
//! isolation the §4.4 atomic write needs (every key one write touches
//! lives in the same namespace, so locking one shard for the call's
//! duration is equivalent to the single indivisible server-side script a
//! real deployment would use).

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::trait_def::{BackendResult, BackingStore, GeoMatch, GeoUnit, WriteOutcome, WriteRequest};
use crate::zset::ZSet;
use dashmap::DashMap;
use parking_lot::Mutex;
use rom_core::manifest::{IndexManifest, MANIFEST_FIELD};
use rom_core::namespace::Namespace;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Default)]
struct Shard {
    counters: FxHashMap<String, u64>,
    hashes: FxHashMap<String, BTreeMap<String, String>>,
    sets: FxHashMap<String, std::collections::BTreeSet<String>>,
    zsets: FxHashMap<String, ZSet>,
    geo: FxHashMap<String, FxHashMap<String, (f64, f64)>>,
    strings: FxHashMap<String, String>,
    expire_at: FxHashMap<String, Instant>,
}

impl Shard {
    fn expired(&self, key: &str) -> bool {
        matches!(self.expire_at.get(key), Some(at) if Instant::now() >= *at)
    }

    fn sweep(&mut self, key: &str) {
        if self.expired(key) {
            self.hashes.remove(key);
            self.sets.remove(key);
            self.zsets.remove(key);
            self.geo.remove(key);
            self.strings.remove(key);
            self.expire_at.remove(key);
        }
    }
}

/// An in-memory [`BackingStore`]: one process, no durability, no network —
/// the reference implementation every unit and integration test in this
/// workspace runs against.
pub struct InMemoryBackend {
    shards: DashMap<String, Arc<Mutex<Shard>>>,
    config: BackendConfig,
}

impl InMemoryBackend {
    /// Create a new, empty backend with the given configuration.
    pub fn new(config: BackendConfig) -> Self {
        InMemoryBackend {
            shards: DashMap::new(),
            config,
        }
    }

    /// This backend's configuration — callers that don't want to pick an
    /// explicit TTL for a cached query or an entity lock read the
    /// configured defaults from here.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn shard_name(key: &str) -> &str {
        key.split(':').next().unwrap_or(key)
    }

    fn shard(&self, key: &str) -> Arc<Mutex<Shard>> {
        self.shards
            .entry(Self::shard_name(key).to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Shard::default())))
            .clone()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        InMemoryBackend::new(BackendConfig::default())
    }
}

impl BackingStore for InMemoryBackend {
    fn incr(&self, key: &str) -> BackendResult<u64> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        let counter = shard.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn hget(&self, key: &str, field: &str) -> BackendResult<Option<String>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard.hashes.get(key).and_then(|h| h.get(field).cloned()))
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        shard
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hmget(&self, key: &str, fields: &[String]) -> BackendResult<Vec<Option<String>>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        let hash = shard.hashes.get(key);
        Ok(fields
            .iter()
            .map(|f| hash.and_then(|h| h.get(f).cloned()))
            .collect())
    }

    fn hdel(&self, key: &str, field: &str) -> BackendResult<bool> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .hashes
            .get_mut(key)
            .map(|h| h.remove(field).is_some())
            .unwrap_or(false))
    }

    fn hgetall(&self, key: &str) -> BackendResult<Vec<(String, String)>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .hashes
            .get(key)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn hexists(&self, key: &str, field: &str) -> BackendResult<bool> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .hashes
            .get(key)
            .map(|h| h.contains_key(field))
            .unwrap_or(false))
    }

    fn hlen(&self, key: &str) -> BackendResult<u64> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard.hashes.get(key).map(|h| h.len() as u64).unwrap_or(0))
    }

    fn sadd(&self, key: &str, member: &str) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        shard
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    fn srem(&self, key: &str, member: &str) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        if let Some(set) = shard.sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    fn sismember(&self, key: &str, member: &str) -> BackendResult<bool> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .sets
            .get(key)
            .map(|s| s.contains(member))
            .unwrap_or(false))
    }

    fn scard(&self, key: &str) -> BackendResult<u64> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard.sets.get(key).map(|s| s.len() as u64).unwrap_or(0))
    }

    fn smembers(&self, key: &str) -> BackendResult<Vec<String>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        shard.zsets.entry(key.to_string()).or_default().add(member, score);
        Ok(())
    }

    fn zrem(&self, key: &str, member: &str) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        if let Some(z) = shard.zsets.get_mut(key) {
            z.remove(member);
        }
        Ok(())
    }

    fn zcard(&self, key: &str) -> BackendResult<u64> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard.zsets.get(key).map(|z| z.card()).unwrap_or(0))
    }

    fn zrank(&self, key: &str, member: &str) -> BackendResult<Option<u64>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard.zsets.get(key).and_then(|z| z.rank(member)))
    }

    fn zrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .zsets
            .get(key)
            .map(|z| z.range(start, stop))
            .unwrap_or_default())
    }

    fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> BackendResult<Vec<(String, f64)>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .zsets
            .get(key)
            .map(|z| z.range_by_score(min, max))
            .unwrap_or_default())
    }

    fn zrevrange_by_score(
        &self,
        key: &str,
        max: f64,
        min: f64,
    ) -> BackendResult<Vec<(String, f64)>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard
            .zsets
            .get(key)
            .map(|z| z.revrange_by_score(max, min))
            .unwrap_or_default())
    }

    fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        if let Some(z) = shard.zsets.get_mut(key) {
            z.remrangebyscore(min, max);
        }
        Ok(())
    }

    fn zunionstore(&self, dest: &str, sources: &[(String, f64)]) -> BackendResult<()> {
        let shard = self.shard(dest);
        let mut shard = shard.lock();
        let mut acc: FxHashMap<String, f64> = FxHashMap::default();
        for (src, weight) in sources {
            shard.sweep(src);
            if let Some(z) = shard.zsets.get(src) {
                for (member, score) in z.sorted_ascending() {
                    *acc.entry(member).or_insert(0.0) += score * weight;
                }
            }
        }
        let mut dest_zset = ZSet::default();
        for (member, score) in acc {
            dest_zset.add(&member, score);
        }
        shard.zsets.insert(dest.to_string(), dest_zset);
        Ok(())
    }

    fn zinterstore(&self, dest: &str, sources: &[(String, f64)]) -> BackendResult<()> {
        let shard = self.shard(dest);
        let mut shard = shard.lock();
        let mut iter = sources.iter();
        let mut acc: Option<FxHashMap<String, f64>> = None;
        if let Some((first_key, first_weight)) = iter.next() {
            shard.sweep(first_key);
            let mut base: FxHashMap<String, f64> = FxHashMap::default();
            if let Some(z) = shard.zsets.get(first_key) {
                for (member, score) in z.sorted_ascending() {
                    base.insert(member, score * first_weight);
                }
            }
            for (src, weight) in iter {
                shard.sweep(src);
                let src_scores: FxHashMap<String, f64> = shard
                    .zsets
                    .get(src)
                    .map(|z| z.sorted_ascending().into_iter().collect())
                    .unwrap_or_default();
                base.retain(|member, score| {
                    if let Some(other) = src_scores.get(member) {
                        *score += other * weight;
                        true
                    } else {
                        false
                    }
                });
            }
            acc = Some(base);
        }
        let mut dest_zset = ZSet::default();
        for (member, score) in acc.unwrap_or_default() {
            dest_zset.add(&member, score);
        }
        shard.zsets.insert(dest.to_string(), dest_zset);
        Ok(())
    }

    fn geoadd(&self, key: &str, member: &str, lon: f64, lat: f64) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        shard
            .geo
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), (lon, lat));
        Ok(())
    }

    fn georadius(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
        count: Option<u64>,
    ) -> BackendResult<Vec<GeoMatch>> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        let meters_per_unit = unit.meters_per_unit();
        let radius_m = radius * meters_per_unit;
        let mut hits: Vec<GeoMatch> = shard
            .geo
            .get(key)
            .map(|points| {
                points
                    .iter()
                    .filter_map(|(member, (plon, plat))| {
                        let dist_m = haversine_meters(lon, lat, *plon, *plat);
                        if dist_m <= radius_m {
                            Some(GeoMatch {
                                member: member.clone(),
                                distance: dist_m / meters_per_unit,
                            })
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        if let Some(count) = count {
            hits.truncate(count as usize);
        }
        Ok(hits)
    }

    fn del(&self, key: &str) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.hashes.remove(key);
        shard.sets.remove(key);
        shard.zsets.remove(key);
        shard.geo.remove(key);
        shard.strings.remove(key);
        shard.expire_at.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        Ok(shard.hashes.contains_key(key)
            || shard.sets.contains_key(key)
            || shard.zsets.contains_key(key)
            || shard.geo.contains_key(key)
            || shard.strings.contains_key(key))
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> BackendResult<()> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard
            .expire_at
            .insert(key.to_string(), Instant::now() + Duration::from_secs(ttl_secs));
        Ok(())
    }

    fn keys(&self, pattern: &str) -> BackendResult<Vec<String>> {
        let mut out = Vec::new();
        for entry in self.shards.iter() {
            let mut shard = entry.value().lock();
            let candidates: std::collections::BTreeSet<String> = shard
                .hashes
                .keys()
                .chain(shard.sets.keys())
                .chain(shard.zsets.keys())
                .chain(shard.geo.keys())
                .chain(shard.strings.keys())
                .cloned()
                .collect();
            for key in candidates {
                shard.sweep(&key);
                let still_present = shard.hashes.contains_key(&key)
                    || shard.sets.contains_key(&key)
                    || shard.zsets.contains_key(&key)
                    || shard.geo.contains_key(&key)
                    || shard.strings.contains_key(&key);
                if still_present && glob_match(pattern, &key) {
                    out.push(key);
                }
            }
        }
        out.sort();
        Ok(out)
    }

    fn set_nx(&self, key: &str, value: &str, ttl_secs: u64) -> BackendResult<bool> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        if shard.strings.contains_key(key) {
            return Ok(false);
        }
        shard.strings.insert(key.to_string(), value.to_string());
        shard
            .expire_at
            .insert(key.to_string(), Instant::now() + Duration::from_secs(ttl_secs));
        Ok(true)
    }

    fn delete_if_matches(&self, key: &str, expected_value: &str) -> BackendResult<bool> {
        let shard = self.shard(key);
        let mut shard = shard.lock();
        shard.sweep(key);
        if shard.strings.get(key).map(String::as_str) == Some(expected_value) {
            shard.strings.remove(key);
            shard.expire_at.remove(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn execute_write(&self, ns: &Namespace, req: WriteRequest) -> BackendResult<WriteOutcome> {
        tracing::debug!(target: "rom::backend", namespace = %ns, id = req.id, is_delete = req.is_delete, "execute_write dispatched");
        let record_key = ns.record_key(req.id);
        let legacy_key = ns.legacy_manifest_key();
        let shard_lock = self.shard(&record_key);
        let mut shard = shard_lock.lock();
        shard.sweep(&record_key);

        let mut changes: u64 = 0;

        // 1. Race check (skipped on delete).
        if !req.is_delete {
            let mut contended = Vec::new();
            for (field, expected) in &req.race_check {
                let current = shard
                    .hashes
                    .get(&record_key)
                    .and_then(|h| h.get(field.as_str()).cloned());
                if current != *expected {
                    contended.push(field.clone());
                }
            }
            if !contended.is_empty() {
                return Ok(WriteOutcome::Race { fields: contended });
            }
        }

        // 2. Unique precheck.
        for (field, new_value) in &req.unique_new {
            let uidx_key = ns.unique_index_key(field);
            if let Some(existing) = shard
                .hashes
                .get(&uidx_key)
                .and_then(|h| h.get(new_value.as_str()))
            {
                if existing.parse::<u64>().ok() != Some(req.id) {
                    return Ok(WriteOutcome::Unique {
                        field: field.clone(),
                    });
                }
            }
        }

        // 3. Unique commit.
        for (field, new_value) in &req.unique_new {
            let uidx_key = ns.unique_index_key(field);
            shard
                .hashes
                .entry(uidx_key)
                .or_default()
                .insert(new_value.clone(), req.id.to_string());
            changes += 1;
        }

        // 4. Unique removal, only if mapping still points at this id.
        for (field, old_value) in &req.unique_deleted {
            let uidx_key = ns.unique_index_key(field);
            let should_remove = shard
                .hashes
                .get(&uidx_key)
                .and_then(|h| h.get(old_value.as_str()))
                .and_then(|id| id.parse::<u64>().ok())
                == Some(req.id);
            if should_remove {
                if let Some(h) = shard.hashes.get_mut(&uidx_key) {
                    h.remove(old_value.as_str());
                }
                changes += 1;
            }
        }

        // 5. Field deletions.
        for field in &req.field_deletions {
            if let Some(h) = shard.hashes.get_mut(&record_key) {
                if h.remove(field.as_str()).is_some() {
                    changes += 1;
                }
            }
        }

        // 6. Field updates.
        for (field, value) in &req.field_updates {
            shard
                .hashes
                .entry(record_key.clone())
                .or_default()
                .insert(field.clone(), value.clone());
            changes += 1;
        }

        // 7. Manifest-driven cleanup: prefer the per-record manifest,
        // fall back to the legacy flat-hash location, migrating either
        // way once consulted.
        let stored_manifest = shard
            .hashes
            .get(&record_key)
            .and_then(|h| h.get(MANIFEST_FIELD).cloned());
        let (manifest, used_legacy) = if let Some(raw) = stored_manifest {
            (
                IndexManifest::decode(&raw).map_err(|e| BackendError::CorruptManifest {
                    namespace: ns.as_str().to_string(),
                    id: req.id,
                    reason: e.to_string(),
                })?,
                false,
            )
        } else {
            let legacy_raw = shard
                .hashes
                .get(&legacy_key)
                .and_then(|h| h.get(req.id.to_string().as_str()).cloned());
            match legacy_raw {
                Some(raw) => (
                    IndexManifest::decode_legacy(&raw).map_err(|e| {
                        BackendError::CorruptManifest {
                            namespace: ns.as_str().to_string(),
                            id: req.id,
                            reason: e.to_string(),
                        }
                    })?,
                    true,
                ),
                None => (IndexManifest::default(), false),
            }
        };

        for term in &manifest.set_terms {
            if let Some((field, value)) = term.split_once(':') {
                let key = ns.set_index_key(field, value);
                if let Some(set) = shard.sets.get_mut(&key) {
                    if set.remove(&req.id.to_string()) {
                        changes += 1;
                    }
                }
            }
        }
        for field in &manifest.scored_terms {
            let key = ns.scored_index_key(field);
            if let Some(z) = shard.zsets.get_mut(&key) {
                let member = req.id.to_string();
                if z.score_of(&member).is_some() {
                    z.remove(&member);
                    changes += 1;
                }
            }
        }
        for (field, term) in &manifest.prefix_pairs {
            let key = ns.prefix_index_key(field);
            let member = format!("{}\0{}", term, req.id);
            if let Some(z) = shard.zsets.get_mut(&key) {
                if z.score_of(&member).is_some() {
                    z.remove(&member);
                    changes += 1;
                }
            }
        }
        for (field, term) in &manifest.suffix_pairs {
            let key = ns.suffix_index_key(field);
            let member = format!("{}\0{}", term, req.id);
            if let Some(z) = shard.zsets.get_mut(&key) {
                if z.score_of(&member).is_some() {
                    z.remove(&member);
                    changes += 1;
                }
            }
        }
        for name in &manifest.geo_names {
            let key = ns.geo_index_key(name);
            if let Some(points) = shard.geo.get_mut(&key) {
                if points.remove(&req.id.to_string()).is_some() {
                    changes += 1;
                }
            }
        }
        if used_legacy {
            if let Some(h) = shard.hashes.get_mut(&legacy_key) {
                h.remove(req.id.to_string().as_str());
            }
        }
        if let Some(h) = shard.hashes.get_mut(&record_key) {
            h.remove(MANIFEST_FIELD);
        }

        // 8. Delete stops here.
        if req.is_delete {
            shard.hashes.remove(&record_key);
            return Ok(WriteOutcome::Changed(changes));
        }

        // 9. New index emission.
        for (field, term) in &req.set_terms {
            let key = ns.set_index_key(field, term);
            shard
                .sets
                .entry(key)
                .or_default()
                .insert(req.id.to_string());
            changes += 1;
        }
        for (field, score) in &req.scored_terms {
            let key = ns.scored_index_key(field);
            shard
                .zsets
                .entry(key)
                .or_default()
                .add(&req.id.to_string(), *score);
            changes += 1;
        }
        for (field, term) in &req.prefix_terms {
            let key = ns.prefix_index_key(field);
            let member = format!("{}\0{}", term, req.id);
            let score = rom_core::codec::prefix_score(term, false);
            shard.zsets.entry(key).or_default().add(&member, score);
            changes += 1;
        }
        for (field, term) in &req.suffix_terms {
            let key = ns.suffix_index_key(field);
            let reversed: String = term.chars().rev().collect();
            let member = format!("{}\0{}", reversed, req.id);
            let score = rom_core::codec::prefix_score(&reversed, false);
            shard.zsets.entry(key).or_default().add(&member, score);
            changes += 1;
        }
        for (name, lon, lat) in &req.geo_terms {
            let key = ns.geo_index_key(name);
            shard
                .geo
                .entry(key)
                .or_default()
                .insert(req.id.to_string(), (*lon, *lat));
            changes += 1;
        }

        // 10. Manifest write.
        let new_manifest = IndexManifest {
            set_terms: req
                .set_terms
                .iter()
                .map(|(f, t)| format!("{}:{}", f, t))
                .collect(),
            scored_terms: req.scored_terms.iter().map(|(f, _)| f.clone()).collect(),
            prefix_pairs: req.prefix_terms.clone(),
            suffix_pairs: req
                .suffix_terms
                .iter()
                .map(|(f, t)| (f.clone(), t.chars().rev().collect()))
                .collect(),
            geo_names: req.geo_terms.iter().map(|(n, _, _)| n.clone()).collect(),
        };
        shard
            .hashes
            .entry(record_key)
            .or_default()
            .insert(MANIFEST_FIELD.to_string(), new_manifest.encode());

        Ok(WriteOutcome::Changed(changes))
    }
}

/// Shell-style `*`/`?` glob match for [`InMemoryBackend::keys`] — simpler
/// than the engine's own `?`/`*`/`+`/`!` pattern-scan dialect (§4.7)
/// because `KEYS` is a debug/admin primitive over raw key names, not an
/// indexed query.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn go(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => go(&p[1..], t) || (!t.is_empty() && go(p, &t[1..])),
            (Some(b'?'), Some(_)) => go(&p[1..], &t[1..]),
            (Some(pc), Some(tc)) if pc == tc => go(&p[1..], &t[1..]),
            _ => false,
        }
    }
    go(pattern.as_bytes(), text.as_bytes())
}

fn haversine_meters(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_METERS * c
}
