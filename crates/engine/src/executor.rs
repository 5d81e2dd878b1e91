//! Query Executor (§4.6, C6): runs an ordered [`crate::planner::Plan`]
//! against the backing store, producing a temporary sorted set that is
//! then ordered, paginated, and either cached or drained into a plain id
//! list.
//!
//! Every method here issues one or more primitive [`BackingStore`] calls
//! per atom — in a real deployment these would be pipelined; the
//! in-memory reference backend makes each call independently, which is
//! observably identical since nothing else can interleave with a single
//! logical request against it.

use crate::planner::{FilterAtom, Plan};
use crate::scanner;
use rom_backend::{BackendError, BackingStore};
use rom_core::error::{RomError, RomResult};
use rom_core::namespace::Namespace;
use uuid::Uuid;

/// Members are walked out of a source ZSET/SET in blocks of this size
/// when seeding or trimming a sub-range — mirrors the real deployment's
/// `lua_subrange` script, which batches to avoid a single oversized
/// command (§4.5 step 3).
const SUBRANGE_BLOCK: usize = 100;

/// An order-by clause: field name plus direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field whose scored index provides the ordering.
    pub field: String,
    /// True for descending order (the caller-facing `-field` syntax).
    pub descending: bool,
}

/// Pagination and post-processing options for [`execute`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Optional ordering applied after all atoms have intersected.
    pub order_by: Option<OrderBy>,
    /// Number of leading matches to skip.
    pub offset: u64,
    /// Maximum number of ids to return. `None` means "all remaining".
    pub limit: Option<u64>,
    /// If set, the result is left in the backing store under a TTL'd key
    /// instead of being drained and deleted — the caller's
    /// `.cached_result(ttl)` terminal (§6).
    pub cache_ttl_secs: Option<u64>,
}

/// Outcome of [`execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    /// A plain, already-paginated id list. The temporary result set was
    /// deleted after materializing this list.
    Ids(Vec<u64>),
    /// The query result was left behind as a TTL'd sorted-set key for the
    /// caller to page through later.
    Cached {
        /// Key of the temporary result set, now carrying a TTL.
        key: String,
    },
}

/// Execute `plan` against `store`/`ns`, honoring `options`, and return
/// either a materialized id list or a cached result-set key (§4.6).
pub fn execute<S: BackingStore>(
    store: &S,
    ns: &Namespace,
    plan: Plan,
    options: QueryOptions,
) -> RomResult<ExecResult> {
    let to_rom = |e: BackendError| RomError::Backend(e.to_string());
    let dest = format!("{}:{}", ns.as_str(), Uuid::new_v4());

    tracing::debug!(target: "rom::executor", namespace = %ns, atoms = plan.atoms.len(), "executing plan");

    let mut atoms = plan.atoms.into_iter();
    let Some(first) = atoms.next() else {
        return Ok(ExecResult::Ids(Vec::new()));
    };

    seed(store, ns, &first.atom, &dest, first.estimate < 0).map_err(to_rom)?;

    for planned in atoms {
        intersect(store, ns, &planned.atom, &dest).map_err(to_rom)?;
    }

    if let Some(order) = &options.order_by {
        apply_order(store, ns, &dest, order).map_err(to_rom)?;
    }

    if let Some(ttl) = options.cache_ttl_secs {
        store.expire(&dest, ttl).map_err(to_rom)?;
        tracing::debug!(target: "rom::executor", namespace = %ns, key = %dest, ttl, "result cached");
        return Ok(ExecResult::Cached { key: dest });
    }

    let start = options.offset as i64;
    let stop = match options.limit {
        Some(limit) => start + limit as i64 - 1,
        None => -1,
    };
    let ids: Vec<u64> = store
        .zrange(&dest, start, stop)
        .map_err(to_rom)?
        .into_iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    store.del(&dest).map_err(to_rom)?;
    tracing::debug!(target: "rom::executor", namespace = %ns, hits = ids.len(), "plan executed");
    Ok(ExecResult::Ids(ids))
}

/// Page through a cached result key (the counterpart to a
/// [`ExecResult::Cached`] key) without consuming it, for `.iter_result()`
/// style repeated reads within the TTL window.
pub fn page_cached<S: BackingStore>(
    store: &S,
    key: &str,
    offset: u64,
    limit: Option<u64>,
) -> RomResult<Vec<u64>> {
    let start = offset as i64;
    let stop = match limit {
        Some(limit) => start + limit as i64 - 1,
        None => -1,
    };
    store
        .zrange(key, start, stop)
        .map_err(|e| RomError::Backend(e.to_string()))
        .map(|members| members.into_iter().filter_map(|m| m.parse().ok()).collect())
}

fn seed<S: BackingStore>(
    store: &S,
    ns: &Namespace,
    atom: &FilterAtom,
    dest: &str,
    use_subrange: bool,
) -> Result<(), BackendError> {
    match atom {
        FilterAtom::Term { field, term } => {
            seed_set_members(store, &ns.set_index_key(field, term), dest, 0.0)
        }
        FilterAtom::OrTerms { field, terms } => {
            for term in terms {
                seed_set_members(store, &ns.set_index_key(field, term), dest, 0.0)?;
            }
            Ok(())
        }
        FilterAtom::Range { field, lo, hi, lo_exclusive, hi_exclusive } => {
            let key = ns.scored_index_key(field);
            if use_subrange {
                seed_subrange(store, &key, dest, *lo, *hi)?;
            } else {
                store.zunionstore(dest, &[(key, 1.0)])?;
            }
            trim_range(store, dest, *lo, *hi, *lo_exclusive, *hi_exclusive)
        }
        FilterAtom::Prefix { field, prefix } => {
            let hits = scanner::scan_literal(store, &ns.prefix_index_key(field), prefix, false)?;
            seed_ids(store, dest, &hits)
        }
        FilterAtom::Suffix { field, suffix } => {
            let reversed: String = suffix.chars().rev().collect();
            let hits = scanner::scan_literal(store, &ns.suffix_index_key(field), &reversed, true)?;
            seed_ids(store, dest, &hits)
        }
        FilterAtom::Pattern { field, glob } => {
            let hits = scanner::scan_pattern(store, &ns.prefix_index_key(field), glob)?;
            seed_ids(store, dest, &hits)
        }
        FilterAtom::Geo { name, lon, lat, radius, unit, count } => {
            let key = ns.geo_index_key(name);
            let hits = store.georadius(&key, *lon, *lat, *radius, *unit, *count)?;
            for hit in hits {
                store.zadd(dest, &hit.member, hit.distance)?;
            }
            Ok(())
        }
    }
}

fn intersect<S: BackingStore>(
    store: &S,
    ns: &Namespace,
    atom: &FilterAtom,
    dest: &str,
) -> Result<(), BackendError> {
    match atom {
        FilterAtom::Term { field, term } => {
            let scratch = format!("{}:scratch:{}", dest, Uuid::new_v4());
            seed_set_members(store, &ns.set_index_key(field, term), &scratch, 0.0)?;
            store.zinterstore(dest, &[(dest.to_string(), 1.0), (scratch.clone(), 0.0)])?;
            store.del(&scratch)
        }
        FilterAtom::OrTerms { field, terms } => {
            let scratch = format!("{}:scratch:{}", dest, Uuid::new_v4());
            for term in terms {
                seed_set_members(store, &ns.set_index_key(field, term), &scratch, 0.0)?;
            }
            store.zinterstore(dest, &[(dest.to_string(), 1.0), (scratch.clone(), 0.0)])?;
            store.del(&scratch)
        }
        FilterAtom::Range { field, lo, hi, lo_exclusive, hi_exclusive } => {
            let key = ns.scored_index_key(field);
            store.zinterstore(dest, &[(dest.to_string(), 0.0), (key, 1.0)])?;
            trim_range(store, dest, *lo, *hi, *lo_exclusive, *hi_exclusive)
        }
        FilterAtom::Prefix { field, prefix } => {
            let hits = scanner::scan_literal(store, &ns.prefix_index_key(field), prefix, false)?;
            intersect_ids(store, dest, &hits)
        }
        FilterAtom::Suffix { field, suffix } => {
            let reversed: String = suffix.chars().rev().collect();
            let hits = scanner::scan_literal(store, &ns.suffix_index_key(field), &reversed, true)?;
            intersect_ids(store, dest, &hits)
        }
        FilterAtom::Pattern { field, glob } => {
            let hits = scanner::scan_pattern(store, &ns.prefix_index_key(field), glob)?;
            intersect_ids(store, dest, &hits)
        }
        FilterAtom::Geo { name, lon, lat, radius, unit, count } => {
            let key = ns.geo_index_key(name);
            let hits = store.georadius(&key, *lon, *lat, *radius, *unit, *count)?;
            let scratch = format!("{}:scratch:{}", dest, Uuid::new_v4());
            for hit in &hits {
                store.zadd(&scratch, &hit.member, hit.distance)?;
            }
            store.zinterstore(dest, &[(dest.to_string(), 1.0), (scratch.clone(), 0.0)])?;
            store.del(&scratch)
        }
    }
}

fn apply_order<S: BackingStore>(
    store: &S,
    ns: &Namespace,
    dest: &str,
    order: &OrderBy,
) -> Result<(), BackendError> {
    let key = ns.scored_index_key(&order.field);
    let sign = if order.descending { -1.0 } else { 1.0 };
    store.zinterstore(dest, &[(dest.to_string(), 0.0), (key, sign)])
}

fn seed_set_members<S: BackingStore>(
    store: &S,
    set_key: &str,
    dest: &str,
    score: f64,
) -> Result<(), BackendError> {
    for chunk in store.smembers(set_key)?.chunks(SUBRANGE_BLOCK) {
        for member in chunk {
            store.zadd(dest, member, score)?;
        }
    }
    Ok(())
}

fn seed_ids<S: BackingStore>(store: &S, dest: &str, ids: &[u64]) -> Result<(), BackendError> {
    for chunk in ids.chunks(SUBRANGE_BLOCK) {
        for id in chunk {
            store.zadd(dest, &id.to_string(), 0.0)?;
        }
    }
    Ok(())
}

fn intersect_ids<S: BackingStore>(
    store: &S,
    dest: &str,
    ids: &[u64],
) -> Result<(), BackendError> {
    let scratch = format!("{}:scratch:{}", dest, Uuid::new_v4());
    seed_ids(store, &scratch, ids)?;
    store.zinterstore(dest, &[(dest.to_string(), 1.0), (scratch.clone(), 0.0)])?;
    store.del(&scratch)
}

/// Extract exactly the `[lo, hi]` sub-range of `src_key` into `dest`, in
/// blocks of [`SUBRANGE_BLOCK`] (§4.5 step 3's `lua_subrange`) — cheaper
/// than unioning the whole index and pruning it when the range is
/// selective.
fn seed_subrange<S: BackingStore>(
    store: &S,
    src_key: &str,
    dest: &str,
    lo: Option<f64>,
    hi: Option<f64>,
) -> Result<(), BackendError> {
    let lo = lo.unwrap_or(f64::NEG_INFINITY);
    let hi = hi.unwrap_or(f64::INFINITY);
    let window = store.zrange_by_score(src_key, lo, hi)?;
    for chunk in window.chunks(SUBRANGE_BLOCK) {
        for (member, score) in chunk {
            store.zadd(dest, member, *score)?;
        }
    }
    Ok(())
}

/// Trim `dest` to `[lo, hi]` via `ZREMRANGEBYSCORE` on both open ends —
/// the union-then-prune half of a non-subrange `RANGE` seed, and the
/// cleanup step after intersecting a `RANGE` atom.
fn trim_range<S: BackingStore>(
    store: &S,
    dest: &str,
    lo: Option<f64>,
    hi: Option<f64>,
    lo_exclusive: bool,
    hi_exclusive: bool,
) -> Result<(), BackendError> {
    if let Some(lo) = lo {
        let bound = if lo_exclusive { lo } else { next_down(lo) };
        store.zremrangebyscore(dest, f64::NEG_INFINITY, bound)?;
    }
    if let Some(hi) = hi {
        let bound = if hi_exclusive { hi } else { next_up(hi) };
        store.zremrangebyscore(dest, bound, f64::INFINITY)?;
    }
    Ok(())
}

/// The next representable `f64` strictly below `x` (stdlib-free
/// `f64::next_down` equivalent, needed to turn an inclusive range bound
/// into the exclusive `ZREMRANGEBYSCORE` trim window without touching the
/// boundary value itself).
fn next_down(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY {
        return x;
    }
    if x == 0.0 {
        return -f64::from_bits(1);
    }
    let bits = x.to_bits();
    f64::from_bits(if x > 0.0 { bits - 1 } else { bits + 1 })
}

/// The next representable `f64` strictly above `x`.
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    f64::from_bits(if x >= 0.0 { bits + 1 } else { bits - 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{plan, FilterAtom};
    use crate::IndexStore;
    use rom_backend::InMemoryBackend;

    fn seed_tagged(be: &InMemoryBackend, ns: &Namespace, tag: &str, ids: &[u64]) {
        for id in ids {
            be.sadd(&ns.set_index_key("tag", tag), &id.to_string()).unwrap();
        }
    }

    #[test]
    fn single_term_atom_returns_its_members() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed_tagged(&be, &ns, "red", &[1, 2, 3]);

        let idx = IndexStore::new(&be, &ns);
        let atoms = vec![FilterAtom::Term {
            field: "tag".to_string(),
            term: "red".to_string(),
        }];
        let planned = plan(&idx, atoms).unwrap();
        let result = execute(&be, &ns, planned, QueryOptions::default()).unwrap();
        let ExecResult::Ids(mut ids) = result else { panic!("expected Ids") };
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn intersecting_two_terms_narrows_the_result() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed_tagged(&be, &ns, "red", &[1, 2, 3]);
        seed_tagged(&be, &ns, "big", &[2, 3, 4]);

        let idx = IndexStore::new(&be, &ns);
        let atoms = vec![
            FilterAtom::Term { field: "tag".to_string(), term: "red".to_string() },
            FilterAtom::Term { field: "tag".to_string(), term: "big".to_string() },
        ];
        let planned = plan(&idx, atoms).unwrap();
        let result = execute(&be, &ns, planned, QueryOptions::default()).unwrap();
        let ExecResult::Ids(mut ids) = result else { panic!("expected Ids") };
        ids.sort();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn range_atom_respects_bounds() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        be.zadd(&ns.scored_index_key("created"), "1", 100.0).unwrap();
        be.zadd(&ns.scored_index_key("created"), "2", 200.0).unwrap();

        let idx = IndexStore::new(&be, &ns);
        let atoms = vec![FilterAtom::Range {
            field: "created".to_string(),
            lo: Some(150.0),
            hi: Some(250.0),
            lo_exclusive: false,
            hi_exclusive: false,
        }];
        let planned = plan(&idx, atoms).unwrap();
        let result = execute(&be, &ns, planned, QueryOptions::default()).unwrap();
        assert_eq!(result, ExecResult::Ids(vec![2]));
    }

    #[test]
    fn order_by_descending_reverses_result_order() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed_tagged(&be, &ns, "all", &[1, 2, 3]);
        be.zadd(&ns.scored_index_key("created"), "1", 100.0).unwrap();
        be.zadd(&ns.scored_index_key("created"), "2", 200.0).unwrap();
        be.zadd(&ns.scored_index_key("created"), "3", 300.0).unwrap();

        let idx = IndexStore::new(&be, &ns);
        let atoms = vec![FilterAtom::Term { field: "tag".to_string(), term: "all".to_string() }];
        let planned = plan(&idx, atoms).unwrap();
        let options = QueryOptions {
            order_by: Some(OrderBy { field: "created".to_string(), descending: true }),
            ..Default::default()
        };
        let result = execute(&be, &ns, planned, options).unwrap();
        assert_eq!(result, ExecResult::Ids(vec![3, 2, 1]));
    }

    #[test]
    fn cached_result_leaves_a_ttl_bounded_key() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed_tagged(&be, &ns, "red", &[1, 2]);

        let idx = IndexStore::new(&be, &ns);
        let atoms = vec![FilterAtom::Term { field: "tag".to_string(), term: "red".to_string() }];
        let planned = plan(&idx, atoms).unwrap();
        let options = QueryOptions { cache_ttl_secs: Some(60), ..Default::default() };
        let result = execute(&be, &ns, planned, options).unwrap();
        let ExecResult::Cached { key } = result else { panic!("expected Cached") };
        let mut ids = page_cached(&be, &key, 0, None).unwrap();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn pagination_limits_and_offsets_the_result() {
        let be = InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed_tagged(&be, &ns, "all", &[1, 2, 3, 4]);
        for id in 1..=4u64 {
            be.zadd(&ns.scored_index_key("created"), &id.to_string(), id as f64).unwrap();
        }

        let idx = IndexStore::new(&be, &ns);
        let atoms = vec![FilterAtom::Term { field: "tag".to_string(), term: "all".to_string() }];
        let planned = plan(&idx, atoms).unwrap();
        let options = QueryOptions {
            order_by: Some(OrderBy { field: "created".to_string(), descending: false }),
            offset: 1,
            limit: Some(2),
            ..Default::default()
        };
        let result = execute(&be, &ns, planned, options).unwrap();
        assert_eq!(result, ExecResult::Ids(vec![2, 3]));
    }
}
