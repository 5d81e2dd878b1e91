//! Query Planner (§4.5, C5): cost-estimate filter atoms, reorder
//! smallest-first, and decide whether the seeding atom should be produced
//! by sub-range extraction instead of union-then-prune.
//!
//! The planner never touches the backing store for anything beyond the
//! cheap cardinality/window-size probes [`crate::index::IndexStore`]
//! exposes (§4.3: "All operations are read-only"); actually running the
//! plan is [`crate::executor`]'s job.

use crate::index::IndexStore;
use rom_backend::{BackingStore, GeoUnit};
use rom_core::error::{RomError, RomResult};

/// One filter condition in a query (§4.5).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterAtom {
    /// Set-intersection atom: records whose `field` has `term` among its
    /// indexed terms.
    Term {
        /// Field name.
        field: String,
        /// Term to match.
        term: String,
    },
    /// Scored-range atom. `None` bounds mean unbounded in that direction.
    Range {
        /// Field name.
        field: String,
        /// Inclusive-unless-`lo_exclusive` lower bound.
        lo: Option<f64>,
        /// Inclusive-unless-`hi_exclusive` upper bound.
        hi: Option<f64>,
        /// Whether `lo` is an open (exclusive) bound.
        lo_exclusive: bool,
        /// Whether `hi` is an open (exclusive) bound.
        hi_exclusive: bool,
    },
    /// Union atom: records whose `field` has any of `terms` among its
    /// indexed terms.
    OrTerms {
        /// Field name.
        field: String,
        /// Candidate terms, unioned.
        terms: Vec<String>,
    },
    /// Literal-prefix atom (`startswith`).
    Prefix {
        /// Field name.
        field: String,
        /// Literal prefix to match.
        prefix: String,
    },
    /// Literal-suffix atom (`endswith`).
    Suffix {
        /// Field name.
        field: String,
        /// Literal suffix to match.
        suffix: String,
    },
    /// Glob-pattern atom (`like`).
    Pattern {
        /// Field name.
        field: String,
        /// Glob pattern (§6: `?`/`*`/`+`/`!`).
        glob: String,
    },
    /// Geo-proximity atom (`near`).
    Geo {
        /// Name of the geo index.
        name: String,
        /// Query point longitude.
        lon: f64,
        /// Query point latitude.
        lat: f64,
        /// Search radius, in `unit`.
        radius: f64,
        /// Unit the radius and returned distances are expressed in.
        unit: GeoUnit,
        /// Optional cap on the number of hits.
        count: Option<u64>,
    },
}

impl FilterAtom {
    /// The field (or geo-index name) this atom filters on — used for
    /// error messages and for locating the atom's backing index.
    pub fn field_name(&self) -> &str {
        match self {
            FilterAtom::Term { field, .. }
            | FilterAtom::Range { field, .. }
            | FilterAtom::OrTerms { field, .. }
            | FilterAtom::Prefix { field, .. }
            | FilterAtom::Suffix { field, .. }
            | FilterAtom::Pattern { field, .. } => field,
            FilterAtom::Geo { name, .. } => name,
        }
    }
}

/// One atom plus its estimated work, in plan order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAtom {
    /// The filter atom.
    pub atom: FilterAtom,
    /// Estimated work (§4.5 step 1). Negative for a `Range` atom selective
    /// enough that the executor should prefer sub-range extraction over
    /// union-then-prune.
    pub estimate: i64,
}

/// An ordered execution plan: filter atoms sorted by ascending estimated
/// work, with the sub-range-seed hint preserved from the first atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Atoms in execution order — first seeds the temporary result set,
    /// the rest intersect into it.
    pub atoms: Vec<PlannedAtom>,
}

impl Plan {
    /// True if the seeding atom is a selective `Range` that should be
    /// produced via sub-range extraction (§4.5 step 3) rather than
    /// union-then-prune.
    pub fn seed_is_subrange(&self) -> bool {
        matches!(self.atoms.first(), Some(p) if p.estimate < 0)
    }
}

/// Estimate the work one atom requires (§4.5 step 1).
///
/// `RANGE` atoms get a negative estimate when the requested window is at
/// most two-thirds of the whole scored index — a signal to the executor
/// that sub-range extraction will be cheaper than unioning the whole
/// index and then pruning it.
pub fn estimate_work<S: BackingStore>(idx: &IndexStore<'_, S>, atom: &FilterAtom) -> RomResult<i64> {
    let to_rom = |e: rom_backend::BackendError| RomError::Backend(e.to_string());
    match atom {
        FilterAtom::Term { field, term } => {
            let card = idx.card(field, Some(term)).map_err(to_rom)?;
            Ok(card as i64)
        }
        FilterAtom::OrTerms { field, terms } => {
            let mut total: i64 = 0;
            for term in terms {
                total += idx.card(field, Some(term)).map_err(to_rom)? as i64;
            }
            Ok(total)
        }
        FilterAtom::Range { field, .. } => {
            let total = idx.card(field, None).map_err(to_rom)?;
            let range_size = range_size(idx, field, atom).map_err(to_rom)?;
            if total > 0 && (range_size as f64) <= (total as f64) * (2.0 / 3.0) {
                Ok(-(range_size as i64))
            } else {
                Ok(range_size as i64)
            }
        }
        FilterAtom::Prefix { field, prefix } => {
            let size = idx.estimate_prefix_window(field, prefix).map_err(to_rom)?;
            Ok(size as i64)
        }
        FilterAtom::Suffix { field, suffix } => {
            let reversed: String = suffix.chars().rev().collect();
            let size = idx.estimate_prefix_window(field, &reversed).map_err(to_rom)?;
            Ok(size as i64)
        }
        FilterAtom::Pattern { field, glob } => {
            let literal = literal_prefix_of(glob);
            let size = idx.estimate_prefix_window(field, &literal).map_err(to_rom)?;
            Ok(size as i64)
        }
        FilterAtom::Geo { name, lon, lat, radius, unit, count } => {
            let index_size = idx.geo_card(name).map_err(to_rom)?;
            let requested = count.unwrap_or(u64::MAX);
            let _ = (lon, lat, radius, unit);
            Ok(index_size.min(requested) as i64)
        }
    }
}

fn range_size<S: BackingStore>(
    idx: &IndexStore<'_, S>,
    field: &str,
    atom: &FilterAtom,
) -> Result<u64, rom_backend::BackendError> {
    let FilterAtom::Range { lo, hi, .. } = atom else {
        unreachable!("range_size called on non-Range atom");
    };
    let lo = lo.unwrap_or(f64::NEG_INFINITY);
    let hi = hi.unwrap_or(f64::INFINITY);
    Ok(idx.range_scored(field, lo, hi)?.len() as u64)
}

/// Literal leading characters of a glob up to the first wildcard, mirroring
/// [`crate::scanner`]'s own extraction so the planner's estimate and the
/// executor's scan agree on the seeded score window.
fn literal_prefix_of(pattern: &str) -> String {
    let mut out = String::new();
    for ch in pattern.chars() {
        if matches!(ch, '?' | '*' | '+' | '!') {
            break;
        }
        out.push(ch);
        if out.len() >= 7 {
            break;
        }
    }
    out
}

/// Estimate and reorder `atoms` ascending by absolute work (§4.5 steps 1–2).
pub fn plan<S: BackingStore>(idx: &IndexStore<'_, S>, atoms: Vec<FilterAtom>) -> RomResult<Plan> {
    let mut planned: Vec<PlannedAtom> = Vec::with_capacity(atoms.len());
    for atom in atoms {
        let estimate = estimate_work(idx, &atom)?;
        planned.push(PlannedAtom { atom, estimate });
    }
    planned.sort_by_key(|p| p.estimate.abs());
    Ok(Plan { atoms: planned })
}
