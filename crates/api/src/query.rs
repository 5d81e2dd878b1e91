//! The `Query` builder (§4.9, §6): the caller-facing surface over the
//! planner (C5) and executor (C6).
//!
//! Every builder method appends one [`FilterAtom`] (or sets ordering/
//! pagination); nothing touches the store until a terminal method runs.

use crate::model::Model;
use crate::ops;
use rom_backend::{BackingStore, GeoUnit};
use rom_core::error::{RomError, RomResult};
use rom_core::namespace::Namespace;
use rom_core::value::FieldValue;
use rom_engine::executor::{self, ExecResult, OrderBy, QueryOptions};
use rom_engine::planner;
use rom_engine::{FilterAtom, Terms};
use std::marker::PhantomData;

/// A marker term that can never appear in a real set index — used to
/// make an unsatisfiable `.filter()` call (a value that tokenizes to no
/// terms) a well-formed empty-result query rather than a panic.
const UNSATISFIABLE_TERM: &str = "\u{0}__rom_unsatisfiable__";

/// A query against model `M`'s records.
pub struct Query<'a, S: BackingStore, M: Model> {
    store: &'a S,
    ns: Namespace,
    atoms: Vec<FilterAtom>,
    order_by: Option<OrderBy>,
    offset: u64,
    limit: Option<u64>,
    _model: PhantomData<M>,
}

impl<'a, S: BackingStore, M: Model> Query<'a, S, M> {
    /// Start an empty query. At least one `.filter()`/`.range()`/
    /// `.startswith()`/`.endswith()`/`.like()`/`.near()` atom must be
    /// added before a terminal method runs — with no atoms the planner
    /// has nothing to seed the result set from, so the query matches
    /// nothing rather than every record.
    pub fn new(store: &'a S) -> RomResult<Self> {
        let schema = M::schema();
        let ns = Namespace::new(schema.namespace).map_err(|e| RomError::ColumnError {
            namespace: schema.namespace.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Query {
            store,
            ns,
            atoms: Vec::new(),
            order_by: None,
            offset: 0,
            limit: None,
            _model: PhantomData,
        })
    }

    /// Require `field` to equal `value`, via its keygen's term(s). A
    /// text value that tokenizes to more than one term (e.g. `FULL_TEXT`)
    /// requires every resulting term — an implicit AND across tokens.
    pub fn filter(mut self, field: &str, value: FieldValue) -> RomResult<Self> {
        let schema = M::schema();
        let spec = schema
            .field(field)
            .ok_or_else(|| RomError::InvalidColumn {
                namespace: schema.namespace.to_string(),
                field: field.to_string(),
            })?;
        let keygen = spec.keygen.ok_or_else(|| RomError::QueryError {
            namespace: schema.namespace.to_string(),
            reason: format!("field {field} has no keygen and cannot be filtered"),
        })?;
        match keygen.apply(&value) {
            Terms::Empty => self.atoms.push(FilterAtom::Term {
                field: field.to_string(),
                term: UNSATISFIABLE_TERM.to_string(),
            }),
            Terms::Set(terms) => {
                for term in terms {
                    self.atoms.push(FilterAtom::Term {
                        field: field.to_string(),
                        term,
                    });
                }
            }
            Terms::Scored(score) => self.atoms.push(FilterAtom::Range {
                field: field.to_string(),
                lo: Some(score),
                hi: Some(score),
                lo_exclusive: false,
                hi_exclusive: false,
            }),
        }
        Ok(self)
    }

    /// Require `field` to equal any one of `values` (`OR_TERMS`).
    pub fn filter_any(mut self, field: &str, values: &[FieldValue]) -> RomResult<Self> {
        let schema = M::schema();
        let spec = schema
            .field(field)
            .ok_or_else(|| RomError::InvalidColumn {
                namespace: schema.namespace.to_string(),
                field: field.to_string(),
            })?;
        let keygen = spec.keygen.ok_or_else(|| RomError::QueryError {
            namespace: schema.namespace.to_string(),
            reason: format!("field {field} has no keygen and cannot be filtered"),
        })?;
        let mut terms = Vec::new();
        for value in values {
            match keygen.apply(value) {
                Terms::Empty => {}
                Terms::Set(set) => terms.extend(set),
                Terms::Scored(_) => {
                    return Err(RomError::QueryError {
                        namespace: schema.namespace.to_string(),
                        reason: format!("field {field} is scored; use .range() per value instead"),
                    })
                }
            }
        }
        self.atoms.push(FilterAtom::OrTerms {
            field: field.to_string(),
            terms,
        });
        Ok(self)
    }

    /// Require `field`'s ordering score to fall in `[lo, hi]` (either
    /// bound `None` means unbounded in that direction).
    pub fn range(
        mut self,
        field: &str,
        lo: Option<f64>,
        hi: Option<f64>,
        lo_exclusive: bool,
        hi_exclusive: bool,
    ) -> Self {
        self.atoms.push(FilterAtom::Range {
            field: field.to_string(),
            lo,
            hi,
            lo_exclusive,
            hi_exclusive,
        });
        self
    }

    /// Require `field`'s text value to start with `prefix` (§4.7).
    pub fn startswith(mut self, field: &str, prefix: impl Into<String>) -> Self {
        self.atoms.push(FilterAtom::Prefix {
            field: field.to_string(),
            prefix: prefix.into(),
        });
        self
    }

    /// Require `field`'s text value to end with `suffix` (§4.7).
    pub fn endswith(mut self, field: &str, suffix: impl Into<String>) -> Self {
        self.atoms.push(FilterAtom::Suffix {
            field: field.to_string(),
            suffix: suffix.into(),
        });
        self
    }

    /// Require `field`'s text value to match glob `pattern` (§6: `?`/`*`/
    /// `+`/`!`).
    pub fn like(mut self, field: &str, pattern: impl Into<String>) -> Self {
        self.atoms.push(FilterAtom::Pattern {
            field: field.to_string(),
            glob: pattern.into(),
        });
        self
    }

    /// Require the record to fall within `radius` `unit`s of `(lon,
    /// lat)` in the named geo index, optionally capped at `count` hits.
    pub fn near(
        mut self,
        name: &str,
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
        count: Option<u64>,
    ) -> Self {
        self.atoms.push(FilterAtom::Geo {
            name: name.to_string(),
            lon,
            lat,
            radius,
            unit,
            count,
        });
        self
    }

    /// Order results by `field`'s scored index (ascending, or descending
    /// if `descending`).
    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending,
        });
        self
    }

    /// Skip the first `offset` matches.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Cap the number of matches returned.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn ids(self) -> RomResult<Vec<u64>> {
        let idx = rom_engine::IndexStore::new(self.store, &self.ns);
        let plan = planner::plan(&idx, self.atoms)?;
        let options = QueryOptions {
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
            cache_ttl_secs: None,
        };
        match executor::execute(self.store, &self.ns, plan, options)? {
            ExecResult::Ids(ids) => Ok(ids),
            ExecResult::Cached { .. } => unreachable!("cache_ttl_secs was not set"),
        }
    }

    /// Run the query and materialize every matching record.
    pub fn all(self) -> RomResult<Vec<M>> {
        let store = self.store;
        let ids = self.ids()?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(m) = ops::get::<S, M>(store, id)? {
                out.push(m);
            }
        }
        Ok(out)
    }

    /// Run the query and return the number of matches, without
    /// materializing any record.
    pub fn count(self) -> RomResult<u64> {
        Ok(self.ids()?.len() as u64)
    }

    /// Run the query and leave the result set cached under a TTL'd key
    /// instead of draining it, returning that key for a later
    /// [`rom_engine::executor::page_cached`] call.
    pub fn cached(self, ttl_secs: u64) -> RomResult<String> {
        let idx = rom_engine::IndexStore::new(self.store, &self.ns);
        let plan = planner::plan(&idx, self.atoms)?;
        let options = QueryOptions {
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
            cache_ttl_secs: Some(ttl_secs),
        };
        match executor::execute(self.store, &self.ns, plan, options)? {
            ExecResult::Cached { key } => Ok(key),
            ExecResult::Ids(_) => unreachable!("cache_ttl_secs was set"),
        }
    }
}
