//! Query catalog: the immutable mapping from query id to its SQL workload.
//!
//! The catalog is a plain value built once at startup and passed by reference,
//! so tests can substitute a fixture catalog for the TPC-H one.

mod tpch;

use std::collections::BTreeMap;

use crate::error::{Result, TpchError};

/// A named, possibly multi-statement SQL workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefinition {
    /// Query identifier (1..=22 for TPC-H).
    pub id: u32,
    /// Human-readable title.
    pub title: &'static str,
    /// Statements executed in order.
    pub statements: &'static [&'static str],
}

/// Read-only lookup of query definitions by id.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: BTreeMap<u32, QueryDefinition>,
}

impl QueryCatalog {
    /// Builds a catalog from definitions, rejecting duplicate ids.
    pub fn new(definitions: impl IntoIterator<Item = QueryDefinition>) -> Result<Self> {
        let mut queries = BTreeMap::new();
        for def in definitions {
            if queries.insert(def.id, def).is_some() {
                return Err(TpchError::internal(format!(
                    "duplicate query id in catalog: {}",
                    def.id
                )));
            }
        }
        Ok(Self { queries })
    }

    /// The 22 TPC-H queries.
    pub fn tpch() -> Self {
        Self {
            queries: tpch::TPCH_QUERIES.iter().map(|q| (q.id, *q)).collect(),
        }
    }

    /// Looks up a query by id.
    pub fn get(&self, id: u32) -> Option<&QueryDefinition> {
        self.queries.get(&id)
    }

    /// Looks up a query by id, failing with an "unknown query id" error.
    pub fn lookup(&self, id: u32) -> Result<&QueryDefinition> {
        self.get(id)
            .ok_or_else(|| TpchError::config(format!("unknown query id: {id}")))
    }

    /// Resolves every id in request order, failing on the first unknown one.
    ///
    /// Duplicates are kept: each occurrence yields its own entry.
    pub fn resolve(&self, ids: &[u32]) -> Result<Vec<&QueryDefinition>> {
        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| self.get(**id).is_none())
            .map(u32::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(TpchError::config(format!(
                "unknown query id: {}",
                unknown.join(", ")
            )));
        }
        ids.iter().map(|id| self.lookup(*id)).collect()
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.queries.keys().copied().collect()
    }

    /// Number of queries in the catalog.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns true if the catalog holds no queries.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
