//! Collaborator traits: where the engine gets its data and puts its edges.
//!
//! These are traits rather than concrete types so that different storage
//! backends (in-memory, SQLite, an application's own database layer) can
//! sit behind the same generator and retriever.

use crate::config::RecommendationConfig;
use crate::error::Result;
use crate::types::{FieldValue, Observation, Record, RecommendationEdge, RecordId};
use std::collections::BTreeMap;

/// Selects `(group, data)` pairs from a named table.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    pub table: String,
    pub group_field: String,
    pub data_field: String,
    /// Equality predicates, ANDed together.
    pub filters: BTreeMap<String, FieldValue>,
}

impl ObservationQuery {
    pub fn new(
        table: impl Into<String>,
        group_field: impl Into<String>,
        data_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            group_field: group_field.into(),
            data_field: data_field.into(),
            filters: BTreeMap::new(),
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Build the query a co-occurrence set describes.
    ///
    /// Returns `None` when the table, group field or data field is missing.
    pub fn from_config(config: &RecommendationConfig) -> Option<Self> {
        Some(Self {
            table: config.recommendation_data_table.clone()?,
            group_field: config.recommendation_group_field.clone()?,
            data_field: config.recommendation_data_field.clone()?,
            filters: config.recommendation_data_table_filter.clone(),
        })
    }

    /// Whether a row passes every equality filter.
    pub fn matches(&self, row: &BTreeMap<String, FieldValue>) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| row.get(field).unwrap_or(&FieldValue::Null) == expected)
    }
}

/// Tabular source of raw observations (co-occurrence input).
pub trait ObservationSource: Send + Sync {
    /// Rows matching `query`, in storage order.
    fn observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>>;
}

/// Keyed access to records of an entity kind.
pub trait RecordSource: Send + Sync {
    /// Every record of `kind` with the named relations eager-loaded.
    fn all(&self, kind: &str, relations: &[String]) -> Result<Vec<Record>>;

    /// Records of `kind` whose ids appear in `ids`. Order is unspecified and
    /// unknown ids are skipped. Relations are not loaded.
    fn find_many(&self, kind: &str, ids: &[RecordId]) -> Result<Vec<Record>>;

    /// Eager-load the named relations onto already fetched records.
    fn load_relations(&self, kind: &str, records: &mut [Record], relations: &[String]) -> Result<()>;
}

/// Named configuration lookup.
pub trait ConfigSource: Send + Sync {
    /// The set `name` defined for `kind`, if any.
    fn recommendation(&self, kind: &str, name: &str) -> Option<RecommendationConfig>;

    /// Global fallback for `recommendation_count`.
    fn default_count(&self) -> usize;
}

/// Filter for reading persisted edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeQuery {
    pub source_type: String,
    pub source_id: RecordId,
    pub recommendation_name: String,
    pub target_type: String,
}

/// Persisted recommendation edges.
///
/// Implementations must keep `(source_type, source_id, target_type,
/// recommendation_name, target_id)` unique.
pub trait EdgeStore: Send + Sync {
    /// Delete every edge of `(source_type, source_id, recommendation_name)`
    /// and insert `edges`, as one step no reader can observe half done.
    /// Every edge must belong to that source and set.
    fn replace_edges(
        &self,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
        edges: &[RecommendationEdge],
    ) -> Result<()>;

    /// Delete every edge of `(source_type, source_id, recommendation_name)`.
    /// Returns the number removed.
    fn delete_edges(
        &self,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
    ) -> Result<usize>;

    /// Insert one edge; a duplicate key is an error.
    fn insert_edge(&self, edge: &RecommendationEdge) -> Result<()>;

    /// Edges matching `query`, highest rank first, ties in insertion order.
    fn edges_for(&self, query: &EdgeQuery) -> Result<Vec<RecommendationEdge>>;

    /// Total number of persisted edges.
    fn edge_count(&self) -> Result<usize>;
}
