//! In-memory storage backend.
//!
//! Holds records, observation tables and edges behind `RwLock`s. Used by
//! tests, by small embedded deployments, and by the CLI as its record
//! catalogue. Edges are bucketed per `(source_type, source_id,
//! recommendation_name)`; a replacement swaps one bucket under a single
//! write lock, so readers see either the old or the new edge set.

use affinity_core::error::{AffinityError, Result};
use affinity_core::store::{EdgeQuery, EdgeStore, ObservationQuery, ObservationSource, RecordSource};
use affinity_core::types::{FieldValue, Observation, Record, RecommendationEdge, RecordId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A row of an observation table.
pub type Row = BTreeMap<String, FieldValue>;

/// `(source_type, source_id, recommendation_name)`
type EdgeKey = (String, RecordId, String);

fn edge_key(source_type: &str, source_id: &RecordId, recommendation_name: &str) -> EdgeKey {
    (source_type.to_string(), source_id.clone(), recommendation_name.to_string())
}

/// In-memory records, tables and edges.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<Record>>>,
    tables: RwLock<HashMap<String, Vec<Row>>>,
    edges: RwLock<HashMap<EdgeKey, Vec<RecommendationEdge>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| AffinityError::storage("memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| AffinityError::storage("memory store lock poisoned"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record of `kind` (matched by id).
    pub fn add_record(&self, kind: &str, record: Record) -> Result<()> {
        let mut records = write(&self.records)?;
        let list = records.entry(kind.to_string()).or_default();
        match list.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => list.push(record),
        }
        Ok(())
    }

    pub fn add_records(&self, kind: &str, records: impl IntoIterator<Item = Record>) -> Result<()> {
        for record in records {
            self.add_record(kind, record)?;
        }
        Ok(())
    }

    /// Append a row to an observation table.
    pub fn add_row<I, K, V>(&self, table: &str, row: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let row: Row = row.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        write(&self.tables)?
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    /// Number of records of `kind`.
    pub fn record_count(&self, kind: &str) -> Result<usize> {
        Ok(read(&self.records)?.get(kind).map(Vec::len).unwrap_or(0))
    }

    /// Snapshot of all edges. Each source's edges stay in insertion
    /// order; sources come in no particular order.
    pub fn edges(&self) -> Result<Vec<RecommendationEdge>> {
        Ok(read(&self.edges)?.values().flatten().cloned().collect())
    }

    fn insert_into(bucket: &mut Vec<RecommendationEdge>, edge: &RecommendationEdge) -> Result<()> {
        if bucket.iter().any(|e| e.same_key(edge)) {
            return Err(AffinityError::DuplicateEdge {
                source_type: edge.source_type.clone(),
                source_id: edge.source_id.to_string(),
                target_type: edge.target_type.clone(),
                target_id: edge.target_id.to_string(),
                recommendation_name: edge.recommendation_name.clone(),
            });
        }
        bucket.push(edge.clone());
        Ok(())
    }
}

impl RecordSource for MemoryStore {
    fn all(&self, kind: &str, relations: &[String]) -> Result<Vec<Record>> {
        Ok(read(&self.records)?
            .get(kind)
            .map(|list| list.iter().map(|r| r.project(relations)).collect())
            .unwrap_or_default())
    }

    fn find_many(&self, kind: &str, ids: &[RecordId]) -> Result<Vec<Record>> {
        Ok(read(&self.records)?
            .get(kind)
            .map(|list| {
                list.iter()
                    .filter(|r| ids.contains(&r.id))
                    .map(|r| r.project(&[]))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn load_relations(&self, kind: &str, records: &mut [Record], relations: &[String]) -> Result<()> {
        let store = read(&self.records)?;
        let Some(list) = store.get(kind) else {
            return Ok(());
        };
        for record in records.iter_mut() {
            if let Some(stored) = list.iter().find(|r| r.id == record.id) {
                for (name, relation) in stored.project(relations).relations {
                    record.relations.insert(name, relation);
                }
            }
        }
        Ok(())
    }
}

impl ObservationSource for MemoryStore {
    fn observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>> {
        let tables = read(&self.tables)?;
        let Some(rows) = tables.get(&query.table) else {
            return Ok(Vec::new());
        };

        // NULL group or data values never form an observation.
        Ok(rows
            .iter()
            .filter(|row| query.matches(row))
            .filter_map(|row| {
                let group = row.get(&query.group_field).filter(|v| **v != FieldValue::Null)?;
                let data = row.get(&query.data_field).filter(|v| **v != FieldValue::Null)?;
                Some(Observation::new(group.as_text(), data.as_text()))
            })
            .collect())
    }
}

impl EdgeStore for MemoryStore {
    fn replace_edges(
        &self,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
        edges: &[RecommendationEdge],
    ) -> Result<()> {
        let key = edge_key(source_type, source_id, recommendation_name);

        // Validate the whole set before the old one goes away
        let mut next = Vec::with_capacity(edges.len());
        for edge in edges {
            if !edge.belongs_to(source_type, source_id, recommendation_name) {
                return Err(AffinityError::foreign_edge(edge, source_type, source_id, recommendation_name));
            }
            Self::insert_into(&mut next, edge)?;
        }

        let mut stored = write(&self.edges)?;
        if next.is_empty() {
            stored.remove(&key);
        } else {
            stored.insert(key, next);
        }
        Ok(())
    }

    fn delete_edges(
        &self,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
    ) -> Result<usize> {
        let key = edge_key(source_type, source_id, recommendation_name);
        Ok(write(&self.edges)?.remove(&key).map_or(0, |bucket| bucket.len()))
    }

    fn insert_edge(&self, edge: &RecommendationEdge) -> Result<()> {
        let key = edge_key(&edge.source_type, &edge.source_id, &edge.recommendation_name);
        let mut stored = write(&self.edges)?;
        Self::insert_into(stored.entry(key).or_default(), edge)
    }

    fn edges_for(&self, query: &EdgeQuery) -> Result<Vec<RecommendationEdge>> {
        let key = edge_key(&query.source_type, &query.source_id, &query.recommendation_name);
        let mut matched: Vec<RecommendationEdge> = read(&self.edges)?
            .get(&key)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|e| e.target_type == query.target_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matched.sort_by(|a, b| b.rank.total_cmp(&a.rank));
        Ok(matched)
    }

    fn edge_count(&self) -> Result<usize> {
        Ok(read(&self.edges)?.values().map(Vec::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_core::types::{Attributes, Relation};

    fn edge(source: &str, target: &str, rank: f64) -> RecommendationEdge {
        RecommendationEdge {
            source_type: "product".into(),
            source_id: RecordId::new(source),
            target_type: "product".into(),
            target_id: RecordId::new(target),
            recommendation_name: "similar".into(),
            rank,
        }
    }

    fn query(source: &str) -> EdgeQuery {
        EdgeQuery {
            source_type: "product".into(),
            source_id: RecordId::new(source),
            recommendation_name: "similar".into(),
            target_type: "product".into(),
        }
    }

    #[test]
    fn edges_come_back_rank_descending() {
        let store = MemoryStore::new();
        store.insert_edge(&edge("1", "a", 1.0)).unwrap();
        store.insert_edge(&edge("1", "b", 5.0)).unwrap();
        store.insert_edge(&edge("1", "c", 1.0)).unwrap();
        store.insert_edge(&edge("2", "d", 9.0)).unwrap();

        let ids: Vec<String> = store
            .edges_for(&query("1"))
            .unwrap()
            .into_iter()
            .map(|e| e.target_id.0)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let store = MemoryStore::new();
        store.insert_edge(&edge("1", "a", 1.0)).unwrap();
        let err = store.insert_edge(&edge("1", "a", 2.0)).unwrap_err();
        assert!(matches!(err, AffinityError::DuplicateEdge { .. }));
    }

    #[test]
    fn delete_and_empty_replace_drop_the_bucket() {
        let store = MemoryStore::new();
        store.insert_edge(&edge("1", "a", 1.0)).unwrap();
        store.insert_edge(&edge("1", "b", 1.0)).unwrap();
        store.insert_edge(&edge("2", "a", 1.0)).unwrap();

        assert_eq!(store.delete_edges("product", &RecordId::new("1"), "similar").unwrap(), 2);
        assert_eq!(store.delete_edges("product", &RecordId::new("1"), "similar").unwrap(), 0);

        store.replace_edges("product", &RecordId::new("2"), "similar", &[]).unwrap();
        assert_eq!(store.edge_count().unwrap(), 0);
        assert!(store.edges().unwrap().is_empty());
    }

    #[test]
    fn replace_rejects_edges_of_another_source() {
        let store = MemoryStore::new();
        store.insert_edge(&edge("1", "a", 1.0)).unwrap();

        let err = store
            .replace_edges("product", &RecordId::new("1"), "similar", &[edge("2", "z", 1.0)])
            .unwrap_err();
        assert!(matches!(err, AffinityError::Storage(_)));
        assert_eq!(store.edges_for(&query("1")).unwrap()[0].target_id.as_str(), "a");
    }

    #[test]
    fn replace_only_touches_one_source() {
        let store = MemoryStore::new();
        store.insert_edge(&edge("1", "a", 1.0)).unwrap();
        store.insert_edge(&edge("2", "a", 1.0)).unwrap();

        store
            .replace_edges("product", &RecordId::new("1"), "similar", &[edge("1", "z", 3.0)])
            .unwrap();

        assert_eq!(store.edge_count().unwrap(), 2);
        assert_eq!(store.edges_for(&query("1")).unwrap()[0].target_id.as_str(), "z");
        assert_eq!(store.edges_for(&query("2")).unwrap()[0].target_id.as_str(), "a");
    }

    #[test]
    fn failed_replace_leaves_old_edges() {
        let store = MemoryStore::new();
        store.insert_edge(&edge("1", "a", 1.0)).unwrap();

        let result = store.replace_edges(
            "product",
            &RecordId::new("1"),
            "similar",
            &[edge("1", "z", 3.0), edge("1", "z", 2.0)],
        );
        assert!(result.is_err());
        assert_eq!(store.edges_for(&query("1")).unwrap()[0].target_id.as_str(), "a");
    }

    #[test]
    fn find_many_strips_relations_and_load_restores() {
        let store = MemoryStore::new();
        store
            .add_record(
                "product",
                Record::new("1").with_relation("brand", Relation::One(Attributes::new().with("name", "Acme"))),
            )
            .unwrap();

        let mut found = store.find_many("product", &[RecordId::new("1"), RecordId::new("9")]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].relation("brand").is_none());

        store
            .load_relations("product", &mut found, &["brand".to_string()])
            .unwrap();
        assert!(found[0].relation("brand").is_some());
    }

    #[test]
    fn observations_apply_filters_and_skip_nulls() {
        let store = MemoryStore::new();
        store
            .add_row("order_items", [("order_id", FieldValue::from(1)), ("product_id", 10.into()), ("status", "paid".into())])
            .unwrap();
        store
            .add_row("order_items", [("order_id", FieldValue::from(1)), ("product_id", 11.into()), ("status", "void".into())])
            .unwrap();
        store
            .add_row("order_items", [("order_id", FieldValue::Null), ("product_id", 12.into()), ("status", "paid".into())])
            .unwrap();

        let query = ObservationQuery::new("order_items", "order_id", "product_id").with_filter("status", "paid");
        let rows = store.observations(&query).unwrap();
        assert_eq!(rows, vec![Observation::new("1", "10")]);
    }
}
