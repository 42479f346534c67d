//! SQLite-backed edge store and observation source.
//!
//! Edges live in a `recommendations` table with a unique key over
//! (source_type, source_id, target_type, recommendation_name, target_id).
//! Replacing a source's edges runs in one transaction. Observation tables
//! are whatever the application keeps in the same database; their names
//! come from configuration and are validated before being spliced into SQL.

#![cfg(feature = "sqlite")]

use affinity_core::error::{AffinityError, Result};
use affinity_core::store::{EdgeQuery, EdgeStore, ObservationQuery, ObservationSource};
use affinity_core::types::{FieldValue, Observation, RecommendationEdge, RecordId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed edge store.
///
/// Supports both in-memory and file-backed databases.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Edge totals for one persisted recommendation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStats {
    pub source_type: String,
    pub recommendation_name: String,
    pub sources: usize,
    pub edges: usize,
}

fn sql_error(e: rusqlite::Error) -> AffinityError {
    AffinityError::Storage(e.to_string())
}

fn edge_error(e: rusqlite::Error, edge: &RecommendationEdge) -> AffinityError {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            AffinityError::DuplicateEdge {
                source_type: edge.source_type.clone(),
                source_id: edge.source_id.to_string(),
                target_type: edge.target_type.clone(),
                target_id: edge.target_id.to_string(),
                recommendation_name: edge.recommendation_name.clone(),
            }
        }
        _ => sql_error(e),
    }
}

/// Quote a table or column name, rejecting anything but `[A-Za-z_][A-Za-z0-9_]*`.
pub fn quote_identifier(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(AffinityError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
        FieldValue::Int(n) => Value::Integer(*n),
        FieldValue::Float(x) => Value::Real(*x),
        FieldValue::Text(s) => Value::Text(s.clone()),
    }
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(n) => Some(n.to_string()),
        Value::Real(x) => Some(x.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

const INSERT_EDGE: &str = "INSERT INTO recommendations
    (source_type, source_id, target_type, target_id, recommendation_name, order_column)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const DELETE_EDGES: &str = "DELETE FROM recommendations
    WHERE source_type = ?1 AND source_id = ?2 AND recommendation_name = ?3";

impl SqliteStore {
    /// Create a new in-memory SQLite store.
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_error)?;
        Self::init_with_connection(conn)
    }

    /// Create or open a file-backed SQLite store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(sql_error)?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        // WAL keeps readers going while a regeneration commits
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(sql_error)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS recommendations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_type TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_type TEXT NOT NULL,
                target_id TEXT NOT NULL,
                recommendation_name TEXT NOT NULL,
                order_column REAL NOT NULL,
                UNIQUE (source_type, source_id, target_type, recommendation_name, target_id)
            );

            CREATE INDEX IF NOT EXISTS idx_recommendations_source
                ON recommendations(source_type, source_id, recommendation_name);
            "#,
        )
        .map_err(sql_error)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AffinityError::storage("sqlite connection lock poisoned"))
    }

    /// Run `f` against the underlying connection, e.g. to create and fill
    /// observation tables.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        f(&conn).map_err(sql_error)
    }

    /// Per-set totals, ordered by source type then set name.
    pub fn set_stats(&self) -> Result<Vec<SetStats>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT source_type, recommendation_name, COUNT(DISTINCT source_id), COUNT(*)
                 FROM recommendations
                 GROUP BY source_type, recommendation_name
                 ORDER BY source_type, recommendation_name",
            )
            .map_err(sql_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SetStats {
                    source_type: row.get(0)?,
                    recommendation_name: row.get(1)?,
                    sources: row.get(2)?,
                    edges: row.get(3)?,
                })
            })
            .map_err(sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sql_error)
    }
}

impl ObservationSource for SqliteStore {
    fn observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>> {
        let mut sql = format!(
            "SELECT {} AS group_field, {} AS data_field FROM {}",
            quote_identifier(&query.group_field)?,
            quote_identifier(&query.data_field)?,
            quote_identifier(&query.table)?,
        );

        let mut clauses = Vec::with_capacity(query.filters.len());
        let mut values = Vec::with_capacity(query.filters.len());
        for (i, (field, value)) in query.filters.iter().enumerate() {
            clauses.push(format!("{} = ?{}", quote_identifier(field)?, i + 1));
            values.push(to_sql_value(value));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
            })
            .map_err(sql_error)?;

        let mut observations = Vec::new();
        for row in rows {
            let (group, data) = row.map_err(sql_error)?;
            // NULL group or data values never form an observation.
            if let (Some(group), Some(data)) = (value_text(group), value_text(data)) {
                observations.push(Observation { group, data });
            }
        }
        Ok(observations)
    }
}

impl EdgeStore for SqliteStore {
    fn replace_edges(
        &self,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
        edges: &[RecommendationEdge],
    ) -> Result<()> {
        if let Some(edge) = edges
            .iter()
            .find(|e| !e.belongs_to(source_type, source_id, recommendation_name))
        {
            return Err(AffinityError::foreign_edge(edge, source_type, source_id, recommendation_name));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sql_error)?;

        tx.execute(DELETE_EDGES, params![source_type, source_id.as_str(), recommendation_name])
            .map_err(sql_error)?;

        {
            let mut insert = tx.prepare_cached(INSERT_EDGE).map_err(sql_error)?;
            for edge in edges {
                insert
                    .execute(params![
                        edge.source_type,
                        edge.source_id.as_str(),
                        edge.target_type,
                        edge.target_id.as_str(),
                        edge.recommendation_name,
                        edge.rank,
                    ])
                    .map_err(|e| edge_error(e, edge))?;
            }
        }

        tx.commit().map_err(sql_error)
    }

    fn delete_edges(
        &self,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
    ) -> Result<usize> {
        let conn = self.lock()?;
        conn.execute(DELETE_EDGES, params![source_type, source_id.as_str(), recommendation_name])
            .map_err(sql_error)
    }

    fn insert_edge(&self, edge: &RecommendationEdge) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            INSERT_EDGE,
            params![
                edge.source_type,
                edge.source_id.as_str(),
                edge.target_type,
                edge.target_id.as_str(),
                edge.recommendation_name,
                edge.rank,
            ],
        )
        .map_err(|e| edge_error(e, edge))?;
        Ok(())
    }

    fn edges_for(&self, query: &EdgeQuery) -> Result<Vec<RecommendationEdge>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT source_type, source_id, target_type, target_id, recommendation_name, order_column
                 FROM recommendations
                 WHERE source_type = ?1 AND source_id = ?2
                   AND recommendation_name = ?3 AND target_type = ?4
                 ORDER BY order_column DESC, id ASC",
            )
            .map_err(sql_error)?;

        let edges = stmt
            .query_map(
                params![
                    query.source_type,
                    query.source_id.as_str(),
                    query.recommendation_name,
                    query.target_type,
                ],
                |row| {
                    Ok(RecommendationEdge {
                        source_type: row.get(0)?,
                        source_id: RecordId(row.get(1)?),
                        target_type: row.get(2)?,
                        target_id: RecordId(row.get(3)?),
                        recommendation_name: row.get(4)?,
                        rank: row.get(5)?,
                    })
                },
            )
            .map_err(sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error)?;

        Ok(edges)
    }

    fn edge_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM recommendations", [], |row| row.get(0))
            .map_err(sql_error)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str, rank: f64) -> RecommendationEdge {
        RecommendationEdge {
            source_type: "product".into(),
            source_id: RecordId::new(source),
            target_type: "product".into(),
            target_id: RecordId::new(target),
            recommendation_name: "bought_together".into(),
            rank,
        }
    }

    fn query(source: &str) -> EdgeQuery {
        EdgeQuery {
            source_type: "product".into(),
            source_id: RecordId::new(source),
            recommendation_name: "bought_together".into(),
            target_type: "product".into(),
        }
    }

    #[test]
    fn create_in_memory() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert_eq!(store.edge_count().unwrap(), 0);
    }

    #[test]
    fn identifiers_are_validated() {
        assert_eq!(quote_identifier("order_items").unwrap(), "\"order_items\"");
        assert!(quote_identifier("items; DROP TABLE x").is_err());
        assert!(quote_identifier("1abc").is_err());
        assert!(quote_identifier("").is_err());
    }

    #[test]
    fn replace_and_read_back_in_rank_order() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_edge(&edge("1", "old", 9.0)).unwrap();

        store
            .replace_edges(
                "product",
                &RecordId::new("1"),
                "bought_together",
                &[edge("1", "a", 1.0), edge("1", "b", 4.0), edge("1", "c", 1.0)],
            )
            .unwrap();

        let ids: Vec<String> = store
            .edges_for(&query("1"))
            .unwrap()
            .into_iter()
            .map(|e| e.target_id.0)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn observations_read_from_views() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TABLE order_items (order_id INTEGER, product_id INTEGER, status TEXT);
                     INSERT INTO order_items VALUES (1, 10, 'paid'), (1, 11, 'paid'), (2, 12, 'void');
                     CREATE VIEW paid_items AS
                        SELECT order_id, product_id FROM order_items WHERE status = 'paid';",
                )
            })
            .unwrap();

        let rows = store
            .observations(&ObservationQuery::new("paid_items", "order_id", "product_id"))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|o| o.group == "1"));
    }

    #[test]
    fn observations_read_from_without_rowid_tables() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TABLE basket (order_id INTEGER, product_id INTEGER,
                        PRIMARY KEY (order_id, product_id)) WITHOUT ROWID;
                     INSERT INTO basket VALUES (1, 10), (1, 11);",
                )
            })
            .unwrap();

        let rows = store
            .observations(&ObservationQuery::new("basket", "order_id", "product_id"))
            .unwrap();
        assert_eq!(rows, vec![Observation::new("1", "10"), Observation::new("1", "11")]);
    }

    #[test]
    fn non_unique_constraint_failures_are_storage_errors() {
        let store = SqliteStore::new_in_memory().unwrap();
        // SQLite stores a NaN double as NULL, which the NOT NULL rank rejects
        let err = store.insert_edge(&edge("1", "a", f64::NAN)).unwrap_err();
        assert!(matches!(err, AffinityError::Storage(_)), "{err:?}");
    }

    #[test]
    fn set_stats_group_by_set() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .replace_edges("product", &RecordId::new("1"), "bought_together", &[edge("1", "a", 2.0), edge("1", "b", 1.0)])
            .unwrap();
        store
            .replace_edges("product", &RecordId::new("2"), "bought_together", &[edge("2", "a", 1.0)])
            .unwrap();

        let stats = store.set_stats().unwrap();
        assert_eq!(
            stats,
            vec![SetStats {
                source_type: "product".into(),
                recommendation_name: "bought_together".into(),
                sources: 2,
                edges: 3,
            }]
        );
    }

    #[test]
    fn duplicate_insert_rolls_back_replace() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_edge(&edge("1", "keep", 2.0)).unwrap();

        let err = store
            .replace_edges(
                "product",
                &RecordId::new("1"),
                "bought_together",
                &[edge("1", "x", 1.0), edge("1", "x", 1.0)],
            )
            .unwrap_err();
        assert!(matches!(err, AffinityError::DuplicateEdge { .. }));

        let edges = store.edges_for(&query("1")).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id.as_str(), "keep");
    }

    #[test]
    fn observations_from_table_with_filters() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TABLE order_items (order_id INTEGER, product_id INTEGER, status TEXT);
                     INSERT INTO order_items VALUES (1, 10, 'paid'), (1, 11, 'paid'),
                                                    (2, 10, 'void'), (3, NULL, 'paid');",
                )
            })
            .unwrap();

        let query = ObservationQuery::new("order_items", "order_id", "product_id")
            .with_filter("status", "paid");
        let rows = store.observations(&query).unwrap();
        assert_eq!(rows, vec![Observation::new("1", "10"), Observation::new("1", "11")]);
    }

    #[test]
    fn bad_table_name_is_rejected() {
        let store = SqliteStore::new_in_memory().unwrap();
        let query = ObservationQuery::new("x; DROP TABLE recommendations", "a", "b");
        assert!(matches!(
            store.observations(&query),
            Err(AffinityError::InvalidIdentifier(_))
        ));
    }
}
