//! Configuration management for the Affinity CLI.

use affinity::prelude::*;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_FILE: &str = "affinity.toml";

/// Affinity project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub recommendations: ConfigRegistry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file holding edges and observation tables.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// JSON record catalogue, keyed by kind.
    #[serde(default = "default_records")]
    pub records: PathBuf,
}

// Default value functions
fn default_database() -> PathBuf { PathBuf::from(".affinity/affinity.db") }
fn default_records() -> PathBuf { PathBuf::from("records.json") }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            records: default_records(),
        }
    }
}

const EXAMPLE_SETS: &str = r#"
# Example recommendation sets:
#
# [recommendations.kinds.product.bought_together]
# recommendation_data_table = "order_items"
# recommendation_group_field = "order_id"
# recommendation_data_field = "product_id"
# recommendation_data_table_filter = { status = "paid" }
# recommendation_count = 5
#
# [recommendations.kinds.product.similar]
# recommendation_algorithm = "similarity"
# recommendation_order = "random"
# similarity_feature_attributes = ["color", "size"]
# similarity_numeric_value_attributes = ["price"]
# similarity_taxonomy_attributes = [
#     { kind = "collection_related", field = "tags", subfield = "name" },
# ]
"#;

impl Config {
    /// Load config from affinity.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Config as TOML, followed by commented example sets.
    pub fn to_toml(&self) -> Result<String> {
        let mut content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        content.push_str(EXAMPLE_SETS);
        Ok(content)
    }

    /// Open the SQLite edge store, creating its directory if needed.
    pub fn open_store(&self) -> Result<Arc<SqliteStore>> {
        if let Some(parent) = self.store.database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let store = SqliteStore::open(&self.store.database)
            .with_context(|| format!("Failed to open {}", self.store.database.display()))?;
        Ok(Arc::new(store))
    }

    /// Load the record catalogue; a missing file is an empty catalogue.
    pub fn load_records(&self) -> Result<Arc<MemoryStore>> {
        let store = MemoryStore::new();
        if self.store.records.exists() {
            let content = std::fs::read_to_string(&self.store.records)
                .with_context(|| format!("Failed to read {}", self.store.records.display()))?;
            fill_records(&store, &content)
                .with_context(|| format!("Failed to parse {}", self.store.records.display()))?;
        }
        Ok(Arc::new(store))
    }

    /// Engine wired to the configured SQLite store and record catalogue.
    pub fn engine(&self) -> Result<(EngineContext, Arc<SqliteStore>)> {
        let store = self.open_store()?;
        let records = self.load_records()?;
        let ctx = EngineContext::new(
            Arc::new(self.recommendations.clone()),
            store.clone(),
            records,
            store.clone(),
        );
        Ok((ctx, store))
    }
}

/// Add every record of a `{ "<kind>": [record, ...] }` document to `store`.
pub fn fill_records(store: &MemoryStore, json: &str) -> Result<usize> {
    let catalogue: BTreeMap<String, Vec<Record>> = serde_json::from_str(json)?;
    let mut count = 0;
    for (kind, records) in catalogue {
        count += records.len();
        store.add_records(&kind, records)?;
    }
    Ok(count)
}

/// Find affinity.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Get the Affinity data directory (.affinity/).
pub fn data_dir(base: &Path) -> PathBuf {
    base.join(".affinity")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let text = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.store.database, default_database());
        assert!(parsed.recommendations.kinds.is_empty());
    }

    #[test]
    fn example_sets_parse_when_uncommented() {
        let uncommented: String = EXAMPLE_SETS
            .lines()
            .filter(|l| l.starts_with("# ") && !l.starts_with("# Example"))
            .map(|l| format!("{}\n", &l[2..]))
            .collect();
        let config: Config = toml::from_str(&uncommented).unwrap();
        let set = config
            .recommendations
            .recommendation("product", "similar")
            .unwrap();
        assert_eq!(set.recommendation_algorithm, Algorithm::Similarity);
    }

    #[test]
    fn records_catalogue_loads_by_kind() {
        let store = MemoryStore::new();
        let count = fill_records(
            &store,
            r#"{"product": [{"id": 1, "attributes": {"color": "red"}}, {"id": 2}],
                "user": [{"id": "u1"}]}"#,
        )
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.record_count("product").unwrap(), 2);
    }

    #[test]
    fn engine_opens_store_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store: StoreConfig {
                database: data_dir(dir.path()).join("affinity.db"),
                records: dir.path().join("missing.json"),
            },
            recommendations: ConfigRegistry::new(),
        };
        let (_, store) = config.engine().unwrap();
        assert_eq!(store.edge_count().unwrap(), 0);
    }
}
