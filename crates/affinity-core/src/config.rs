//! Named recommendation configuration.
//!
//! Each entity kind owns a set of named recommendation configurations.
//! Keys mirror the option names used in configuration files, so a TOML
//! table deserializes straight into [`RecommendationConfig`].

use crate::error::Result;
use crate::store::ConfigSource;
use crate::types::{FieldValue, TaxonomySource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fallback for `recommendation_count` when neither the set nor the
/// registry provides one.
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

/// Upper bound assumed for numeric min-max normalization.
pub const DEFAULT_NUMERIC_HIGH_RANGE: f64 = 1000.0;

/// Which algorithm produces the ranked lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Algorithm {
    /// Co-occurrence of values within groups of a data table.
    #[default]
    DbRelation,
    /// Weighted attribute similarity between all records of a kind.
    Similarity,
    /// Anything else; generation yields an empty set.
    Unknown(String),
}

impl From<String> for Algorithm {
    fn from(s: String) -> Self {
        match s.as_str() {
            "db_relation" => Algorithm::DbRelation,
            "similarity" => Algorithm::Similarity,
            _ => Algorithm::Unknown(s),
        }
    }
}

impl From<Algorithm> for String {
    fn from(a: Algorithm) -> Self {
        match a {
            Algorithm::DbRelation => "db_relation".to_string(),
            Algorithm::Similarity => "similarity".to_string(),
            Algorithm::Unknown(s) => s,
        }
    }
}

/// Ordering applied to targets at retrieval time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecommendationOrder {
    /// Highest rank first. Unrecognized values fall back to this.
    #[default]
    Desc,
    /// Lowest rank first.
    Asc,
    /// Fresh shuffle on every call.
    Random,
}

impl From<String> for RecommendationOrder {
    fn from(s: String) -> Self {
        match s.as_str() {
            "asc" => RecommendationOrder::Asc,
            "random" => RecommendationOrder::Random,
            _ => RecommendationOrder::Desc,
        }
    }
}

impl From<RecommendationOrder> for String {
    fn from(o: RecommendationOrder) -> Self {
        match o {
            RecommendationOrder::Desc => "desc",
            RecommendationOrder::Asc => "asc",
            RecommendationOrder::Random => "random",
        }
        .to_string()
    }
}

/// One named recommendation set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default)]
    pub recommendation_algorithm: Algorithm,

    // Co-occurrence source selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_data_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_group_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_data_field: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recommendation_data_table_filter: BTreeMap<String, FieldValue>,

    /// Target kind; defaults to the source kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_data_field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_count: Option<usize>,
    #[serde(default)]
    pub recommendation_order: RecommendationOrder,

    // Similarity scoring
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similarity_feature_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similarity_numeric_value_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similarity_taxonomy_attributes: Vec<TaxonomySource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_feature_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_numeric_value_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_taxonomy_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_numeric_value_high_range: Option<f64>,
}

impl RecommendationConfig {
    /// Co-occurrence set over `table`, grouping `data_field` by `group_field`.
    pub fn db_relation(
        table: impl Into<String>,
        group_field: impl Into<String>,
        data_field: impl Into<String>,
    ) -> Self {
        Self {
            recommendation_algorithm: Algorithm::DbRelation,
            recommendation_data_table: Some(table.into()),
            recommendation_group_field: Some(group_field.into()),
            recommendation_data_field: Some(data_field.into()),
            ..Self::default()
        }
    }

    /// Similarity set with no attributes configured yet.
    pub fn similarity() -> Self {
        Self {
            recommendation_algorithm: Algorithm::Similarity,
            ..Self::default()
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.recommendation_count = Some(count);
        self
    }

    pub fn with_order(mut self, order: RecommendationOrder) -> Self {
        self.recommendation_order = order;
        self
    }

    pub fn with_target_type(mut self, kind: impl Into<String>) -> Self {
        self.recommendation_data_field_type = Some(kind.into());
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.recommendation_data_table_filter.insert(field.into(), value.into());
        self
    }

    /// Target kind for edges generated from a source of `source_kind`.
    pub fn target_type<'a>(&'a self, source_kind: &'a str) -> &'a str {
        self.recommendation_data_field_type
            .as_deref()
            .unwrap_or(source_kind)
    }

    /// Maximum targets per source.
    pub fn count(&self, default_count: usize) -> usize {
        self.recommendation_count.unwrap_or(default_count)
    }

    /// Scoring parameters with defaults applied.
    pub fn similarity_settings(&self) -> SimilaritySettings {
        SimilaritySettings {
            feature_attributes: self.similarity_feature_attributes.clone(),
            numeric_attributes: self.similarity_numeric_value_attributes.clone(),
            taxonomy_sources: self.similarity_taxonomy_attributes.clone(),
            feature_weight: self.similarity_feature_weight.unwrap_or(1.0),
            numeric_weight: self.similarity_numeric_value_weight.unwrap_or(1.0),
            taxonomy_weight: self.similarity_taxonomy_weight.unwrap_or(1.0),
            numeric_high_range: self
                .similarity_numeric_value_high_range
                .unwrap_or(DEFAULT_NUMERIC_HIGH_RANGE),
        }
    }
}

/// Resolved similarity parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilaritySettings {
    pub feature_attributes: Vec<String>,
    pub numeric_attributes: Vec<String>,
    pub taxonomy_sources: Vec<TaxonomySource>,
    pub feature_weight: f64,
    pub numeric_weight: f64,
    pub taxonomy_weight: f64,
    pub numeric_high_range: f64,
}

impl Default for SimilaritySettings {
    fn default() -> Self {
        RecommendationConfig::similarity().similarity_settings()
    }
}

impl SimilaritySettings {
    /// Relations the taxonomy sources read; these must be loaded on records.
    pub fn required_relations(&self) -> Vec<String> {
        let mut relations: Vec<String> = Vec::new();
        for source in &self.taxonomy_sources {
            if let Some(rel) = source.relation() {
                if !relations.iter().any(|r| r == rel) {
                    relations.push(rel.to_string());
                }
            }
        }
        relations
    }
}

fn default_count() -> usize {
    DEFAULT_RECOMMENDATION_COUNT
}

/// All named recommendation sets, grouped by source kind.
///
/// ```toml
/// default_count = 10
///
/// [kinds.product.bought_together]
/// recommendation_data_table = "order_items"
/// recommendation_group_field = "order_id"
/// recommendation_data_field = "product_id"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRegistry {
    #[serde(default = "default_count")]
    pub default_count: usize,
    #[serde(default)]
    pub kinds: BTreeMap<String, BTreeMap<String, RecommendationConfig>>,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            kinds: BTreeMap::new(),
        }
    }
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count;
        self
    }

    /// Register (or replace) a named set for `kind`.
    pub fn with_set(
        mut self,
        kind: impl Into<String>,
        name: impl Into<String>,
        config: RecommendationConfig,
    ) -> Self {
        self.insert(kind, name, config);
        self
    }

    pub fn insert(
        &mut self,
        kind: impl Into<String>,
        name: impl Into<String>,
        config: RecommendationConfig,
    ) {
        self.kinds
            .entry(kind.into())
            .or_default()
            .insert(name.into(), config);
    }

    /// `(kind, name)` of every configured set.
    pub fn set_names(&self) -> Vec<(String, String)> {
        self.kinds
            .iter()
            .flat_map(|(kind, sets)| sets.keys().map(move |name| (kind.clone(), name.clone())))
            .collect()
    }
}

impl ConfigSource for ConfigRegistry {
    fn recommendation(&self, kind: &str, name: &str) -> Option<RecommendationConfig> {
        self.kinds.get(kind)?.get(name).cloned()
    }

    fn default_count(&self) -> usize {
        self.default_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_count = 5

[kinds.product.bought_together]
recommendation_data_table = "order_items"
recommendation_group_field = "order_id"
recommendation_data_field = "product_id"
recommendation_data_table_filter = { status = "paid" }
recommendation_count = 3

[kinds.product.similar]
recommendation_algorithm = "similarity"
recommendation_order = "random"
similarity_feature_attributes = ["color", "size"]
similarity_numeric_value_attributes = ["price"]
similarity_taxonomy_attributes = [
    { kind = "collection_related", field = "tags", subfield = "name" },
    { kind = "single_related", field = "brand", subfield = "name" },
    { kind = "scalar", field = "season" },
]
similarity_taxonomy_weight = 2.0

[kinds.product.mystery]
recommendation_algorithm = "neural"
recommendation_order = "sideways"
"#;

    #[test]
    fn parses_named_sets() {
        let registry = ConfigRegistry::from_toml_str(SAMPLE).unwrap();
        assert_eq!(registry.default_count(), 5);

        let bought = registry.recommendation("product", "bought_together").unwrap();
        assert_eq!(bought.recommendation_algorithm, Algorithm::DbRelation);
        assert_eq!(bought.count(registry.default_count()), 3);
        assert_eq!(
            bought.recommendation_data_table_filter.get("status"),
            Some(&FieldValue::Text("paid".into()))
        );
        assert_eq!(bought.target_type("product"), "product");
    }

    #[test]
    fn similarity_defaults_apply() {
        let registry = ConfigRegistry::from_toml_str(SAMPLE).unwrap();
        let similar = registry.recommendation("product", "similar").unwrap();
        let settings = similar.similarity_settings();

        assert_eq!(similar.recommendation_order, RecommendationOrder::Random);
        assert_eq!(settings.feature_weight, 1.0);
        assert_eq!(settings.taxonomy_weight, 2.0);
        assert_eq!(settings.numeric_high_range, 1000.0);
        assert_eq!(settings.required_relations(), vec!["tags", "brand"]);
        assert_eq!(similar.count(registry.default_count()), 5);
    }

    #[test]
    fn unknown_values_are_kept_soft() {
        let registry = ConfigRegistry::from_toml_str(SAMPLE).unwrap();
        let mystery = registry.recommendation("product", "mystery").unwrap();
        assert_eq!(
            mystery.recommendation_algorithm,
            Algorithm::Unknown("neural".into())
        );
        assert_eq!(mystery.recommendation_order, RecommendationOrder::Desc);
    }

    #[test]
    fn missing_set_is_none() {
        let registry = ConfigRegistry::from_toml_str(SAMPLE).unwrap();
        assert!(registry.recommendation("product", "nope").is_none());
        assert!(registry.recommendation("user", "similar").is_none());
    }

    #[test]
    fn builder_round_trips_through_toml() {
        let registry = ConfigRegistry::new().with_set(
            "article",
            "related",
            RecommendationConfig::db_relation("views", "session_id", "article_id")
                .with_count(4)
                .with_target_type("article"),
        );
        let text = toml::to_string(&registry).unwrap();
        let parsed = ConfigRegistry::from_toml_str(&text).unwrap();
        assert_eq!(parsed, registry);
    }
}
