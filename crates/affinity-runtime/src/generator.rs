//! Recommendation generation.
//!
//! Resolves a named set, runs the configured algorithm and replaces the
//! persisted edges of every source it produced a list for.

use crate::context::EngineContext;
use crate::cooccurrence::rank_cooccurrences;
use crate::similarity_matrix::rank_similarities;
use affinity_core::config::{Algorithm, RecommendationConfig};
use affinity_core::error::{AffinityError, Result};
use affinity_core::store::ObservationQuery;
use affinity_core::types::{RankedList, RecommendationEdge};

/// Outcome of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub recommendation_name: String,
    pub algorithm: Algorithm,
    /// Sources whose edges were replaced.
    pub sources: usize,
    /// Edges inserted across all sources.
    pub edges: usize,
}

/// Generates recommendation sets for one source kind.
pub struct Generator {
    kind: String,
    ctx: EngineContext,
}

impl Generator {
    pub fn new(kind: impl Into<String>, ctx: EngineContext) -> Self {
        Self {
            kind: kind.into(),
            ctx,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Generate and persist the set `name`.
    ///
    /// Failures are reported to the diagnostics sink and swallowed; a
    /// missing configuration aborts before any edge is touched.
    pub fn generate_recommendations(&self, name: &str) {
        let log = &self.ctx.diagnostics;
        log.info(&format!("Started generating recommendation for {name}"));

        match self.try_generate(name) {
            Ok(summary) => log.info(&format!(
                "Finished generating recommendation for {name} ({} sources, {} edges)",
                summary.sources, summary.edges
            )),
            Err(e) => log.error(&format!("Generating recommendation for {name} failed: {e}")),
        }
    }

    /// Generate and persist the set `name`, returning what was written.
    pub fn try_generate(&self, name: &str) -> Result<GenerationSummary> {
        let config = self
            .ctx
            .config
            .recommendation(&self.kind, name)
            .ok_or_else(|| AffinityError::configuration_missing(&self.kind, name))?;

        let lists = self.rank(name, &config)?;
        let target_type = config.target_type(&self.kind);

        let mut edges_written = 0;
        for list in &lists {
            let edges: Vec<RecommendationEdge> = list
                .targets
                .iter()
                .map(|target| RecommendationEdge {
                    source_type: self.kind.clone(),
                    source_id: list.source.clone(),
                    target_type: target_type.to_string(),
                    target_id: target.id.clone(),
                    recommendation_name: name.to_string(),
                    rank: target.rank,
                })
                .collect();

            self.ctx
                .edges
                .replace_edges(&self.kind, &list.source, name, &edges)?;
            edges_written += edges.len();
        }

        Ok(GenerationSummary {
            recommendation_name: name.to_string(),
            algorithm: config.recommendation_algorithm.clone(),
            sources: lists.len(),
            edges: edges_written,
        })
    }

    /// Run the configured algorithm without persisting anything.
    pub fn rank(&self, name: &str, config: &RecommendationConfig) -> Result<Vec<RankedList>> {
        let log = &self.ctx.diagnostics;
        let limit = config.count(self.ctx.config.default_count());

        match &config.recommendation_algorithm {
            Algorithm::DbRelation => {
                log.info("The algorithm is db_relation");
                let query = ObservationQuery::from_config(config).ok_or_else(|| {
                    AffinityError::Config(format!(
                        "'{name}' needs recommendation_data_table, recommendation_group_field \
                         and recommendation_data_field"
                    ))
                })?;
                let observations = self.ctx.observations.observations(&query)?;
                log.info(&format!(
                    "Fetched {} observations from {}",
                    observations.len(),
                    query.table
                ));
                Ok(rank_cooccurrences(&observations, limit))
            }
            Algorithm::Similarity => {
                log.info("The algorithm is similarity");
                let settings = config.similarity_settings();
                let records = self
                    .ctx
                    .records
                    .all(&self.kind, &settings.required_relations())?;
                log.info(&format!("Scoring {} {} records", records.len(), self.kind));
                Ok(rank_similarities(&records, &settings, limit))
            }
            Algorithm::Unknown(other) => {
                log.warn(&format!("Unknown recommendation algorithm '{other}' for {name}"));
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use affinity_core::config::{ConfigRegistry, RecommendationConfig};
    use affinity_core::diagnostics::{Level, MemoryDiagnostics};
    use affinity_core::store::EdgeStore;
    use affinity_core::types::{Record, RecordId};
    use std::sync::Arc;

    fn orders(store: &MemoryStore) {
        for (order, product) in [(1, 10), (1, 11), (1, 12), (2, 10), (2, 11)] {
            store
                .add_row("order_items", [("order_id", order), ("product_id", product)])
                .unwrap();
        }
    }

    fn setup(config: ConfigRegistry) -> (Generator, Arc<MemoryStore>, Arc<MemoryDiagnostics>) {
        let store = Arc::new(MemoryStore::new());
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let ctx = EngineContext::in_memory(config, store.clone()).with_diagnostics(diagnostics.clone());
        (Generator::new("product", ctx), store, diagnostics)
    }

    #[test]
    fn cooccurrence_edges_are_persisted() {
        let config = ConfigRegistry::new().with_set(
            "product",
            "bought_together",
            RecommendationConfig::db_relation("order_items", "order_id", "product_id").with_count(2),
        );
        let (generator, store, _) = setup(config);
        orders(&store);

        let summary = generator.try_generate("bought_together").unwrap();
        assert_eq!(summary.sources, 3);
        assert_eq!(summary.edges, 6);

        let edges = store.edges().unwrap();
        let from_10: Vec<(&str, f64)> = edges
            .iter()
            .filter(|e| e.source_id.as_str() == "10")
            .map(|e| (e.target_id.as_str(), e.rank))
            .collect();
        assert_eq!(from_10, vec![("11", 2.0), ("12", 1.0)]);
        assert!(edges.iter().all(|e| e.target_type == "product"));
    }

    #[test]
    fn missing_configuration_touches_nothing() {
        let (generator, store, diagnostics) = setup(ConfigRegistry::new());
        store
            .insert_edge(&RecommendationEdge {
                source_type: "product".into(),
                source_id: RecordId::new("1"),
                target_type: "product".into(),
                target_id: RecordId::new("2"),
                recommendation_name: "ghost".into(),
                rank: 1.0,
            })
            .unwrap();

        generator.generate_recommendations("ghost");

        assert_eq!(store.edge_count().unwrap(), 1);
        let errors = diagnostics.messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("No configuration"));
    }

    #[test]
    fn unknown_algorithm_yields_empty_set() {
        let mut config = RecommendationConfig::default();
        config.recommendation_algorithm = Algorithm::Unknown("neural".into());
        let (generator, store, diagnostics) =
            setup(ConfigRegistry::new().with_set("product", "fancy", config));

        let summary = generator.try_generate("fancy").unwrap();
        assert_eq!(summary.sources, 0);
        assert_eq!(store.edge_count().unwrap(), 0);
        assert_eq!(diagnostics.messages(Level::Warn).len(), 1);
    }

    #[test]
    fn incomplete_db_relation_config_is_an_error() {
        let mut config = RecommendationConfig::default();
        config.recommendation_data_table = Some("order_items".into());
        let (generator, _, _) = setup(ConfigRegistry::new().with_set("product", "partial", config));

        assert!(matches!(
            generator.try_generate("partial"),
            Err(AffinityError::Config(_))
        ));
    }

    #[test]
    fn similarity_uses_registry_default_count_and_target_type() {
        let mut config = RecommendationConfig::similarity().with_target_type("item");
        config.similarity_feature_attributes = vec!["color".into()];
        let registry = ConfigRegistry::new()
            .with_default_count(1)
            .with_set("product", "similar", config);
        let (generator, store, _) = setup(registry);
        store
            .add_records(
                "product",
                vec![
                    Record::new("1").with_attribute("color", "red"),
                    Record::new("2").with_attribute("color", "red"),
                    Record::new("3").with_attribute("color", "tan"),
                ],
            )
            .unwrap();

        let summary = generator.try_generate("similar").unwrap();
        assert_eq!(summary.sources, 3);
        assert_eq!(summary.edges, 3);

        let edges = store.edges().unwrap();
        assert!(edges.iter().all(|e| e.target_type == "item"));
        let best_for_1 = edges.iter().find(|e| e.source_id.as_str() == "1").unwrap();
        assert_eq!(best_for_1.target_id.as_str(), "2");
    }
}
