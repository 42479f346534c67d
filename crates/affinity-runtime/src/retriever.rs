//! Recommendation retrieval.
//!
//! Reads persisted edges for a source, resolves the target records and
//! applies the set's ordering policy. Retrieval never fails loudly: a
//! missing set or a storage error yields an empty list.

use crate::context::EngineContext;
use affinity_core::config::RecommendationOrder;
use affinity_core::error::Result;
use affinity_core::store::EdgeQuery;
use affinity_core::types::{Record, RecordId};
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Reads recommendation sets for one source kind.
pub struct Retriever {
    kind: String,
    ctx: EngineContext,
}

impl Retriever {
    pub fn new(kind: impl Into<String>, ctx: EngineContext) -> Self {
        Self {
            kind: kind.into(),
            ctx,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Target records recommended for `source_id` under `name`.
    pub fn get_recommendations(&self, source_id: &RecordId, name: &str) -> Vec<Record> {
        self.get_or_empty(source_id, name, &[])
    }

    /// Same as [`Retriever::get_recommendations`], with the named relations
    /// eager-loaded on every target.
    pub fn get_recommendations_with_relationships(
        &self,
        source_id: &RecordId,
        name: &str,
        relations: &[String],
    ) -> Vec<Record> {
        self.get_or_empty(source_id, name, relations)
    }

    fn get_or_empty(&self, source_id: &RecordId, name: &str, relations: &[String]) -> Vec<Record> {
        self.try_get(source_id, name, relations).unwrap_or_else(|e| {
            self.ctx.diagnostics.error(&format!(
                "Reading recommendation {name} for {}/{source_id} failed: {e}",
                self.kind
            ));
            Vec::new()
        })
    }

    /// Fallible retrieval. A missing set is still `Ok(vec![])`.
    pub fn try_get(
        &self,
        source_id: &RecordId,
        name: &str,
        relations: &[String],
    ) -> Result<Vec<Record>> {
        let Some(config) = self.ctx.config.recommendation(&self.kind, name) else {
            return Ok(Vec::new());
        };
        let target_type = config.target_type(&self.kind).to_string();

        let edges = self.ctx.edges.edges_for(&EdgeQuery {
            source_type: self.kind.clone(),
            source_id: source_id.clone(),
            recommendation_name: name.to_string(),
            target_type: target_type.clone(),
        })?;
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<RecordId> = edges.iter().map(|e| e.target_id.clone()).collect();
        let mut by_id: HashMap<RecordId, Record> = self
            .ctx
            .records
            .find_many(&target_type, &ids)?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        // Edge order is rank order; targets that no longer exist drop out.
        let mut targets: Vec<Record> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        if !relations.is_empty() {
            self.ctx
                .records
                .load_relations(&target_type, &mut targets, relations)?;
        }

        Ok(apply_order(targets, config.recommendation_order))
    }
}

/// Reorder rank-descending `items` by `order`.
///
/// `Random` draws a fresh permutation from the thread RNG on every call.
pub fn apply_order<T>(mut items: Vec<T>, order: RecommendationOrder) -> Vec<T> {
    match order {
        RecommendationOrder::Desc => {}
        RecommendationOrder::Asc => items.reverse(),
        RecommendationOrder::Random => items.shuffle(&mut rand::thread_rng()),
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asc_is_reverse_of_desc() {
        let desc = apply_order(vec![1, 2, 3, 4], RecommendationOrder::Desc);
        let asc = apply_order(vec![1, 2, 3, 4], RecommendationOrder::Asc);
        assert_eq!(desc, vec![1, 2, 3, 4]);
        assert_eq!(asc, vec![4, 3, 2, 1]);
    }

    #[test]
    fn random_is_a_permutation() {
        let items: Vec<u32> = (0..50).collect();
        let mut shuffled = apply_order(items.clone(), RecommendationOrder::Random);
        assert_eq!(shuffled.len(), items.len());
        shuffled.sort_unstable();
        assert_eq!(shuffled, items);
    }
}
