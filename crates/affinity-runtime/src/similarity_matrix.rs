//! Attribute-similarity ranking.
//!
//! Scores every ordered pair of records with a weighted mean of three
//! metrics and keeps each record's best matches.
//!
//! The matrix is O(n²) in the number of records (times the attribute
//! count for field extraction). It is meant for candidate pools of a few
//! thousand records at most; callers are responsible for bounding the pool
//! they hand in.

use affinity_core::config::SimilaritySettings;
use affinity_core::similarity::{euclidean, hamming, jaccard, min_max_norm, weighted_mean};
use affinity_core::types::{RankedList, Record, ScoredTarget};

/// Separator used to join taxonomy tokens before the Jaccard split.
pub const TAXONOMY_DELIMITER: &str = ",";

/// Per-record values extracted once and reused for every pair.
#[derive(Debug, Clone)]
struct Profile {
    features: String,
    numeric: Vec<f64>,
    taxonomy: String,
}

impl Profile {
    fn extract(record: &Record, settings: &SimilaritySettings) -> Self {
        let features = settings
            .feature_attributes
            .iter()
            .map(|field| record.text(field))
            .collect::<String>();

        let raw: Vec<f64> = settings
            .numeric_attributes
            .iter()
            .map(|field| record.number(field))
            .collect();
        let numeric = min_max_norm(&raw, 0.0, settings.numeric_high_range);

        let taxonomy = settings
            .taxonomy_sources
            .iter()
            .flat_map(|source| source.resolve(record))
            .collect::<Vec<_>>()
            .join(TAXONOMY_DELIMITER);

        Self {
            features,
            numeric,
            taxonomy,
        }
    }

    fn score(&self, other: &Profile, settings: &SimilaritySettings) -> f64 {
        weighted_mean(&[
            (hamming(&self.features, &other.features), settings.feature_weight),
            (euclidean(&self.numeric, &other.numeric), settings.numeric_weight),
            (
                jaccard(&self.taxonomy, &other.taxonomy, TAXONOMY_DELIMITER),
                settings.taxonomy_weight,
            ),
        ])
    }
}

/// Composite similarity of two records on the 0-100 scale.
///
/// Feature attributes are concatenated and compared position-wise,
/// numeric attributes are normalized on `[0, numeric_high_range]` and
/// compared by distance, taxonomy tokens are compared as sets. Absent
/// attributes read as `""` or `0`.
pub fn similarity_score(a: &Record, b: &Record, settings: &SimilaritySettings) -> f64 {
    Profile::extract(a, settings).score(&Profile::extract(b, settings), settings)
}

/// Rank every record's most similar peers.
///
/// Self pairs are skipped by id. Each list is sorted by score descending
/// (ties in input order) and cut to `limit`. Lists come back in input order.
pub fn rank_similarities(
    records: &[Record],
    settings: &SimilaritySettings,
    limit: usize,
) -> Vec<RankedList> {
    let profiles: Vec<Profile> = records
        .iter()
        .map(|r| Profile::extract(r, settings))
        .collect();

    records
        .iter()
        .zip(profiles.iter())
        .map(|(source, source_profile)| {
            let scores = records
                .iter()
                .zip(profiles.iter())
                .filter(|(target, _)| target.id != source.id)
                .map(|(target, target_profile)| {
                    ScoredTarget::new(target.id.clone(), source_profile.score(target_profile, settings))
                })
                .collect();
            RankedList::from_scores(source.id.clone(), scores, limit)
        })
        .collect()
}
