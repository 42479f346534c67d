//! Affinity Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use affinity_core::prelude::*;
//! ```

// Re-export commonly used types
pub use crate::types::{
    RecordId, FieldValue, Attributes, Relation, Record,
    TaxonomySource, Observation,
    RecommendationEdge, ScoredTarget, RankedList,
};

// Re-export configuration
pub use crate::config::{
    Algorithm, RecommendationOrder, RecommendationConfig,
    SimilaritySettings, ConfigRegistry,
    DEFAULT_RECOMMENDATION_COUNT, DEFAULT_NUMERIC_HIGH_RANGE,
};

// Re-export similarity primitives
pub use crate::similarity::{hamming, min_max_norm, euclidean, jaccard, weighted_mean, MAX_SIMILARITY};

// Re-export collaborator traits
pub use crate::store::{
    ObservationQuery, ObservationSource,
    RecordSource, ConfigSource,
    EdgeQuery, EdgeStore,
};

// Re-export diagnostics
pub use crate::diagnostics::{Diagnostics, Level, NullDiagnostics, MemoryDiagnostics};

// Re-export error types
pub use crate::error::{AffinityError, Result};
