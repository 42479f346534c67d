//! # Affinity
//!
//! Ranked "recommendation" links between records, generated by one of two
//! interchangeable algorithms and persisted as edges.
//!
//! ## Quick Start
//!
//! ```rust
//! use affinity::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! for (order, product) in [("o1", "A"), ("o1", "B"), ("o1", "C"), ("o2", "A"), ("o2", "B")] {
//!     store.add_row("order_items", [("order_id", order), ("product_id", product)]).unwrap();
//! }
//! for id in ["A", "B", "C"] {
//!     store.add_record("product", Record::new(id)).unwrap();
//! }
//!
//! let config = ConfigRegistry::new().with_set(
//!     "product",
//!     "bought_together",
//!     RecommendationConfig::db_relation("order_items", "order_id", "product_id").with_count(2),
//! );
//! let ctx = EngineContext::in_memory(config, store);
//!
//! Generator::new("product", ctx.clone()).generate_recommendations("bought_together");
//!
//! let targets = Retriever::new("product", ctx)
//!     .get_recommendations(&RecordId::new("A"), "bought_together");
//! let ids: Vec<&str> = targets.iter().map(|r| r.id.as_str()).collect();
//! assert_eq!(ids, vec!["B", "C"]);
//! ```
//!
//! ## Architecture
//!
//! - [`affinity_core`] - Records, edges, configuration, similarity primitives,
//!   collaborator traits
//! - [`affinity_runtime`] - Algorithms, generator, retriever, storage backends
//!
//! ## Algorithms
//!
//! | Name | Input | Rank |
//! |------|-------|------|
//! | `db_relation` | `(group, data)` rows of a table | shared-group count |
//! | `similarity` | every record of the kind | weighted mean of Hamming, Euclidean, Jaccard (0-100) |
//!
//! The similarity matrix is quadratic in the number of records; keep the
//! candidate pool to a few thousand records.

// Re-export all subcrates
pub use affinity_core as core;
pub use affinity_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use affinity::prelude::*;
/// ```
pub mod prelude {
    pub use affinity_runtime::prelude::*;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
