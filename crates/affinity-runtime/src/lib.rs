//! # Affinity Runtime
//!
//! Ranking algorithms, generation, retrieval and storage backends.
//!
//! The generator turns observation rows or record attributes into ranked
//! lists and persists them as edges; the retriever reads those edges back
//! as ordered target records. Both talk to storage only through the
//! collaborator traits in `affinity_core::store`.

pub mod cooccurrence;
pub mod similarity_matrix;
pub mod context;
pub mod generator;
pub mod retriever;
pub mod memory_store;
pub mod backend;
pub mod tracing_diagnostics;
pub mod sqlite_store;
pub mod prelude;
