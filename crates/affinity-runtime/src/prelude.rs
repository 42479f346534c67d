//! Affinity Runtime Prelude: convenient imports for common usage.
//!
//! ```rust
//! use affinity_runtime::prelude::*;
//! ```

// Re-export algorithms
pub use crate::cooccurrence::rank_cooccurrences;
pub use crate::similarity_matrix::{rank_similarities, similarity_score, TAXONOMY_DELIMITER};

// Re-export generation and retrieval
pub use crate::context::EngineContext;
pub use crate::generator::{Generator, GenerationSummary};
pub use crate::retriever::{Retriever, apply_order};

// Re-export storage
pub use crate::memory_store::{MemoryStore, Row};
pub use crate::backend::{BackendConfig, StorageBackend, create_backend};
pub use crate::tracing_diagnostics::TracingDiagnostics;

// Re-export SQLite backend when feature is enabled
#[cfg(feature = "sqlite")]
pub use crate::sqlite_store::{SetStats, SqliteStore, quote_identifier};

// Re-export from core
pub use affinity_core::prelude::*;
