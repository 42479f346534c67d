//! Storage backend configuration and factory.
//!
//! Provides a unified way to pick where edges are persisted and where
//! co-occurrence observations are read from.

use crate::memory_store::MemoryStore;
use affinity_core::error::Result;
use affinity_core::store::{EdgeStore, ObservationSource};
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use std::path::PathBuf;

/// Configuration for backend selection.
#[derive(Debug, Clone, Default)]
pub enum BackendConfig {
    /// In-memory store (default, fast, no persistence).
    #[default]
    InMemory,

    /// SQLite-backed persistent storage.
    #[cfg(feature = "sqlite")]
    Sqlite {
        /// Path to the SQLite database file.
        /// If None, uses an in-memory SQLite database.
        path: Option<PathBuf>,
    },
}

impl BackendConfig {
    /// Create an in-memory backend configuration.
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    /// Create an SQLite backend configuration with a file path.
    #[cfg(feature = "sqlite")]
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        BackendConfig::Sqlite {
            path: Some(path.into()),
        }
    }

    /// Create an SQLite backend configuration with in-memory storage.
    #[cfg(feature = "sqlite")]
    pub fn sqlite_in_memory() -> Self {
        BackendConfig::Sqlite { path: None }
    }
}

/// The two storage roles a backend fills.
#[derive(Clone)]
pub struct StorageBackend {
    pub edges: Arc<dyn EdgeStore>,
    pub observations: Arc<dyn ObservationSource>,
}

/// Create a storage backend from configuration.
///
/// # Errors
/// Returns an error if the backend cannot be opened (e.g. SQLite file issues).
pub fn create_backend(config: &BackendConfig) -> Result<StorageBackend> {
    match config {
        BackendConfig::InMemory => {
            let store = Arc::new(MemoryStore::new());
            Ok(StorageBackend {
                edges: store.clone(),
                observations: store,
            })
        }

        #[cfg(feature = "sqlite")]
        BackendConfig::Sqlite { path } => {
            use crate::sqlite_store::SqliteStore;

            let store = match path {
                Some(p) => SqliteStore::open(p)?,
                None => SqliteStore::new_in_memory()?,
            };
            let store = Arc::new(store);
            Ok(StorageBackend {
                edges: store.clone(),
                observations: store,
            })
        }
    }
}
