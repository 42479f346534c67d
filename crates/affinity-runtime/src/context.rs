//! Shared handles to the engine's collaborators.

use crate::memory_store::MemoryStore;
use crate::tracing_diagnostics::TracingDiagnostics;
use affinity_core::config::ConfigRegistry;
use affinity_core::diagnostics::Diagnostics;
use affinity_core::store::{ConfigSource, EdgeStore, ObservationSource, RecordSource};
use std::sync::Arc;

/// Everything a generator or retriever talks to.
///
/// Cheap to clone; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct EngineContext {
    pub config: Arc<dyn ConfigSource>,
    pub observations: Arc<dyn ObservationSource>,
    pub records: Arc<dyn RecordSource>,
    pub edges: Arc<dyn EdgeStore>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl EngineContext {
    pub fn new(
        config: Arc<dyn ConfigSource>,
        observations: Arc<dyn ObservationSource>,
        records: Arc<dyn RecordSource>,
        edges: Arc<dyn EdgeStore>,
    ) -> Self {
        Self {
            config,
            observations,
            records,
            edges,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Context where one `MemoryStore` plays every storage role.
    pub fn in_memory(config: ConfigRegistry, store: Arc<MemoryStore>) -> Self {
        Self::new(Arc::new(config), store.clone(), store.clone(), store)
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
