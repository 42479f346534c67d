//! `tracing` forwarder for engine diagnostics.

use affinity_core::diagnostics::{Diagnostics, Level};
use tracing::{error, info, warn};

/// Sends every report to the `tracing` subscriber under the
/// `affinity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, level: Level, message: &str) {
        match level {
            Level::Info => info!(target: "affinity", "{}", message),
            Level::Warn => warn!(target: "affinity", "{}", message),
            Level::Error => error!(target: "affinity", "{}", message),
        }
    }
}
