//! The audit log handle the dispatcher records through.

use std::sync::Arc;

use crate::entry::{AuditAction, AuditOutcome, AuditRecord};
use crate::sink::AuditSink;

/// Fans audit records out to the configured sinks.
///
/// A sink failure is logged under the gateway's own logger and otherwise
/// ignored: the call being audited already happened, and refusing it
/// retroactively is not an option. A log with no sinks is valid and records
/// nothing.
#[derive(Clone)]
pub struct AuditLog {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditLog {
    /// Creates a log with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Adds a sink to the fan-out set.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of configured sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Records one event to every sink.
    pub async fn observe(&self, action: AuditAction, outcome: AuditOutcome) {
        let record = AuditRecord::new(action, outcome);
        for sink in &self.sinks {
            if let Err(error) = sink.record(record.clone()).await {
                tracing::warn!(%error, "audit sink write failed");
            }
        }
    }

    /// Flushes every sink, logging failures.
    pub async fn flush(&self) {
        for sink in &self.sinks {
            if let Err(error) = sink.flush().await {
                tracing::warn!(%error, "audit sink flush failed");
            }
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
