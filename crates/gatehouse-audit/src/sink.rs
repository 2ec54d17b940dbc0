//! Audit sinks.
//!
//! A sink is where records land: process logs, memory (for tests and the
//! status endpoint), or whatever a deployment wires in. Sinks must be
//! thread-safe; they are called from concurrent invocations.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::entry::AuditRecord;
use crate::error::{AuditError, AuditResult};

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written. The gateway logs the
    /// failure and continues; auditing never fails the call it describes.
    async fn record(&self, record: AuditRecord) -> AuditResult<()>;

    /// Flush buffered entries to the backing medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium fails to flush.
    async fn flush(&self) -> AuditResult<()>;
}

/// In-memory sink holding records in insertion order.
///
/// Used by tests and by deployments that surface the recent trail through an
/// introspection endpoint.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.read_records().clone()
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_records().is_empty()
    }

    fn read_records(&self) -> std::sync::RwLockReadGuard<'_, Vec<AuditRecord>> {
        self.records.read().unwrap_or_else(|e| {
            tracing::warn!("audit sink lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn record(&self, record: AuditRecord) -> AuditResult<()> {
        let mut records = self.records.write().unwrap_or_else(|e| {
            tracing::warn!("audit sink lock poisoned, recovering");
            e.into_inner()
        });
        records.push(record);
        Ok(())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }
}

/// Sink that emits each record as a structured log event under the
/// `gatehouse::audit` target, so the trail rides the process's existing log
/// pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates the sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingSink {
    async fn record(&self, record: AuditRecord) -> AuditResult<()> {
        let action = serde_json::to_string(&record.action)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        match &record.outcome {
            crate::entry::AuditOutcome::Success { details } => {
                tracing::info!(
                    target: "gatehouse::audit",
                    timestamp = %record.timestamp,
                    action = %action,
                    details = details.as_deref().unwrap_or(""),
                    "audit"
                );
            },
            crate::entry::AuditOutcome::Failure { error } => {
                tracing::warn!(
                    target: "gatehouse::audit",
                    timestamp = %record.timestamp,
                    action = %action,
                    error = %error,
                    "audit"
                );
            },
        }
        Ok(())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }
}
