//! Audit-related error types.

use thiserror::Error;

/// Errors a sink can report when recording an entry.
///
/// The gateway logs these and moves on; they exist so deployment-specific
/// sinks (files, message queues, SIEM shippers) can say what went wrong.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink's backing medium rejected the write.
    #[error("sink error: {0}")]
    Sink(String),

    /// The record could not be serialized for the sink.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
