//! Audit trail for the Gatehouse gateway.
//!
//! Every authorization decision, confirmation lifecycle event, and applied
//! mutation is recorded as an [`AuditRecord`] and fanned out to pluggable
//! [`AuditSink`]s through the [`AuditLog`] handle. Which sinks exist is a
//! deployment concern; the gateway only guarantees that the events are
//! emitted.
//!
//! Auditing must never change the outcome of the call it describes: a sink
//! failure is logged and swallowed, not propagated.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod entry;
mod error;
mod log;
mod sink;

pub use entry::{AuditAction, AuditOutcome, AuditRecord};
pub use error::{AuditError, AuditResult};
pub use log::AuditLog;
pub use sink::{AuditSink, MemorySink, TracingSink};
