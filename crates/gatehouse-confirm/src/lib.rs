//! Confirmation broker for the Gatehouse gateway.
//!
//! Mutating tool calls never reach a domain service directly. The dispatcher
//! parks them here as [`ConfirmationRecord`]s and hands the caller an opaque
//! [`ConfirmationId`](gatehouse_core::ConfirmationId). A human decision comes
//! back through [`ConfirmationBroker::resolve`], which transitions the record
//! exactly once no matter how many resolvers race for it.
//!
//! Records are held in an in-process [`ConfirmationStore`]. Expiry is lazy
//! (checked whenever a record is touched) with a periodic
//! [`expire_sweep`](ConfirmationBroker::expire_sweep) to flip abandoned
//! records and evict concluded ones after a retention window.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod broker;
mod gate;
mod record;
mod store;

pub use broker::{ConfirmationBroker, DEFAULT_RETENTION_SECS, DEFAULT_TTL_SECS};
pub use gate::{IssuerGate, ResolutionGate, RoleGate};
pub use record::{ConfirmationRecord, ConfirmationState, ResolutionDecision};
pub use store::{ConfirmationStore, SweepStats};
