//! Tool dispatcher for the Gatehouse gateway.
//!
//! The [`Dispatcher`] is the one path between an agent and a domain
//! collaborator. Every invocation runs the same gauntlet:
//!
//! 1. Catalog lookup — unknown tools fail immediately
//! 2. Authorization — roles, domain supersets, self-service scope
//! 3. Reads: bounded fetch through the truncation guard, one retry on timeout
//! 4. Writes: schema validation, change preview, then a pending confirmation
//!
//! Nothing mutates upstream until a human decision comes back through
//! [`Dispatcher::resolve`] and lands on an approved record. Every decision
//! along the way is recorded to the audit log.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod dispatcher;
mod gate;

pub use dispatcher::{DEFAULT_READ_RETRY_BACKOFF_MS, Dispatcher};
pub use gate::PolicyResolutionGate;
