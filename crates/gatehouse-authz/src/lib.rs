//! Gatehouse Authz - Role authorization for the Gatehouse gateway.
//!
//! This crate provides:
//! - [`PermissionMatrix`]: the effective allowed-role set per tool,
//!   precomputed at startup and validated for completeness
//! - [`RoleAuthorizer`]: the pure allow/deny decision over a principal's
//!   role set, with the own-record self-service exception
//!
//! Authorization never filters silently: a denial carries a reason the
//! calling agent can act on, and the dispatcher turns it into an explicit
//! `FORBIDDEN` error.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod authorizer;
mod matrix;

pub use authorizer::{AccessBasis, AccessDecision, RoleAuthorizer};
pub use matrix::{MatrixError, PermissionMatrix};
