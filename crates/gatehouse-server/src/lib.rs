//! JSON-RPC frontend for the Gatehouse gateway.
//!
//! This crate puts a wire boundary in front of [`gatehouse_dispatch`]: a
//! `jsonrpsee` WebSocket server exposing `invoke`, `resolve`, `listTools`,
//! and `status` under the `gatehouse` namespace, plus the `gatehoused`
//! binary that loads configuration, installs logging, wires a demo
//! collaborator set, and runs the confirmation sweep loop.
//!
//! The gateway trusts the principal object it receives: authenticating
//! callers and resolving their roles is the session layer's job, upstream
//! of this process.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod demo;
pub mod rpc;
mod server;
pub mod telemetry;

pub use server::GatewayServer;
