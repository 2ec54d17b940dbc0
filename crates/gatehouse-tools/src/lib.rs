//! Gatehouse Tools - Tool registry and result bounding for the Gatehouse gateway.
//!
//! This crate provides:
//! - The [`ToolHandler`] seam domain collaborators implement
//! - [`ToolRegistry`]: a name-keyed catalog of descriptors and handlers,
//!   validated at startup and read-only afterwards
//! - Typed parameter validation against each descriptor's schema
//! - [`TruncationGuard`]: the limit-plus-one probe that bounds result sets
//!   and attaches machine-readable truncation metadata

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod handler;
mod registry;
mod truncate;
mod validate;

pub use handler::{ToolHandler, UpstreamError, UpstreamResult};
pub use registry::{RegisteredTool, RegistryError, ToolRegistry, ToolRegistryBuilder};
pub use truncate::{DEFAULT_TRUNCATION_THRESHOLD, TruncationGuard, truncation_warning};
pub use validate::validate_params;
