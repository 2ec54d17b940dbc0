//! Gatehouse Core - Foundation types for the Gatehouse tool-invocation gateway.
//!
//! This crate provides:
//! - Principal and role types resolved by the identity layer
//! - Tool descriptors with typed parameter schemas
//! - The three-shape tool response (`success` / `error` / `pending_confirmation`)
//! - Truncation metadata for bounded result sets
//! - The gateway error taxonomy with machine-readable codes
//! - Timestamp and identifier newtypes used throughout the workspace

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ids;
pub mod principal;
pub mod response;
pub mod timestamp;
pub mod tool;

pub use error::{ErrorCode, FieldViolation, GatewayError, GatewayResult};
pub use ids::{ConfirmationId, PrincipalId};
pub use principal::{Domain, Principal, Role, UnknownRole};
pub use response::{
    ChangePreview, ConfirmationData, FieldChange, ToolResult, TotalCount, TruncationMetadata,
};
pub use timestamp::Timestamp;
pub use tool::{ParamKind, ParamSpec, ToolDescriptor, ToolInvocation, ToolScope};
