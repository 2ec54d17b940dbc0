//! The gateway error taxonomy.
//!
//! Every failure the gateway can surface to a calling agent carries a
//! machine-readable [`ErrorCode`] so the agent can decide whether to retry,
//! rephrase, or give up. Authorization and validation failures are resolved
//! locally and never reach a domain collaborator; collaborator failures are
//! wrapped, never swallowed, and never downgraded to an empty success.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ids::ConfirmationId;

/// Machine-readable error codes, `SCREAMING_SNAKE_CASE` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Tool name not present in the registry. Fatal to the call.
    UnknownTool,
    /// Authorization failed. Not retryable without a role change.
    Forbidden,
    /// Payload failed schema checks. Retryable after client correction.
    ValidationError,
    /// Referenced confirmation or target record absent.
    NotFound,
    /// Confirmation TTL elapsed; the original call must be re-issued.
    Expired,
    /// Duplicate resolution attempt. An idempotency signal, not a true
    /// failure for the second caller.
    AlreadyResolved,
    /// The domain collaborator did not answer in time.
    UpstreamTimeout,
    /// The domain collaborator failed.
    UpstreamError,
}

impl ErrorCode {
    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownTool => "UNKNOWN_TOOL",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Expired => "EXPIRED",
            ErrorCode::AlreadyResolved => "ALREADY_RESOLVED",
            ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One schema violation inside a `VALIDATION_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// The offending parameter name.
    pub field: String,
    /// What is wrong with it.
    pub problem: String,
}

impl FieldViolation {
    /// Create a violation for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    let parts: Vec<String> = violations.iter().map(FieldViolation::to_string).collect();
    parts.join("; ")
}

/// Everything that can go wrong between an invocation and its response.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    // Resolved locally, before any collaborator call
    /// The requested tool is not registered.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// The name the caller asked for.
        name: String,
    },

    /// The principal is not allowed to invoke the tool.
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Why authorization was denied.
        reason: String,
    },

    /// The payload failed schema validation.
    #[error("invalid parameters: {}", join_violations(.violations))]
    Validation {
        /// Field-level detail, one entry per offending parameter.
        violations: Vec<FieldViolation>,
    },

    // Confirmation lifecycle
    /// No record exists for the referenced confirmation, or a target record
    /// is absent upstream.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// The confirmation's TTL elapsed before it was resolved.
    #[error("confirmation {id} expired")]
    Expired {
        /// The expired confirmation.
        id: ConfirmationId,
    },

    /// The confirmation already left the pending state.
    #[error("confirmation {id} already resolved ({resolution})")]
    AlreadyResolved {
        /// The confirmation in question.
        id: ConfirmationId,
        /// The terminal state it reached first.
        resolution: String,
    },

    // Collaborator failures, surfaced with their code attached
    /// The collaborator did not answer within its own deadline.
    #[error("upstream timeout calling {tool}")]
    UpstreamTimeout {
        /// The tool whose collaborator timed out.
        tool: String,
    },

    /// The collaborator reported a failure.
    #[error("upstream error calling {tool}: {message}")]
    UpstreamError {
        /// The tool whose collaborator failed.
        tool: String,
        /// The collaborator's own message.
        message: String,
    },
}

impl GatewayError {
    /// The machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::UnknownTool { .. } => ErrorCode::UnknownTool,
            GatewayError::Forbidden { .. } => ErrorCode::Forbidden,
            GatewayError::Validation { .. } => ErrorCode::ValidationError,
            GatewayError::NotFound { .. } => ErrorCode::NotFound,
            GatewayError::Expired { .. } => ErrorCode::Expired,
            GatewayError::AlreadyResolved { .. } => ErrorCode::AlreadyResolved,
            GatewayError::UpstreamTimeout { .. } => ErrorCode::UpstreamTimeout,
            GatewayError::UpstreamError { .. } => ErrorCode::UpstreamError,
        }
    }

    /// A self-correction hint for the calling agent, keyed by error kind.
    #[must_use]
    pub fn suggested_action(&self) -> Option<String> {
        let hint = match self {
            GatewayError::UnknownTool { .. } => {
                "List the available tools and retry with a registered tool name."
            },
            GatewayError::Forbidden { .. } => {
                "Retry with a principal holding one of the required roles, or target \
                 your own record where self-service applies."
            },
            GatewayError::Validation { .. } => "Correct the listed parameters and retry the call.",
            GatewayError::NotFound { .. } => {
                "Check the identifier; if a confirmation was evicted, re-issue the \
                 original tool call."
            },
            GatewayError::Expired { .. } => {
                "Re-issue the original tool call to obtain a fresh confirmation."
            },
            GatewayError::AlreadyResolved { .. } => {
                "Treat the earlier resolution as authoritative; do not resolve again."
            },
            GatewayError::UpstreamTimeout { .. } => {
                "The domain service did not respond in time; retry later."
            },
            GatewayError::UpstreamError { .. } => {
                "The domain service failed; retry later or report the failure."
            },
        };
        Some(hint.to_string())
    }
}

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::UnknownTool).unwrap(),
            "\"UNKNOWN_TOOL\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::AlreadyResolved).unwrap(),
            "\"ALREADY_RESOLVED\""
        );
        let code: ErrorCode = serde_json::from_str("\"UPSTREAM_TIMEOUT\"").unwrap();
        assert_eq!(code, ErrorCode::UpstreamTimeout);
    }

    #[test]
    fn test_error_code_display_matches_serde() {
        for code in [
            ErrorCode::UnknownTool,
            ErrorCode::Forbidden,
            ErrorCode::ValidationError,
            ErrorCode::NotFound,
            ErrorCode::Expired,
            ErrorCode::AlreadyResolved,
            ErrorCode::UpstreamTimeout,
            ErrorCode::UpstreamError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn test_gateway_error_codes() {
        let err = GatewayError::UnknownTool {
            name: "frobnicate".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::UnknownTool);

        let err = GatewayError::Expired {
            id: ConfirmationId::new(),
        };
        assert_eq!(err.code(), ErrorCode::Expired);
    }

    #[test]
    fn test_validation_error_joins_violations() {
        let err = GatewayError::Validation {
            violations: vec![
                FieldViolation::new("salary", "expected integer, got string"),
                FieldViolation::new("employee_id", "missing required parameter"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("salary: expected integer, got string"));
        assert!(message.contains("employee_id: missing required parameter"));
    }

    #[test]
    fn test_every_error_has_a_suggested_action() {
        let errors = vec![
            GatewayError::UnknownTool {
                name: "x".to_string(),
            },
            GatewayError::Forbidden {
                reason: "x".to_string(),
            },
            GatewayError::Validation { violations: vec![] },
            GatewayError::NotFound {
                what: "x".to_string(),
            },
            GatewayError::Expired {
                id: ConfirmationId::new(),
            },
            GatewayError::AlreadyResolved {
                id: ConfirmationId::new(),
                resolution: "approved".to_string(),
            },
            GatewayError::UpstreamTimeout {
                tool: "x".to_string(),
            },
            GatewayError::UpstreamError {
                tool: "x".to_string(),
                message: "boom".to_string(),
            },
        ];
        for err in errors {
            let action = err.suggested_action();
            assert!(action.is_some_and(|a| !a.is_empty()), "{err} lacks a hint");
        }
    }
}
