//! Audit entry types and actions.
//!
//! An entry pairs what the gateway did ([`AuditAction`]) with how it ended
//! ([`AuditOutcome`]). Denials and failed resolution attempts are recorded
//! with the same fidelity as grants; absence of an entry means the gateway
//! never saw the operation, not that it went well.

use gatehouse_core::{ConfirmationId, PrincipalId, Timestamp};
use serde::{Deserialize, Serialize};

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When this record was created.
    pub timestamp: Timestamp,
    /// The operation being audited.
    pub action: AuditAction,
    /// Outcome of the operation.
    pub outcome: AuditOutcome,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            timestamp: Timestamp::now(),
            action,
            outcome,
        }
    }
}

/// Gateway operations that leave an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditAction {
    /// An authorization decision was made for a tool invocation.
    ToolAuthorization {
        /// The tool the caller asked for.
        tool: String,
        /// The calling principal.
        principal: PrincipalId,
    },

    /// A mutation was parked pending human confirmation.
    ConfirmationIssued {
        /// The mutating tool.
        tool: String,
        /// The principal whose call was parked.
        principal: PrincipalId,
        /// Id of the pending record.
        confirmation: ConfirmationId,
    },

    /// A resolution attempt arrived for a pending confirmation.
    ConfirmationResolution {
        /// The confirmation being resolved.
        confirmation: ConfirmationId,
        /// The principal attempting to resolve it.
        resolver: PrincipalId,
    },

    /// A pending confirmation's TTL elapsed without a decision.
    ConfirmationExpired {
        /// The confirmation that lapsed.
        confirmation: ConfirmationId,
        /// The tool whose mutation was dropped.
        tool: String,
    },

    /// An approved mutation was applied to the domain service.
    MutationApplied {
        /// The mutating tool.
        tool: String,
        /// The principal that originally issued the call.
        principal: PrincipalId,
        /// The confirmation that approved it.
        confirmation: ConfirmationId,
    },
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation succeeded.
    Success {
        /// Optional details (authorization basis, resolution state, ...).
        details: Option<String>,
    },
    /// The operation failed or was refused.
    Failure {
        /// Error code or denial reason.
        error: String,
    },
}

impl AuditOutcome {
    /// A bare success.
    #[must_use]
    pub fn success() -> Self {
        Self::Success { details: None }
    }

    /// A success annotated with details.
    #[must_use]
    pub fn success_with(details: impl Into<String>) -> Self {
        Self::Success {
            details: Some(details.into()),
        }
    }

    /// A failure or refusal.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
