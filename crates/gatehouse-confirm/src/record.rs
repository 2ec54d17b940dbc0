//! Confirmation records and their lifecycle states.

use gatehouse_core::{ConfirmationData, ConfirmationId, Principal, PrincipalId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a confirmation record.
///
/// A record starts [`Pending`](ConfirmationState::Pending) and moves exactly
/// once into one of the three terminal states. There are no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationState {
    /// Waiting for a human decision.
    Pending,
    /// A resolver approved the mutation; it may now be applied.
    Approved,
    /// A resolver rejected the mutation; it will never be applied.
    Rejected,
    /// The TTL elapsed before any decision arrived.
    Expired,
}

impl ConfirmationState {
    /// Whether this state is terminal (no further transitions allowed).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lowercase label used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ConfirmationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decision carried by a resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionDecision {
    /// Apply the parked mutation.
    Approve,
    /// Discard the parked mutation.
    Reject,
}

impl ResolutionDecision {
    /// Maps the wire-level `approved` boolean onto a decision.
    #[must_use]
    pub fn from_approved(approved: bool) -> Self {
        if approved { Self::Approve } else { Self::Reject }
    }

    /// Whether this decision approves the mutation.
    #[must_use]
    pub fn is_approve(self) -> bool {
        matches!(self, Self::Approve)
    }

    /// The terminal state this decision transitions a record into.
    #[must_use]
    pub fn target_state(self) -> ConfirmationState {
        match self {
            Self::Approve => ConfirmationState::Approved,
            Self::Reject => ConfirmationState::Rejected,
        }
    }
}

/// A parked mutation awaiting a human decision.
///
/// The record captures everything needed to apply the mutation later without
/// re-consulting the caller: the tool, the validated parameters, and the
/// preview that was shown when the confirmation was issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    /// Opaque identifier handed back to the caller.
    pub id: ConfirmationId,
    /// Tool whose mutation is parked here.
    pub tool_name: String,
    /// Principal that issued the original call.
    pub issued_by: PrincipalId,
    /// Validated mutation parameters, replayed verbatim on approval.
    pub payload: Value,
    /// Human-readable preview shown alongside the confirmation prompt.
    pub confirmation_data: ConfirmationData,
    /// When the record was created.
    pub issued_at: Timestamp,
    /// Past this instant the record can only expire.
    pub expires_at: Timestamp,
    /// Current lifecycle state.
    pub state: ConfirmationState,
    /// Principal that resolved the record, once terminal via a decision.
    pub resolved_by: Option<PrincipalId>,
    /// Free-form note attached by the resolver.
    pub comments: Option<String>,
    /// When the record reached a terminal state.
    pub concluded_at: Option<Timestamp>,
}

impl ConfirmationRecord {
    /// Creates a pending record expiring `ttl_secs` from now.
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        issued_by: &Principal,
        payload: Value,
        confirmation_data: ConfirmationData,
        ttl_secs: u64,
    ) -> Self {
        let issued_at = Timestamp::now();
        Self {
            id: ConfirmationId::new(),
            tool_name: tool_name.into(),
            issued_by: issued_by.id.clone(),
            payload,
            confirmation_data,
            issued_at,
            expires_at: issued_at.plus_secs(ttl_secs),
            state: ConfirmationState::Pending,
            resolved_by: None,
            comments: None,
            concluded_at: None,
        }
    }

    /// Whether the record still awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ConfirmationState::Pending
    }

    /// Whether the record has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the TTL has elapsed as of `now`.
    ///
    /// This is a pure clock comparison; the caller decides whether to flip
    /// the state. A record resolved before its deadline stays resolved even
    /// when the deadline later passes.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now.0 > self.expires_at.0
    }

    /// Whether a concluded record has outlived `retention_secs` as of `now`
    /// and may be evicted from the store.
    #[must_use]
    pub fn is_evictable_at(&self, now: Timestamp, retention_secs: u64) -> bool {
        match self.concluded_at {
            Some(concluded) if self.is_terminal() => {
                now.0 > concluded.plus_secs(retention_secs).0
            }
            _ => false,
        }
    }
}
