//! Resolution authorization.
//!
//! Who may approve or reject a pending confirmation is a deployment policy,
//! not a property of the record. The broker delegates the question to a
//! [`ResolutionGate`] so the policy can be swapped without touching the
//! lifecycle machinery.

use std::collections::BTreeSet;

use gatehouse_core::{Principal, Role};

use crate::record::ConfirmationRecord;

/// Decides who may resolve a pending confirmation.
///
/// The broker consults the gate inside the resolution critical section, so
/// implementations must be cheap, infallible, and must not block.
pub trait ResolutionGate: Send + Sync {
    /// Whether `principal` may resolve `record`.
    fn may_resolve(&self, principal: &Principal, record: &ConfirmationRecord) -> bool;
}

/// Only the principal that issued the original call may resolve it.
///
/// Suits deployments where the agent relays the human decision over the same
/// authenticated channel that issued the mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssuerGate;

impl ResolutionGate for IssuerGate {
    fn may_resolve(&self, principal: &Principal, record: &ConfirmationRecord) -> bool {
        principal.id == record.issued_by
    }
}

/// Any principal holding one of a fixed set of approver roles may resolve,
/// regardless of which tool the confirmation belongs to.
#[derive(Debug, Clone)]
pub struct RoleGate {
    roles: BTreeSet<Role>,
}

impl RoleGate {
    /// Builds a gate admitting holders of any of `roles`.
    ///
    /// An empty set admits nobody; such a gate parks every confirmation until
    /// it expires.
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }
}

impl ResolutionGate for RoleGate {
    fn may_resolve(&self, principal: &Principal, _record: &ConfirmationRecord) -> bool {
        principal.roles.iter().any(|role| self.roles.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{ChangePreview, ConfirmationData};
    use serde_json::json;

    fn record_issued_by(principal: &Principal) -> ConfirmationRecord {
        ConfirmationRecord::new(
            "delete_invoice",
            principal,
            json!({"invoiceId": "INV-9"}),
            ConfirmationData::new(
                "delete_invoice",
                json!({"invoiceId": "INV-9"}),
                ChangePreview::new("Delete invoice INV-9"),
            ),
            300,
        )
    }

    #[test]
    fn test_issuer_gate_admits_only_the_issuer() {
        let issuer = Principal::new("agent-7", [Role::FinanceWrite]);
        let other = Principal::new("agent-8", [Role::FinanceWrite, Role::Executive]);
        let record = record_issued_by(&issuer);

        assert!(IssuerGate.may_resolve(&issuer, &record));
        assert!(!IssuerGate.may_resolve(&other, &record));
    }

    #[test]
    fn test_role_gate_checks_roles_not_identity() {
        let issuer = Principal::new("agent-7", [Role::FinanceWrite]);
        let approver = Principal::new("cfo-1", [Role::Executive]);
        let bystander = Principal::new("emp-1", [Role::User]);
        let record = record_issued_by(&issuer);

        let gate = RoleGate::new([Role::Executive, Role::FinanceWrite]);
        assert!(gate.may_resolve(&approver, &record));
        assert!(gate.may_resolve(&issuer, &record));
        assert!(!gate.may_resolve(&bystander, &record));
    }

    #[test]
    fn test_empty_role_gate_admits_nobody() {
        let issuer = Principal::new("agent-7", [Role::Executive]);
        let record = record_issued_by(&issuer);
        let gate = RoleGate::new([]);
        assert!(!gate.may_resolve(&issuer, &record));
    }
}
