//! The allow/deny decision.
//!
//! Checks run in order:
//! 1. Role intersection — any principal role inside the tool's effective
//!    allowed set (configured roles plus domain supersets) allows.
//! 2. Self-service — a read tool with own-record-only scope whose target
//!    resolves to the caller's own identifier allows without a role match.
//!    Mutations never qualify; they go through confirmation with a real role.
//! 3. Everything else denies, with a reason naming the roles that would
//!    have sufficed.
//!
//! The decision is a pure function of its inputs; recording it is the
//! dispatcher's job.

use serde::{Deserialize, Serialize};

use gatehouse_core::{Principal, Role, ToolDescriptor, ToolScope};

use crate::matrix::{MatrixError, PermissionMatrix};

/// What satisfied an allow decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AccessBasis {
    /// A principal role intersects the tool's effective allowed set.
    Role {
        /// The matching role (lowest-ordered when several match).
        role: Role,
    },
    /// Own-record-only scope with the target equal to the caller's id.
    SelfService,
}

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum AccessDecision {
    /// Invocation permitted.
    Allow {
        /// What satisfied the check.
        basis: AccessBasis,
    },
    /// Invocation rejected; the reason feeds the `FORBIDDEN` error.
    Deny {
        /// Why the principal may not invoke the tool.
        reason: String,
    },
}

impl AccessDecision {
    /// Whether this decision permits the invocation.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, AccessDecision::Allow { .. })
    }

    /// The denial reason, when denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&str> {
        match self {
            AccessDecision::Deny { reason } => Some(reason),
            AccessDecision::Allow { .. } => None,
        }
    }
}

/// Decides whether a principal may invoke a tool.
#[derive(Debug, Clone)]
pub struct RoleAuthorizer {
    matrix: PermissionMatrix,
}

impl RoleAuthorizer {
    /// An authorizer over a prebuilt matrix.
    #[must_use]
    pub fn new(matrix: PermissionMatrix) -> Self {
        Self { matrix }
    }

    /// Build the matrix from descriptors and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError`] when any tool's effective allowed-role set is
    /// empty.
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a ToolDescriptor>,
    ) -> Result<Self, MatrixError> {
        Ok(Self::new(PermissionMatrix::build(descriptors)?))
    }

    /// The underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    /// Decide whether `principal` may invoke the tool described by
    /// `descriptor`, given the target the call resolves to (for
    /// self-service scoping).
    #[must_use]
    pub fn authorize(
        &self,
        principal: &Principal,
        descriptor: &ToolDescriptor,
        target: Option<&str>,
    ) -> AccessDecision {
        let Some(allowed) = self.matrix.allowed_roles(&descriptor.name) else {
            // Registry and matrix are built from the same catalog; a miss
            // here means a wiring bug, and the safe answer is to refuse.
            tracing::warn!(tool = %descriptor.name, "tool missing from permission matrix");
            return AccessDecision::Deny {
                reason: format!("tool {} is not in the permission matrix", descriptor.name),
            };
        };

        if let Some(role) = principal
            .roles
            .iter()
            .copied()
            .find(|role| allowed.contains(role))
        {
            tracing::debug!(tool = %descriptor.name, principal = %principal.id, role = %role, "authorized by role");
            return AccessDecision::Allow {
                basis: AccessBasis::Role { role },
            };
        }

        if let ToolScope::OwnRecordOnly { .. } = descriptor.scope {
            if descriptor.is_read() && target.is_some_and(|t| t == principal.id.as_str()) {
                tracing::debug!(tool = %descriptor.name, principal = %principal.id, "authorized by self-service scope");
                return AccessDecision::Allow {
                    basis: AccessBasis::SelfService,
                };
            }
        }

        let roles: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        let mut reason = format!(
            "tool {} requires one of: {}",
            descriptor.name,
            roles.join(", ")
        );
        if descriptor.is_read() && descriptor.scope.subject_param().is_some() {
            reason.push_str(", or a call targeting your own record");
        }
        AccessDecision::Deny { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{Domain, ParamKind, ParamSpec};

    // ---- Fixtures ----

    fn hr_write_tool() -> ToolDescriptor {
        ToolDescriptor::mutating("update_salary", Domain::Hr).with_role(Role::HrWrite)
    }

    fn self_service_tool() -> ToolDescriptor {
        ToolDescriptor::read("get_employee", Domain::Hr)
            .with_role(Role::HrRead)
            .with_scope(ToolScope::OwnRecordOnly {
                subject_param: "employee_id".to_string(),
            })
            .with_param(ParamSpec::required("employee_id", ParamKind::String))
    }

    fn finance_tool() -> ToolDescriptor {
        ToolDescriptor::read("list_invoices", Domain::Finance).with_role(Role::FinanceRead)
    }

    fn authorizer() -> RoleAuthorizer {
        let descriptors = [hr_write_tool(), self_service_tool(), finance_tool()];
        RoleAuthorizer::from_descriptors(descriptors.iter()).unwrap()
    }

    fn principal(roles: impl IntoIterator<Item = Role>) -> Principal {
        Principal::new("emp-42", roles)
    }

    // ---- Role intersection ----

    #[test]
    fn test_matching_role_allows() {
        let decision = authorizer().authorize(&principal([Role::HrWrite]), &hr_write_tool(), None);
        assert_eq!(
            decision,
            AccessDecision::Allow {
                basis: AccessBasis::Role {
                    role: Role::HrWrite
                }
            }
        );
    }

    #[test]
    fn test_no_matching_role_denies() {
        let decision = authorizer().authorize(&principal([Role::User]), &hr_write_tool(), None);
        assert!(!decision.is_allow());
        let reason = decision.deny_reason().unwrap();
        assert!(reason.contains("update_salary"));
        assert!(reason.contains("hr-write"));
    }

    #[test]
    fn test_executive_superset_covers_hr() {
        let decision = authorizer().authorize(&principal([Role::Executive]), &hr_write_tool(), None);
        assert!(decision.is_allow());
    }

    #[test]
    fn test_hr_write_superset_covers_hr_reads() {
        let decision =
            authorizer().authorize(&principal([Role::HrWrite]), &self_service_tool(), None);
        assert!(decision.is_allow());
    }

    #[test]
    fn test_executive_is_not_a_finance_superset() {
        let decision = authorizer().authorize(&principal([Role::Executive]), &finance_tool(), None);
        assert!(!decision.is_allow());
    }

    // ---- Self-service scope ----

    #[test]
    fn test_self_service_allows_own_record() {
        let decision = authorizer().authorize(
            &principal([Role::User]),
            &self_service_tool(),
            Some("emp-42"),
        );
        assert_eq!(
            decision,
            AccessDecision::Allow {
                basis: AccessBasis::SelfService
            }
        );
    }

    #[test]
    fn test_self_service_denies_other_record() {
        let decision = authorizer().authorize(
            &principal([Role::User]),
            &self_service_tool(),
            Some("emp-99"),
        );
        assert!(!decision.is_allow());
        assert!(
            decision
                .deny_reason()
                .unwrap()
                .contains("your own record")
        );
    }

    #[test]
    fn test_self_service_denies_without_target() {
        let decision = authorizer().authorize(&principal([Role::User]), &self_service_tool(), None);
        assert!(!decision.is_allow());
    }

    #[test]
    fn test_self_service_never_covers_mutations() {
        // Even with own-record scope and a matching target, a mutating tool
        // needs a real role.
        let tool = ToolDescriptor::mutating("update_my_pension", Domain::Hr)
            .with_role(Role::HrWrite)
            .with_scope(ToolScope::OwnRecordOnly {
                subject_param: "employee_id".to_string(),
            })
            .with_param(ParamSpec::required("employee_id", ParamKind::String));
        let auth = RoleAuthorizer::from_descriptors([tool.clone()].iter()).unwrap();

        let decision = auth.authorize(&principal([Role::User]), &tool, Some("emp-42"));
        assert!(!decision.is_allow());
        assert!(!decision.deny_reason().unwrap().contains("your own record"));

        let decision = auth.authorize(&principal([Role::HrWrite]), &tool, Some("emp-42"));
        assert!(decision.is_allow());
    }

    #[test]
    fn test_any_record_scope_ignores_target() {
        // Target matching the caller does not help on an any-record tool.
        let decision = authorizer().authorize(
            &principal([Role::User]),
            &hr_write_tool(),
            Some("emp-42"),
        );
        assert!(!decision.is_allow());
    }

    #[test]
    fn test_role_match_wins_over_self_service_basis() {
        let decision = authorizer().authorize(
            &principal([Role::HrRead]),
            &self_service_tool(),
            Some("emp-42"),
        );
        assert_eq!(
            decision,
            AccessDecision::Allow {
                basis: AccessBasis::Role { role: Role::HrRead }
            }
        );
    }

    // ---- Whole-matrix property ----

    #[test]
    fn test_allow_iff_intersection_or_self_service() {
        let auth = authorizer();
        let tools = [hr_write_tool(), self_service_tool(), finance_tool()];
        for tool in &tools {
            let effective = auth.matrix().allowed_roles(&tool.name).unwrap().clone();
            for role in Role::all() {
                for target in [None, Some("emp-42"), Some("emp-99")] {
                    let p = principal([*role]);
                    let decision = auth.authorize(&p, tool, target);
                    let self_service = tool.is_read()
                        && tool.scope.subject_param().is_some()
                        && target == Some("emp-42");
                    let expected = effective.contains(role) || self_service;
                    assert_eq!(
                        decision.is_allow(),
                        expected,
                        "role {role} on {} with target {target:?}",
                        tool.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_unregistered_tool_fails_closed() {
        let stray = ToolDescriptor::read("stray_tool", Domain::Hr).with_role(Role::HrRead);
        let decision = authorizer().authorize(&principal([Role::HrRead]), &stray, None);
        assert!(!decision.is_allow());
        assert!(decision.deny_reason().unwrap().contains("permission matrix"));
    }

    #[test]
    fn test_decision_serialization() {
        let allow = AccessDecision::Allow {
            basis: AccessBasis::SelfService,
        };
        let wire = serde_json::to_value(&allow).unwrap();
        assert_eq!(wire["decision"], "allow");
        assert_eq!(wire["basis"]["kind"], "self_service");

        let deny = AccessDecision::Deny {
            reason: "nope".to_string(),
        };
        let wire = serde_json::to_value(&deny).unwrap();
        assert_eq!(wire["decision"], "deny");
        assert_eq!(wire["reason"], "nope");
    }
}
