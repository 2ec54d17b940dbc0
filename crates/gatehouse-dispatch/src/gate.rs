//! Deployment-configured resolution authorization.

use std::sync::Arc;

use gatehouse_authz::RoleAuthorizer;
use gatehouse_confirm::{ConfirmationRecord, IssuerGate, ResolutionGate, RoleGate};
use gatehouse_config::{ResolutionPolicy, ResolutionSection};
use gatehouse_core::Principal;
use gatehouse_tools::ToolRegistry;

/// The [`ResolutionGate`] variants a deployment can configure.
///
/// `issuer` and `approver` delegate to the broker's simple gates. The
/// `authorized` policy asks the same question as invocation itself: whoever
/// could have invoked the confirmation's tool may also resolve it.
pub enum PolicyResolutionGate {
    /// Only the issuing principal may resolve.
    Issuer(IssuerGate),
    /// Holders of the configured approver roles may resolve.
    Approver(RoleGate),
    /// Principals authorized for the confirmation's own tool may resolve.
    Authorized {
        /// Catalog for looking the tool up by name.
        registry: Arc<ToolRegistry>,
        /// The invocation-path authorizer, reused unchanged.
        authorizer: Arc<RoleAuthorizer>,
    },
}

impl PolicyResolutionGate {
    /// Builds the gate named by the deployment's `[resolution]` section.
    #[must_use]
    pub fn from_config(
        resolution: &ResolutionSection,
        registry: Arc<ToolRegistry>,
        authorizer: Arc<RoleAuthorizer>,
    ) -> Self {
        match resolution.policy {
            ResolutionPolicy::Issuer => Self::Issuer(IssuerGate),
            ResolutionPolicy::Approver => {
                Self::Approver(RoleGate::new(resolution.approver_roles.iter().copied()))
            },
            ResolutionPolicy::Authorized => Self::Authorized {
                registry,
                authorizer,
            },
        }
    }
}

impl ResolutionGate for PolicyResolutionGate {
    fn may_resolve(&self, principal: &Principal, record: &ConfirmationRecord) -> bool {
        match self {
            Self::Issuer(gate) => gate.may_resolve(principal, record),
            Self::Approver(gate) => gate.may_resolve(principal, record),
            Self::Authorized {
                registry,
                authorizer,
            } => {
                let Some(descriptor) = registry.descriptor(&record.tool_name) else {
                    // A record for a tool no longer in the catalog; refuse
                    // and let it expire.
                    tracing::warn!(tool = %record.tool_name, "confirmation references an unregistered tool");
                    return false;
                };
                // No self-service target here: resolving a mutation takes a
                // real role.
                authorizer.authorize(principal, descriptor, None).is_allow()
            },
        }
    }
}

impl std::fmt::Debug for PolicyResolutionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let policy = match self {
            Self::Issuer(_) => "issuer",
            Self::Approver(_) => "approver",
            Self::Authorized { .. } => "authorized",
        };
        f.debug_struct("PolicyResolutionGate")
            .field("policy", &policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_config::load_default;
    use gatehouse_core::{ChangePreview, ConfirmationData, Role};
    use gatehouse_tools::{ToolHandler, ToolRegistry};
    use serde_json::json;

    struct NoopHandler;
    impl ToolHandler for NoopHandler {}

    fn registry_and_authorizer() -> (Arc<ToolRegistry>, Arc<RoleAuthorizer>) {
        let config = load_default().unwrap();
        let mut builder = ToolRegistry::builder();
        for descriptor in config.descriptors().unwrap() {
            builder = builder.register(descriptor, Arc::new(NoopHandler)).unwrap();
        }
        let registry = Arc::new(builder.build());
        let authorizer =
            Arc::new(RoleAuthorizer::from_descriptors(registry.descriptors()).unwrap());
        (registry, authorizer)
    }

    fn salary_record(issuer: &Principal) -> ConfirmationRecord {
        ConfirmationRecord::new(
            "update_salary",
            issuer,
            json!({"employeeId": "E-1", "newSalary": 80_000}),
            ConfirmationData::new(
                "update_salary",
                json!({"employeeId": "E-1", "newSalary": 80_000}),
                ChangePreview::new("Update salary"),
            ),
            300,
        )
    }

    #[test]
    fn test_authorized_policy_mirrors_invocation_authority() {
        let (registry, authorizer) = registry_and_authorizer();
        let section = ResolutionSection::default();
        let gate = PolicyResolutionGate::from_config(&section, registry, authorizer);

        let issuer = Principal::new("agent-7", [Role::HrWrite]);
        let record = salary_record(&issuer);

        let hr_manager = Principal::new("mgr-1", [Role::HrWrite]);
        let executive = Principal::new("ceo-1", [Role::Executive]);
        let finance = Principal::new("fin-1", [Role::FinanceWrite]);

        assert!(gate.may_resolve(&hr_manager, &record));
        assert!(gate.may_resolve(&executive, &record), "hr superset applies");
        assert!(!gate.may_resolve(&finance, &record));
    }

    #[test]
    fn test_authorized_policy_refuses_unregistered_tools() {
        let (registry, authorizer) = registry_and_authorizer();
        let gate = PolicyResolutionGate::from_config(
            &ResolutionSection::default(),
            registry,
            authorizer,
        );

        let issuer = Principal::new("agent-7", [Role::HrWrite]);
        let mut record = salary_record(&issuer);
        record.tool_name = "retired_tool".to_string();

        let executive = Principal::new("ceo-1", [Role::Executive]);
        assert!(!gate.may_resolve(&executive, &record));
    }

    #[test]
    fn test_issuer_policy_via_config() {
        let (registry, authorizer) = registry_and_authorizer();
        let section = ResolutionSection {
            policy: ResolutionPolicy::Issuer,
            approver_roles: Vec::new(),
        };
        let gate = PolicyResolutionGate::from_config(&section, registry, authorizer);

        let issuer = Principal::new("agent-7", [Role::HrWrite]);
        let record = salary_record(&issuer);
        let executive = Principal::new("ceo-1", [Role::Executive]);

        assert!(gate.may_resolve(&issuer, &record));
        assert!(!gate.may_resolve(&executive, &record));
    }

    #[test]
    fn test_approver_policy_via_config() {
        let (registry, authorizer) = registry_and_authorizer();
        let section = ResolutionSection {
            policy: ResolutionPolicy::Approver,
            approver_roles: vec![Role::Manager],
        };
        let gate = PolicyResolutionGate::from_config(&section, registry, authorizer);

        let issuer = Principal::new("agent-7", [Role::HrWrite]);
        let record = salary_record(&issuer);

        let manager = Principal::new("mgr-1", [Role::Manager]);
        assert!(gate.may_resolve(&manager, &record));
        assert!(!gate.may_resolve(&issuer, &record), "issuer lacks the approver role");
    }
}
