//! Principals, roles, and domains.
//!
//! A principal arrives from the identity layer with a resolved, immutable set
//! of roles for the duration of one invocation. Roles are a closed enum so an
//! unknown role string is a parse error at the boundary, not a silent no-op at
//! authorization time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::ids::PrincipalId;

/// The closed set of roles the gateway understands.
///
/// Serialized kebab-case (`hr-read`, `finance-write`, ...), matching what the
/// identity provider attaches to a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Baseline role every authenticated employee holds.
    User,
    /// People manager; may hold record-approval duties.
    Manager,
    /// Executive; satisfies any HR-domain tool.
    Executive,
    /// Read access to HR records.
    HrRead,
    /// Write access to HR records; satisfies any HR-domain tool.
    HrWrite,
    /// Read access to finance records.
    FinanceRead,
    /// Write access to finance records.
    FinanceWrite,
    /// Read access to sales records.
    SalesRead,
    /// Write access to sales records.
    SalesWrite,
    /// Read access to support tickets.
    SupportRead,
    /// Write access to support tickets.
    SupportWrite,
}

impl Role {
    /// Every role, in declaration order. Used to exercise the full
    /// authorization matrix in tests and startup validation.
    #[must_use]
    pub fn all() -> &'static [Role] {
        &[
            Role::User,
            Role::Manager,
            Role::Executive,
            Role::HrRead,
            Role::HrWrite,
            Role::FinanceRead,
            Role::FinanceWrite,
            Role::SalesRead,
            Role::SalesWrite,
            Role::SupportRead,
            Role::SupportWrite,
        ]
    }

    /// The kebab-case name used on the wire and in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Executive => "executive",
            Role::HrRead => "hr-read",
            Role::HrWrite => "hr-write",
            Role::FinanceRead => "finance-read",
            Role::FinanceWrite => "finance-write",
            Role::SalesRead => "sales-read",
            Role::SalesWrite => "sales-write",
            Role::SupportRead => "support-read",
            Role::SupportWrite => "support-write",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Error returned when a role string is not part of the closed role set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// The business domain a tool belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Employee records.
    Hr,
    /// Invoices and payments.
    Finance,
    /// Opportunities and quotas.
    Sales,
    /// Support tickets.
    Support,
}

impl Domain {
    /// Roles that satisfy any descriptor in this domain regardless of the
    /// descriptor's own required-role set.
    ///
    /// `executive` and `hr-write` are supersets over the HR domain; the other
    /// domains have no superset roles.
    #[must_use]
    pub fn superset_roles(self) -> &'static [Role] {
        match self {
            Domain::Hr => &[Role::Executive, Role::HrWrite],
            Domain::Finance | Domain::Sales | Domain::Support => &[],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Hr => "hr",
            Domain::Finance => "finance",
            Domain::Sales => "sales",
            Domain::Support => "support",
        };
        write!(f, "{name}")
    }
}

/// An authenticated caller: stable identifier plus resolved role set.
///
/// Immutable for the lifetime of one invocation. Created by the identity
/// layer in front of the gateway; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier from the identity provider.
    pub id: PrincipalId,
    /// Resolved roles; order is irrelevant.
    pub roles: BTreeSet<Role>,
}

impl Principal {
    /// Create a principal from an identifier and its resolved roles.
    #[must_use]
    pub fn new(id: impl Into<PrincipalId>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Whether the principal holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the principal holds at least one of `roles`.
    #[must_use]
    pub fn has_any(&self, roles: impl IntoIterator<Item = Role>) -> bool {
        roles.into_iter().any(|role| self.roles.contains(&role))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        write!(f, "{} [{}]", self.id, roles.join(", "))
    }
}
