//! The precomputed permission matrix.
//!
//! Built once at startup from the registered descriptors: each tool's
//! configured required roles unioned with its domain's superset roles.
//! A tool nobody could ever invoke is a configuration bug, so an empty
//! effective set fails the build instead of surfacing as a runtime gap.

use std::collections::{BTreeMap, BTreeSet};

use gatehouse_core::{Role, ToolDescriptor};
use thiserror::Error;

/// Startup validation failure for the permission matrix.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// A tool ended up with no role that could ever invoke it.
    #[error("tool {tool} has an empty allowed-role set")]
    NoAllowedRoles {
        /// The unreachable tool.
        tool: String,
    },
}

/// Effective allowed-role set per tool, immutable after startup.
#[derive(Debug, Clone, Default)]
pub struct PermissionMatrix {
    allowed: BTreeMap<String, BTreeSet<Role>>,
}

impl PermissionMatrix {
    /// Precompute the matrix from the registered descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::NoAllowedRoles`] when a tool's configured
    /// roles plus its domain supersets come out empty.
    pub fn build<'a>(
        descriptors: impl IntoIterator<Item = &'a ToolDescriptor>,
    ) -> Result<Self, MatrixError> {
        let mut allowed = BTreeMap::new();
        for descriptor in descriptors {
            let mut effective: BTreeSet<Role> = descriptor.required_roles.iter().copied().collect();
            effective.extend(descriptor.domain.superset_roles().iter().copied());
            if effective.is_empty() {
                return Err(MatrixError::NoAllowedRoles {
                    tool: descriptor.name.clone(),
                });
            }
            allowed.insert(descriptor.name.clone(), effective);
        }
        Ok(Self { allowed })
    }

    /// The effective allowed roles for `tool`.
    #[must_use]
    pub fn allowed_roles(&self, tool: &str) -> Option<&BTreeSet<Role>> {
        self.allowed.get(tool)
    }

    /// Number of tools in the matrix.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Whether the matrix holds no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
