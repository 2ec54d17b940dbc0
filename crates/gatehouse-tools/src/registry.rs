//! Name-keyed tool catalog, validated at startup.
//!
//! The registry is built once, before the gateway serves traffic, and is
//! read-only afterwards — concurrent readers need no locking. Registration
//! fails fast on the states the dispatcher must never see at runtime:
//! duplicate tool names and self-service scopes pointing at a parameter the
//! schema does not declare.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gatehouse_core::ToolDescriptor;
use thiserror::Error;

use crate::handler::ToolHandler;

/// Startup validation failures for the tool catalog.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two registrations used the same tool name.
    #[error("duplicate tool name: {name}")]
    DuplicateTool {
        /// The conflicting name.
        name: String,
    },

    /// An own-record-only scope names a parameter missing from the schema.
    #[error("tool {tool}: subject parameter {param} is not in the schema")]
    UnknownSubjectParam {
        /// The misconfigured tool.
        tool: String,
        /// The undeclared parameter name.
        param: String,
    },
}

/// A descriptor paired with its handler.
pub struct RegisteredTool {
    /// Static facts about the tool.
    pub descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    /// The collaborator handler backing this tool.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Static catalog mapping tool name to descriptor and handler.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Look up a registered tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Look up just the descriptor by name.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|tool| &tool.descriptor)
    }

    /// All descriptors, ordered by tool name.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|tool| &tool.descriptor)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder enforcing catalog validity at registration time.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistryBuilder {
    /// Register a descriptor with its handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] when the name is taken, and
    /// [`RegistryError::UnknownSubjectParam`] when an own-record-only scope
    /// references a parameter the schema does not declare.
    pub fn register(
        mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, RegistryError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name.clone(),
            });
        }
        if let Some(param) = descriptor.scope.subject_param() {
            if descriptor.param(param).is_none() {
                return Err(RegistryError::UnknownSubjectParam {
                    tool: descriptor.name.clone(),
                    param: param.to_string(),
                });
            }
        }
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                handler,
            },
        );
        Ok(self)
    }

    /// Finish building; the registry is immutable from here on.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::UpstreamResult;
    use async_trait::async_trait;
    use gatehouse_core::{Domain, ParamKind, ParamSpec, Role, ToolScope};
    use serde_json::Value;

    struct NullHandler;

    #[async_trait]
    impl ToolHandler for NullHandler {
        async fn fetch(&self, _params: &Value, _limit: usize) -> UpstreamResult<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn list_employees() -> ToolDescriptor {
        ToolDescriptor::read("list_employees", Domain::Hr).with_role(Role::HrRead)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ToolRegistry::builder()
            .register(list_employees(), Arc::new(NullHandler))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert!(registry.get("list_employees").is_some());
        assert!(registry.descriptor("list_employees").is_some());
        assert!(registry.get("unknown_tool").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = ToolRegistry::builder()
            .register(list_employees(), Arc::new(NullHandler))
            .unwrap()
            .register(list_employees(), Arc::new(NullHandler));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateTool { name }) if name == "list_employees"
        ));
    }

    #[test]
    fn test_subject_param_must_be_declared() {
        let descriptor = ToolDescriptor::read("get_employee", Domain::Hr)
            .with_role(Role::HrRead)
            .with_scope(ToolScope::OwnRecordOnly {
                subject_param: "employee_id".to_string(),
            });

        // Schema lacks employee_id entirely.
        let result = ToolRegistry::builder().register(descriptor.clone(), Arc::new(NullHandler));
        assert!(matches!(
            result,
            Err(RegistryError::UnknownSubjectParam { ref param, .. }) if param == "employee_id"
        ));

        // Declaring the parameter fixes it.
        let fixed = descriptor.with_param(ParamSpec::required("employee_id", ParamKind::String));
        assert!(
            ToolRegistry::builder()
                .register(fixed, Arc::new(NullHandler))
                .is_ok()
        );
    }

    #[test]
    fn test_descriptors_ordered_by_name() {
        let registry = ToolRegistry::builder()
            .register(
                ToolDescriptor::read("list_tickets", Domain::Support).with_role(Role::SupportRead),
                Arc::new(NullHandler),
            )
            .unwrap()
            .register(list_employees(), Arc::new(NullHandler))
            .unwrap()
            .build();

        let names: Vec<&str> = registry.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["list_employees", "list_tickets"]);
    }
}
