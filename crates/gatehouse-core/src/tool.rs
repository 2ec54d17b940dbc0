//! Tool descriptors and invocations.
//!
//! A descriptor is static: loaded from configuration at process start and
//! immutable thereafter. The parameter schema is an explicit typed list, not
//! a reflective one — validation walks the specs, never the handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::principal::{Domain, Principal, Role};
use crate::timestamp::Timestamp;

/// The kind of value a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// JSON string.
    String,
    /// JSON integer (no fraction).
    Integer,
    /// Any JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl ParamKind {
    /// Whether `value` is of this kind.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        };
        write!(f, "{name}")
    }
}

/// Schema for one tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name as it appears in the payload.
    pub name: String,
    /// Accepted value kind.
    pub kind: ParamKind,
    /// Whether the payload must carry this parameter.
    pub required: bool,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    /// A required parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: String::new(),
        }
    }

    /// An optional parameter.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: String::new(),
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Which records a tool may touch relative to the calling principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ToolScope {
    /// The tool may target any record its roles allow.
    AnyRecord,
    /// The tool may also be invoked by a principal targeting its own record,
    /// even without one of the required roles.
    OwnRecordOnly {
        /// The payload parameter carrying the target subject identifier.
        subject_param: String,
    },
}

impl ToolScope {
    /// The subject parameter name, for self-service scoped tools.
    #[must_use]
    pub fn subject_param(&self) -> Option<&str> {
        match self {
            ToolScope::AnyRecord => None,
            ToolScope::OwnRecordOnly { subject_param } => Some(subject_param),
        }
    }
}

/// Static description of one tool: identity, schema, and authorization facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Business domain the tool belongs to.
    pub domain: Domain,
    /// Human-readable description.
    pub description: String,
    /// Whether invoking the tool mutates domain state.
    pub mutating: bool,
    /// Roles sufficient to invoke the tool (any-of semantics).
    pub required_roles: BTreeSet<Role>,
    /// Record scope relative to the caller.
    pub scope: ToolScope,
    /// Typed parameter schema.
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// A read tool descriptor with no roles or parameters yet.
    #[must_use]
    pub fn read(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            domain,
            description: String::new(),
            mutating: false,
            required_roles: BTreeSet::new(),
            scope: ToolScope::AnyRecord,
            params: Vec::new(),
        }
    }

    /// A mutating tool descriptor with no roles or parameters yet.
    #[must_use]
    pub fn mutating(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            mutating: true,
            ..Self::read(name, domain)
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a sufficient role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.required_roles.insert(role);
        self
    }

    /// Set the record scope.
    #[must_use]
    pub fn with_scope(mut self, scope: ToolScope) -> Self {
        self.scope = scope;
        self
    }

    /// Add a parameter spec.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Whether this is a read (non-mutating) tool.
    #[must_use]
    pub fn is_read(&self) -> bool {
        !self.mutating
    }

    /// Look up a parameter spec by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }
}

impl fmt::Display for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.mutating { "write" } else { "read" };
        write!(f, "{} ({} {})", self.name, self.domain, kind)
    }
}

/// One request against the gateway.
///
/// Created per call and discarded once a response is produced (reads) or a
/// pending record exists (writes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The tool being invoked.
    pub tool: String,
    /// The authenticated caller.
    pub principal: Principal,
    /// JSON parameter payload.
    pub parameters: Value,
    /// Arrival time.
    pub received_at: Timestamp,
}

impl ToolInvocation {
    /// Create an invocation arriving now.
    #[must_use]
    pub fn new(tool: impl Into<String>, principal: Principal, parameters: Value) -> Self {
        Self {
            tool: tool.into(),
            principal,
            parameters,
            received_at: Timestamp::now(),
        }
    }

    /// The payload value of `param`, if present.
    #[must_use]
    pub fn parameter(&self, param: &str) -> Option<&Value> {
        self.parameters.get(param)
    }
}
