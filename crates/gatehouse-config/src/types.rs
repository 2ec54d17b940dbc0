//! Configuration types for the Gatehouse gateway.
//!
//! Every section implements [`Default`] with production values, so a bare
//! `[section]` header in TOML produces a working configuration. The tool
//! catalog is the exception: its entries describe real upstream operations
//! and come from `defaults.toml` or the deployment's own file.

use serde::{Deserialize, Serialize};

use gatehouse_core::{Domain, ParamKind, ParamSpec, Role, ToolDescriptor, ToolScope};

use crate::error::{ConfigError, ConfigResult};

// ---------------------------------------------------------------------------
// Top-level GatewayConfig
// ---------------------------------------------------------------------------

/// Root configuration for the gateway.
///
/// Loaded from the embedded defaults with an optional deployment file merged
/// on top. Note that a `[[tools]]` array in the deployment file replaces the
/// stock catalog wholesale; arrays do not merge entry-by-entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen address and transport settings.
    pub server: ServerSection,
    /// Truncation, TTL, and retry limits.
    pub limits: LimitsSection,
    /// Who may resolve pending confirmations.
    pub resolution: ResolutionSection,
    /// The tool catalog exposed to agents.
    pub tools: Vec<ToolConfig>,
}

impl GatewayConfig {
    /// Converts the catalog into core descriptors.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an entry whose scope and parameters are
    /// inconsistent. [`crate::validate`] reports the same problems with more
    /// context; this conversion just refuses to build a broken descriptor.
    pub fn descriptors(&self) -> ConfigResult<Vec<ToolDescriptor>> {
        self.tools.iter().map(ToolConfig::descriptor).collect()
    }
}

// ---------------------------------------------------------------------------
// ServerSection
// ---------------------------------------------------------------------------

/// Listen address for the JSON-RPC frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// `host:port` the WebSocket server binds to.
    pub listen_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7410".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// LimitsSection
// ---------------------------------------------------------------------------

/// Result-set and confirmation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    /// Server-wide truncation threshold for read results. Callers may lower
    /// it per call but never raise it.
    pub truncation_threshold: usize,
    /// How long a pending confirmation stays resolvable, in seconds.
    pub confirmation_ttl_secs: u64,
    /// How long concluded confirmations linger for duplicate-resolution
    /// detection before eviction, in seconds.
    pub resolved_retention_secs: u64,
    /// Backoff before the single retry of a timed-out read, in milliseconds.
    pub read_retry_backoff_ms: u64,
    /// Interval between confirmation sweep passes, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            truncation_threshold: 50,
            confirmation_ttl_secs: 300,
            resolved_retention_secs: 60,
            read_retry_backoff_ms: 250,
            sweep_interval_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// ResolutionSection
// ---------------------------------------------------------------------------

/// Which principals may resolve pending confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Only the principal that issued the original call.
    Issuer,
    /// Any principal authorized to invoke the confirmation's own tool.
    Authorized,
    /// Any principal holding one of `approver_roles`.
    Approver,
}

/// Resolution authorization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSection {
    /// The active policy.
    pub policy: ResolutionPolicy,
    /// Roles admitted by the `approver` policy; ignored otherwise.
    pub approver_roles: Vec<Role>,
}

impl Default for ResolutionSection {
    fn default() -> Self {
        Self {
            policy: ResolutionPolicy::Authorized,
            approver_roles: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool catalog
// ---------------------------------------------------------------------------

/// Record-targeting scope of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeKind {
    /// The tool may target any record its roles allow.
    #[default]
    Any,
    /// Callers without a qualifying role may only target their own record.
    OwnRecord,
}

/// One tool in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Unique tool name, as agents invoke it.
    pub name: String,
    /// Business domain; determines which superset roles apply.
    pub domain: Domain,
    /// Human-readable description surfaced by tool listing.
    #[serde(default)]
    pub description: String,
    /// Whether the tool mutates upstream state (and therefore confirms).
    pub mutating: bool,
    /// Roles that may invoke the tool, any-of semantics.
    pub roles: Vec<Role>,
    /// Record-targeting scope.
    #[serde(default)]
    pub scope: ScopeKind,
    /// Parameter carrying the target record id; required for `own-record`
    /// scope, meaningless otherwise.
    #[serde(default)]
    pub subject_param: Option<String>,
    /// Declared parameters; anything undeclared is rejected on mutations.
    #[serde(default)]
    pub params: Vec<ParamConfig>,
}

impl ToolConfig {
    /// Builds the core descriptor for this entry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `scope = "own-record"` without a
    /// `subject_param`.
    pub fn descriptor(&self) -> ConfigResult<ToolDescriptor> {
        let mut descriptor = if self.mutating {
            ToolDescriptor::mutating(&self.name, self.domain)
        } else {
            ToolDescriptor::read(&self.name, self.domain)
        };
        descriptor = descriptor.with_description(&self.description);
        for role in &self.roles {
            descriptor = descriptor.with_role(*role);
        }
        match self.scope {
            ScopeKind::Any => {},
            ScopeKind::OwnRecord => {
                let Some(subject_param) = &self.subject_param else {
                    return Err(ConfigError::ValidationError {
                        field: format!("tools.{}.subject_param", self.name),
                        message: "own-record scope requires subject_param".to_string(),
                    });
                };
                descriptor = descriptor.with_scope(ToolScope::OwnRecordOnly {
                    subject_param: subject_param.clone(),
                });
            },
        }
        for param in &self.params {
            descriptor = descriptor.with_param(param.spec());
        }
        Ok(descriptor)
    }
}

/// One declared parameter of a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamConfig {
    /// Parameter name as it appears in the invocation payload.
    pub name: String,
    /// Expected JSON kind.
    pub kind: ParamKind,
    /// Whether the parameter must be present. Defaults to true.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Human-readable description surfaced by tool listing.
    #[serde(default)]
    pub description: String,
}

impl ParamConfig {
    fn spec(&self) -> ParamSpec {
        let spec = if self.required {
            ParamSpec::required(&self.name, self.kind)
        } else {
            ParamSpec::optional(&self.name, self.kind)
        };
        spec.with_description(&self.description)
    }
}

fn default_true() -> bool {
    true
}
