//! JSON-RPC API definition for the gateway boundary.
//!
//! Uses jsonrpsee proc macros to define the RPC interface. The gateway
//! daemon implements the server side; agent frontends implement the client
//! side.
//!
//! Domain outcomes — including every rejection in the gateway's error
//! taxonomy — travel inside the [`ToolResult`] envelope, discriminated by
//! `status`. JSON-RPC protocol errors are reserved for requests that never
//! reach the dispatcher: unknown methods and parameters that fail to parse,
//! unknown role strings included.

use std::collections::BTreeSet;

use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use gatehouse_core::{ConfirmationId, Domain, Principal, Role, ToolDescriptor, ToolResult};

// ---------- Wire types ----------

/// The authenticated caller, as resolved by the identity layer in front of
/// the gateway.
///
/// The gateway trusts this object as presented; authenticating the session
/// it rides on is the job of the layer that injected it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePrincipal {
    /// Stable subject identifier.
    pub subject: String,
    /// Resolved roles for this request.
    pub roles: BTreeSet<Role>,
}

impl From<WirePrincipal> for Principal {
    fn from(wire: WirePrincipal) -> Self {
        Principal::new(wire.subject, wire.roles)
    }
}

/// One tool invocation as an agent submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Catalog name of the tool to invoke.
    pub tool: String,
    /// Invocation parameters; each tool declares its own schema.
    #[serde(default = "empty_object")]
    pub parameters: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A resolution of one pending confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRequest {
    /// The confirmation to resolve.
    pub confirmation_id: ConfirmationId,
    /// `true` approves the staged mutation; `false` rejects it.
    pub approved: bool,
    /// Optional note from the resolver, kept on the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Catalog summary of one tool, as returned by `listTools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    /// Catalog name, exactly as `invoke` expects it.
    pub name: String,
    /// Business domain.
    pub domain: Domain,
    /// Human-readable description.
    pub description: String,
    /// Whether invoking it stages a mutation for confirmation.
    pub mutating: bool,
    /// Roles sufficient to invoke it, any-of semantics.
    pub required_roles: Vec<Role>,
}

impl From<&ToolDescriptor> for ToolSummary {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            domain: descriptor.domain,
            description: descriptor.description.clone(),
            mutating: descriptor.mutating,
            required_roles: descriptor.required_roles.iter().copied().collect(),
        }
    }
}

/// Live gateway figures returned by `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    /// Gateway version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Number of registered tools.
    pub tool_count: usize,
    /// Number of unresolved confirmations.
    pub pending_confirmations: usize,
}

// ---------- RPC API ----------

/// The Gatehouse gateway RPC API.
///
/// Implemented by the gateway daemon (server side).
/// Called by agent frontends (client side).
#[rpc(server, client, namespace = "gatehouse")]
pub trait GatehouseRpc {
    /// Invoke a tool on behalf of a principal.
    ///
    /// Always returns a result envelope; authorization failures, validation
    /// failures, and upstream errors arrive as `status: "error"`, staged
    /// mutations as `status: "pending_confirmation"`.
    #[method(name = "invoke")]
    async fn invoke(
        &self,
        principal: WirePrincipal,
        request: InvokeRequest,
    ) -> Result<ToolResult, ErrorObjectOwned>;

    /// Resolve a pending confirmation; approval applies the staged mutation.
    #[method(name = "resolve")]
    async fn resolve(
        &self,
        principal: WirePrincipal,
        resolution: ResolutionRequest,
    ) -> Result<ToolResult, ErrorObjectOwned>;

    /// List the tools the principal is currently authorized to invoke.
    #[method(name = "listTools")]
    async fn list_tools(
        &self,
        principal: WirePrincipal,
    ) -> Result<Vec<ToolSummary>, ErrorObjectOwned>;

    /// Gateway status: version, uptime, catalog and confirmation counts.
    #[method(name = "status")]
    async fn status(&self) -> Result<GatewayStatus, ErrorObjectOwned>;
}
