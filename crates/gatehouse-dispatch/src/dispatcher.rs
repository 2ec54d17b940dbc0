//! The dispatcher: every invocation runs the same gauntlet.
//!
//! Invoke flow:
//! 1. Catalog lookup. Unknown names fail with `UNKNOWN_TOOL`; nothing is
//!    audited because no authorization decision was made.
//! 2. Authorization. Role intersection plus the self-service exception,
//!    recorded to the audit log whichever way it goes. Denials stop here;
//!    no collaborator ever sees an unauthorized payload.
//! 3. Read tools: a bounded fetch through the truncation guard, with one
//!    retry after a collaborator timeout.
//! 4. Mutating tools: schema validation, collaborator preview, then a
//!    parked confirmation. The collaborator's `apply` runs only after a
//!    resolution lands on approved, and exactly once.
//!
//! Resolution enters through [`Dispatcher::resolve`], expiry through the
//! periodic [`Dispatcher::expire_sweep`]. Both leave audit records.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::{Value, json};

use gatehouse_audit::{AuditAction, AuditLog, AuditOutcome};
use gatehouse_authz::{AccessBasis, AccessDecision, RoleAuthorizer};
use gatehouse_confirm::{
    ConfirmationBroker, ConfirmationRecord, ConfirmationState, ResolutionDecision, SweepStats,
};
use gatehouse_core::{
    ConfirmationData, ConfirmationId, ErrorCode, GatewayError, GatewayResult, Principal, Timestamp,
    ToolDescriptor, ToolInvocation, ToolResult,
};
use gatehouse_tools::{
    RegisteredTool, ToolRegistry, TruncationGuard, UpstreamError, validate_params,
};

/// Default pause before the single read retry, before jitter.
pub const DEFAULT_READ_RETRY_BACKOFF_MS: u64 = 250;

/// Reserved read parameter letting a caller lower the row ceiling.
const LIMIT_PARAM: &str = "limit";

/// Routes invocations and resolutions through authorization, bounding, and
/// the confirmation broker.
///
/// The dispatcher owns no domain state. The registry and authorizer are
/// read-only after startup; the broker's record store is the only shared
/// mutable state, and it synchronizes itself.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    authorizer: Arc<RoleAuthorizer>,
    broker: Arc<ConfirmationBroker>,
    guard: TruncationGuard,
    audit: AuditLog,
    retry_backoff_ms: u64,
}

impl Dispatcher {
    /// A dispatcher with the default truncation guard, no audit sinks, and
    /// the default retry backoff.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        authorizer: Arc<RoleAuthorizer>,
        broker: Arc<ConfirmationBroker>,
    ) -> Self {
        Self {
            registry,
            authorizer,
            broker,
            guard: TruncationGuard::default(),
            audit: AuditLog::new(),
            retry_backoff_ms: DEFAULT_READ_RETRY_BACKOFF_MS,
        }
    }

    /// Replaces the truncation guard.
    #[must_use]
    pub fn with_truncation_guard(mut self, guard: TruncationGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Replaces the audit log.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Overrides the base pause before the single read retry.
    #[must_use]
    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Runs one tool invocation to a terminal [`ToolResult`].
    ///
    /// Never panics and never returns early without a response shape: every
    /// failure an agent can cause maps to an `error` result with a
    /// machine-readable code.
    pub async fn invoke(&self, invocation: ToolInvocation) -> ToolResult {
        let Some(tool) = self.registry.get(&invocation.tool) else {
            tracing::debug!(tool = %invocation.tool, "unknown tool requested");
            return GatewayError::UnknownTool {
                name: invocation.tool.clone(),
            }
            .into();
        };
        let descriptor = &tool.descriptor;

        // The self-service target, when the tool's scope names one.
        let target = descriptor
            .scope
            .subject_param()
            .and_then(|param| invocation.parameter(param))
            .and_then(Value::as_str);

        let action = AuditAction::ToolAuthorization {
            tool: descriptor.name.clone(),
            principal: invocation.principal.id.clone(),
        };
        match self
            .authorizer
            .authorize(&invocation.principal, descriptor, target)
        {
            AccessDecision::Allow { basis } => {
                self.audit
                    .observe(action, AuditOutcome::success_with(basis_details(&basis)))
                    .await;
            },
            AccessDecision::Deny { reason } => {
                self.audit
                    .observe(action, AuditOutcome::failure(reason.clone()))
                    .await;
                return GatewayError::Forbidden { reason }.into();
            },
        }

        if descriptor.is_read() {
            self.dispatch_read(&invocation, tool).await
        } else {
            self.dispatch_mutation(&invocation, tool).await
        }
    }

    /// Resolves a pending confirmation and, on approval, applies the stored
    /// mutation.
    ///
    /// The broker's transition is atomic: of any number of concurrent
    /// resolvers, exactly one wins. The collaborator mutation runs once for
    /// that winner and is never retried; a collaborator failure is surfaced
    /// with the record left in its approved state.
    pub async fn resolve(
        &self,
        id: ConfirmationId,
        decision: ResolutionDecision,
        resolver: &Principal,
        comments: Option<String>,
    ) -> ToolResult {
        let action = AuditAction::ConfirmationResolution {
            confirmation: id,
            resolver: resolver.id.clone(),
        };
        let record = match self.broker.resolve(id, decision, resolver, comments) {
            Ok(record) => record,
            Err(err) => {
                self.audit
                    .observe(action, AuditOutcome::failure(err.code().as_str()))
                    .await;
                return err.into();
            },
        };

        if record.state == ConfirmationState::Approved {
            self.audit
                .observe(action, AuditOutcome::success_with("approved"))
                .await;
            self.apply_confirmed(&record).await
        } else {
            self.audit
                .observe(action, AuditOutcome::success_with("rejected"))
                .await;
            ToolResult::success(json!({
                "resolution": "rejected",
                "confirmationId": record.id,
            }))
        }
    }

    /// Runs one expiry pass against the wall clock.
    pub async fn expire_sweep(&self) -> SweepStats {
        self.expire_sweep_at(Timestamp::now()).await
    }

    /// Runs one expiry pass as of `now`, auditing each record it flips.
    pub async fn expire_sweep_at(&self, now: Timestamp) -> SweepStats {
        let stats = self.broker.expire_sweep_at(now);
        for id in &stats.expired {
            // Retention counts from conclusion, so a record flipped in this
            // pass outlives it and the lookup cannot miss.
            let Some(record) = self.broker.get(*id) else {
                continue;
            };
            self.audit
                .observe(
                    AuditAction::ConfirmationExpired {
                        confirmation: record.id,
                        tool: record.tool_name,
                    },
                    AuditOutcome::failure(ErrorCode::Expired.as_str()),
                )
                .await;
        }
        stats
    }

    /// The descriptors `principal` could invoke right now, including
    /// self-service reads against their own record.
    #[must_use]
    pub fn visible_tools(&self, principal: &Principal) -> Vec<&ToolDescriptor> {
        self.registry
            .descriptors()
            .filter(|descriptor| {
                self.authorizer
                    .authorize(principal, descriptor, Some(principal.id.as_str()))
                    .is_allow()
            })
            .collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of confirmations currently awaiting resolution.
    #[must_use]
    pub fn pending_confirmations(&self) -> usize {
        self.broker.pending_count()
    }

    /// The active truncation threshold.
    #[must_use]
    pub fn truncation_threshold(&self) -> usize {
        self.guard.threshold()
    }

    /// The TTL stamped on new confirmations, in seconds.
    #[must_use]
    pub fn confirmation_ttl_secs(&self) -> u64 {
        self.broker.ttl_secs()
    }

    // ---- Read path ----

    async fn dispatch_read(&self, invocation: &ToolInvocation, tool: &RegisteredTool) -> ToolResult {
        let guard = requested_limit(invocation)
            .map_or(self.guard, |limit| self.guard.lowered_to(limit));

        match self
            .fetch_with_retry(tool, &invocation.parameters, guard.probe_limit())
            .await
        {
            Ok(items) => {
                let (items, metadata) = guard.apply(items);
                ToolResult::success_with(Value::Array(items), metadata)
            },
            Err(err) => err.into(),
        }
    }

    /// One fetch, with a single retry after a collaborator timeout. Reads
    /// are idempotent; nothing else is ever retried.
    async fn fetch_with_retry(
        &self,
        tool: &RegisteredTool,
        params: &Value,
        limit: usize,
    ) -> GatewayResult<Vec<Value>> {
        let name = &tool.descriptor.name;
        match tool.handler().fetch(params, limit).await {
            Ok(items) => Ok(items),
            Err(UpstreamError::Timeout) => {
                let backoff_ms = self.retry_backoff_with_jitter();
                tracing::warn!(tool = %name, backoff_ms, "collaborator fetch timed out; retrying once");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                tool.handler()
                    .fetch(params, limit)
                    .await
                    .map_err(|err| map_upstream(name, err))
            },
            Err(err) => Err(map_upstream(name, err)),
        }
    }

    fn retry_backoff_with_jitter(&self) -> u64 {
        let jitter = rand::thread_rng().gen_range(0..=self.retry_backoff_ms / 4);
        self.retry_backoff_ms.saturating_add(jitter)
    }

    // ---- Mutation path ----

    async fn dispatch_mutation(
        &self,
        invocation: &ToolInvocation,
        tool: &RegisteredTool,
    ) -> ToolResult {
        let descriptor = &tool.descriptor;
        if let Err(err) = validate_params(descriptor, &invocation.parameters) {
            tracing::debug!(tool = %descriptor.name, %err, "mutation payload rejected");
            return err.into();
        }

        let preview = match tool.handler().preview(&invocation.parameters).await {
            Ok(preview) => preview,
            Err(err) => return map_upstream(&descriptor.name, err).into(),
        };

        let data = ConfirmationData::new(
            descriptor.name.as_str(),
            invocation.parameters.clone(),
            preview,
        );
        let record = self.broker.issue(
            &descriptor.name,
            &invocation.principal,
            invocation.parameters.clone(),
            data,
        );
        self.audit
            .observe(
                AuditAction::ConfirmationIssued {
                    tool: record.tool_name.clone(),
                    principal: record.issued_by.clone(),
                    confirmation: record.id,
                },
                AuditOutcome::success(),
            )
            .await;

        let message = format!("Confirmation required: {}", record.confirmation_data.summary);
        ToolResult::pending(record.id, message, record.confirmation_data)
    }

    async fn apply_confirmed(&self, record: &ConfirmationRecord) -> ToolResult {
        let action = AuditAction::MutationApplied {
            tool: record.tool_name.clone(),
            principal: record.issued_by.clone(),
            confirmation: record.id,
        };
        let Some(tool) = self.registry.get(&record.tool_name) else {
            // The catalog changed between issue and approval.
            let err = GatewayError::UnknownTool {
                name: record.tool_name.clone(),
            };
            self.audit
                .observe(action, AuditOutcome::failure(err.code().as_str()))
                .await;
            return err.into();
        };

        // One attempt, ever. A failure is surfaced to the resolver; the
        // record stays approved and the mutation is not re-run.
        match tool.handler().apply(&record.payload).await {
            Ok(result) => {
                tracing::info!(
                    confirmation = %record.id,
                    tool = %record.tool_name,
                    "approved mutation applied"
                );
                self.audit.observe(action, AuditOutcome::success()).await;
                ToolResult::success(json!({
                    "resolution": "applied",
                    "confirmationId": record.id,
                    "result": result,
                }))
            },
            Err(err) => {
                let err = map_upstream(&record.tool_name, err);
                self.audit
                    .observe(action, AuditOutcome::failure(err.code().as_str()))
                    .await;
                err.into()
            },
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.registry.len())
            .field("guard", &self.guard)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish_non_exhaustive()
    }
}

fn basis_details(basis: &AccessBasis) -> String {
    match basis {
        AccessBasis::Role { role } => format!("role: {role}"),
        AccessBasis::SelfService => "self-service".to_string(),
    }
}

fn requested_limit(invocation: &ToolInvocation) -> Option<usize> {
    invocation
        .parameter(LIMIT_PARAM)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn map_upstream(tool: &str, err: UpstreamError) -> GatewayError {
    match err {
        UpstreamError::Timeout => GatewayError::UpstreamTimeout {
            tool: tool.to_string(),
        },
        UpstreamError::Failed(message) => GatewayError::UpstreamError {
            tool: tool.to_string(),
            message,
        },
        UpstreamError::NotFound(what) => GatewayError::NotFound { what },
    }
}
