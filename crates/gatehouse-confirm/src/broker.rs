//! Confirmation broker, the crate's orchestrating surface.
//!
//! The broker owns the [`ConfirmationStore`] and the deployment's
//! [`ResolutionGate`], and stamps every issued record with the configured
//! TTL. The flow it mediates:
//!
//! 1. The dispatcher previews a mutation and calls [`issue`](ConfirmationBroker::issue)
//! 2. The caller receives the record's opaque id
//! 3. A human decision arrives through [`resolve`](ConfirmationBroker::resolve)
//! 4. Approved payloads are replayed by the dispatcher; everything else stops here
//! 5. A periodic [`expire_sweep`](ConfirmationBroker::expire_sweep) reaps the rest

use std::sync::Arc;

use serde_json::Value;

use gatehouse_core::{ConfirmationData, ConfirmationId, GatewayResult, Principal, Timestamp};

use crate::gate::ResolutionGate;
use crate::record::{ConfirmationRecord, ResolutionDecision};
use crate::store::{ConfirmationStore, SweepStats};

/// Default confirmation TTL (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 5 * 60;

/// Default retention for concluded records (1 minute), long enough for a
/// duplicate resolution to get `ALREADY_RESOLVED` instead of `NOT_FOUND`.
pub const DEFAULT_RETENTION_SECS: u64 = 60;

/// Issues, resolves, and reaps confirmation records.
pub struct ConfirmationBroker {
    store: ConfirmationStore,
    gate: Arc<dyn ResolutionGate>,
    ttl_secs: u64,
    retention_secs: u64,
}

impl ConfirmationBroker {
    /// Creates a broker with the default TTL and retention.
    #[must_use]
    pub fn new(gate: Arc<dyn ResolutionGate>) -> Self {
        Self {
            store: ConfirmationStore::new(),
            gate,
            ttl_secs: DEFAULT_TTL_SECS,
            retention_secs: DEFAULT_RETENTION_SECS,
        }
    }

    /// Overrides the TTL stamped on issued records.
    #[must_use]
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Overrides how long concluded records linger before eviction.
    #[must_use]
    pub fn with_retention_secs(mut self, retention_secs: u64) -> Self {
        self.retention_secs = retention_secs;
        self
    }

    /// The TTL currently stamped on issued records, in seconds.
    #[must_use]
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Parks a validated mutation and returns the pending record.
    ///
    /// The returned record carries the opaque id the caller must present to
    /// resolve it, and the deadline after which resolution will fail.
    pub fn issue(
        &self,
        tool_name: &str,
        issued_by: &Principal,
        payload: Value,
        confirmation_data: ConfirmationData,
    ) -> ConfirmationRecord {
        let record =
            ConfirmationRecord::new(tool_name, issued_by, payload, confirmation_data, self.ttl_secs);
        tracing::info!(
            confirmation = %record.id,
            tool = %record.tool_name,
            issued_by = %record.issued_by,
            expires_at = %record.expires_at,
            "confirmation issued"
        );
        self.store.insert(record.clone());
        record
    }

    /// Applies a human decision to a pending record.
    ///
    /// Consults the deployment's [`ResolutionGate`] and transitions the
    /// record atomically; of any number of concurrent resolvers, exactly one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for an unknown or evicted id, `EXPIRED` past the TTL,
    /// `ALREADY_RESOLVED` after another resolver won, `FORBIDDEN` when the
    /// gate refuses `resolver`.
    pub fn resolve(
        &self,
        id: ConfirmationId,
        decision: ResolutionDecision,
        resolver: &Principal,
        comments: Option<String>,
    ) -> GatewayResult<ConfirmationRecord> {
        let resolved = self.store.resolve(
            id,
            decision,
            &resolver.id,
            comments,
            |record| self.gate.may_resolve(resolver, record),
            Timestamp::now(),
        )?;
        tracing::info!(
            confirmation = %id,
            tool = %resolved.tool_name,
            state = %resolved.state,
            resolver = %resolver.id,
            "confirmation resolved"
        );
        Ok(resolved)
    }

    /// Snapshot of a record, if it has not been evicted.
    #[must_use]
    pub fn get(&self, id: ConfirmationId) -> Option<ConfirmationRecord> {
        self.store.get(id)
    }

    /// Runs one reaping pass against the wall clock.
    pub fn expire_sweep(&self) -> SweepStats {
        self.expire_sweep_at(Timestamp::now())
    }

    /// Runs one reaping pass as of `now`: pending records past their TTL flip
    /// to expired, concluded records past retention are evicted. Idempotent.
    pub fn expire_sweep_at(&self, now: Timestamp) -> SweepStats {
        let stats = self.store.sweep(now, self.retention_secs);
        if !stats.is_noop() {
            tracing::info!(
                expired = stats.expired_count(),
                evicted = stats.evicted,
                remaining = self.store.len(),
                "confirmation sweep"
            );
        }
        stats
    }

    /// Records still awaiting a decision.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.store.pending_count(Timestamp::now())
    }
}

impl std::fmt::Debug for ConfirmationBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationBroker")
            .field("records", &self.store.len())
            .field("ttl_secs", &self.ttl_secs)
            .field("retention_secs", &self.retention_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{IssuerGate, RoleGate};
    use crate::record::ConfirmationState;
    use gatehouse_core::{ChangePreview, GatewayError, Role};
    use serde_json::json;

    fn issuer() -> Principal {
        Principal::new("agent-7", [Role::HrWrite])
    }

    fn sample_data() -> ConfirmationData {
        ConfirmationData::new(
            "update_salary",
            json!({"employeeId": "E-100", "newSalary": 90_000}),
            ChangePreview::new("Update salary for E-100"),
        )
    }

    fn issue_sample(broker: &ConfirmationBroker) -> ConfirmationRecord {
        broker.issue(
            "update_salary",
            &issuer(),
            json!({"employeeId": "E-100", "newSalary": 90_000}),
            sample_data(),
        )
    }

    #[test]
    fn test_issue_stamps_configured_ttl() {
        let broker = ConfirmationBroker::new(Arc::new(IssuerGate)).with_ttl_secs(120);
        let record = issue_sample(&broker);

        assert_eq!(record.expires_at, record.issued_at.plus_secs(120));
        assert_eq!(broker.pending_count(), 1);
        assert_eq!(broker.get(record.id).unwrap().id, record.id);
    }

    #[test]
    fn test_resolve_consults_the_gate() {
        let broker = ConfirmationBroker::new(Arc::new(IssuerGate));
        let record = issue_sample(&broker);

        let outsider = Principal::new("agent-9", [Role::Executive]);
        let err = broker
            .resolve(record.id, ResolutionDecision::Approve, &outsider, None)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden { .. }));

        let resolved = broker
            .resolve(record.id, ResolutionDecision::Approve, &issuer(), None)
            .unwrap();
        assert_eq!(resolved.state, ConfirmationState::Approved);
        assert_eq!(broker.pending_count(), 0);
    }

    #[test]
    fn test_reject_keeps_comments() {
        let broker =
            ConfirmationBroker::new(Arc::new(RoleGate::new([Role::Manager, Role::Executive])));
        let record = issue_sample(&broker);

        let approver = Principal::new("mgr-1", [Role::Manager]);
        let resolved = broker
            .resolve(
                record.id,
                ResolutionDecision::Reject,
                &approver,
                Some("wrong amount".to_string()),
            )
            .unwrap();
        assert_eq!(resolved.state, ConfirmationState::Rejected);
        assert_eq!(resolved.comments.as_deref(), Some("wrong amount"));
        assert_eq!(resolved.resolved_by, Some(approver.id));
    }

    #[test]
    fn test_sweep_reaps_on_the_brokers_schedule() {
        let broker = ConfirmationBroker::new(Arc::new(IssuerGate))
            .with_ttl_secs(60)
            .with_retention_secs(30);
        let record = issue_sample(&broker);

        // Just past the TTL: flipped but retained.
        let after_ttl = record.expires_at.plus_secs(1);
        let stats = broker.expire_sweep_at(after_ttl);
        assert_eq!(stats.expired, vec![record.id]);
        assert_eq!(stats.evicted, 0);
        assert_eq!(
            broker.get(record.id).unwrap().state,
            ConfirmationState::Expired
        );

        // Past retention as well: evicted.
        let stats = broker.expire_sweep_at(after_ttl.plus_secs(31));
        assert_eq!(stats.evicted, 1);
        assert!(broker.get(record.id).is_none());
    }

    #[test]
    fn test_resolving_an_evicted_record_is_not_found() {
        let broker = ConfirmationBroker::new(Arc::new(IssuerGate))
            .with_ttl_secs(60)
            .with_retention_secs(0);
        let record = issue_sample(&broker);

        broker.expire_sweep_at(record.expires_at.plus_secs(2));
        broker.expire_sweep_at(record.expires_at.plus_secs(3));

        let err = broker
            .resolve(record.id, ResolutionDecision::Approve, &issuer(), None)
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }
}
