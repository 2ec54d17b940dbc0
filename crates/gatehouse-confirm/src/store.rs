//! In-process confirmation store with atomic resolution.
//!
//! All state transitions happen under a single write lock, so two resolvers
//! racing for the same record serialize at the lock: the first one observes
//! `Pending` and transitions it, every later one observes the terminal state
//! and gets the matching error. There is no window in which a record can be
//! resolved twice.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use gatehouse_core::{ConfirmationId, GatewayError, GatewayResult, PrincipalId, Timestamp};

use crate::record::{ConfirmationRecord, ConfirmationState, ResolutionDecision};

/// What a sweep pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Records flipped to `Expired` this pass because their TTL elapsed.
    /// Listed by id so the caller can audit each lapse.
    pub expired: Vec<ConfirmationId>,
    /// Terminal records evicted after outliving the retention window.
    pub evicted: usize,
}

impl SweepStats {
    /// How many records this pass expired.
    #[must_use]
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }

    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.expired.is_empty() && self.evicted == 0
    }
}

/// Thread-safe store of confirmation records keyed by id.
pub struct ConfirmationStore {
    records: RwLock<HashMap<ConfirmationId, ConfirmationRecord>>,
}

impl ConfirmationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read_records(&self) -> RwLockReadGuard<'_, HashMap<ConfirmationId, ConfirmationRecord>> {
        self.records.read().unwrap_or_else(|e| {
            tracing::warn!("confirmation store lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, HashMap<ConfirmationId, ConfirmationRecord>> {
        self.records.write().unwrap_or_else(|e| {
            tracing::warn!("confirmation store lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Inserts a freshly issued record.
    pub fn insert(&self, record: ConfirmationRecord) {
        let mut records = self.write_records();
        records.insert(record.id, record);
    }

    /// Returns a snapshot of the record, if present.
    ///
    /// Read-only: an elapsed TTL is not flipped here. State changes only
    /// through [`resolve`](Self::resolve) and [`sweep`](Self::sweep).
    #[must_use]
    pub fn get(&self, id: ConfirmationId) -> Option<ConfirmationRecord> {
        self.read_records().get(&id).cloned()
    }

    /// Atomically resolves a pending record.
    ///
    /// The full failure ladder runs under one write lock:
    ///
    /// 1. unknown id fails with `NOT_FOUND`;
    /// 2. an elapsed TTL flips the record to `Expired` and fails with
    ///    `EXPIRED` (as does a record that already expired earlier);
    /// 3. a record another resolver got to first fails with
    ///    `ALREADY_RESOLVED`, naming the terminal state it reached;
    /// 4. a resolver the gate refuses fails with `FORBIDDEN`, leaving the
    ///    record pending;
    /// 5. otherwise the record transitions to the decision's terminal state
    ///    and the updated snapshot is returned.
    ///
    /// Exactly one of any number of concurrent resolvers can reach step 5.
    ///
    /// # Errors
    ///
    /// As per the ladder above.
    pub fn resolve(
        &self,
        id: ConfirmationId,
        decision: ResolutionDecision,
        resolved_by: &PrincipalId,
        comments: Option<String>,
        may_resolve: impl FnOnce(&ConfirmationRecord) -> bool,
        now: Timestamp,
    ) -> GatewayResult<ConfirmationRecord> {
        let mut records = self.write_records();
        let Some(record) = records.get_mut(&id) else {
            return Err(GatewayError::NotFound {
                what: format!("confirmation {id}"),
            });
        };

        match record.state {
            ConfirmationState::Pending if record.is_expired_at(now) => {
                record.state = ConfirmationState::Expired;
                record.concluded_at = Some(now);
                tracing::info!(confirmation = %id, tool = %record.tool_name, "confirmation expired on access");
                Err(GatewayError::Expired { id })
            },
            ConfirmationState::Pending => {
                if !may_resolve(record) {
                    return Err(GatewayError::Forbidden {
                        reason: format!(
                            "{resolved_by} may not resolve confirmation {id} for tool {}",
                            record.tool_name
                        ),
                    });
                }
                record.state = decision.target_state();
                record.resolved_by = Some(resolved_by.clone());
                record.comments = comments;
                record.concluded_at = Some(now);
                Ok(record.clone())
            },
            ConfirmationState::Expired => Err(GatewayError::Expired { id }),
            ConfirmationState::Approved | ConfirmationState::Rejected => {
                Err(GatewayError::AlreadyResolved {
                    id,
                    resolution: record.state.to_string(),
                })
            },
        }
    }

    /// Flips pending records past their TTL and evicts terminal records past
    /// the retention window. Safe to call on any schedule; a pass over an
    /// already-swept store is a no-op.
    pub fn sweep(&self, now: Timestamp, retention_secs: u64) -> SweepStats {
        let mut records = self.write_records();

        let mut stats = SweepStats::default();
        for record in records.values_mut() {
            if record.is_pending() && record.is_expired_at(now) {
                record.state = ConfirmationState::Expired;
                record.concluded_at = Some(now);
                stats.expired.push(record.id);
            }
        }

        let before = records.len();
        records.retain(|_, record| !record.is_evictable_at(now, retention_secs));
        stats.evicted = before.saturating_sub(records.len());
        stats
    }

    /// Total records currently held, in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    /// Whether the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_records().is_empty()
    }

    /// Records still awaiting a decision whose TTL has not elapsed at `now`.
    #[must_use]
    pub fn pending_count(&self, now: Timestamp) -> usize {
        self.read_records()
            .values()
            .filter(|r| r.is_pending() && !r.is_expired_at(now))
            .count()
    }
}

impl Default for ConfirmationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfirmationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationStore")
            .field("records", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
