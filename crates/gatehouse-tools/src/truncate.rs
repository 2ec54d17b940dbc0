//! The truncation guard: bounded fetches with a limit-plus-one probe.
//!
//! The guard asks the collaborator for `threshold + 1` rows. Getting all of
//! them back proves the backing set holds more than `threshold` matches, so
//! the extra row is dropped and the metadata reports an open lower bound
//! (`"50+"`) with a warning telling the caller to narrow filters. Getting
//! fewer proves the count is exact. Either way the caller never sees more
//! than `threshold` rows and never needs a separate count query.

use gatehouse_core::{TotalCount, TruncationMetadata};
use serde_json::Value;

/// Default row threshold when configuration does not override it.
pub const DEFAULT_TRUNCATION_THRESHOLD: usize = 50;

/// The fixed-format warning attached to truncated result sets.
#[must_use]
pub fn truncation_warning(threshold: usize) -> String {
    format!(
        "Results truncated to the first {threshold} rows; narrow your filters to \
         retrieve the remainder."
    )
}

/// Bounds result sets at a configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationGuard {
    threshold: usize,
}

impl TruncationGuard {
    /// A guard with the given ceiling. Thresholds below one clamp to one,
    /// with a warning, so a misconfigured guard still returns rows.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        if threshold == 0 {
            tracing::warn!("truncation threshold 0 clamped to 1");
        }
        Self {
            threshold: threshold.max(1),
        }
    }

    /// A guard lowered to `requested` rows. Requests above the current
    /// threshold clamp down — callers may lower the ceiling, never raise it.
    #[must_use]
    pub fn lowered_to(&self, requested: usize) -> Self {
        if requested > self.threshold {
            tracing::debug!(
                requested,
                threshold = self.threshold,
                "requested limit above threshold; clamping down"
            );
        }
        Self::new(requested.min(self.threshold))
    }

    /// The active row ceiling.
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// How many rows to request from the collaborator: threshold plus one.
    #[must_use]
    pub fn probe_limit(&self) -> usize {
        self.threshold.saturating_add(1)
    }

    /// Bound a probed result set and derive its metadata.
    ///
    /// `items` is what the collaborator returned for a `probe_limit()`
    /// request. More than `threshold` rows means the set was capped; the
    /// surplus is dropped and the total becomes an open lower bound.
    #[must_use]
    pub fn apply(&self, mut items: Vec<Value>) -> (Vec<Value>, TruncationMetadata) {
        if items.len() > self.threshold {
            items.truncate(self.threshold);
            let metadata = TruncationMetadata::capped(
                items.len(),
                TotalCount::AtLeast(self.threshold),
                truncation_warning(self.threshold),
            );
            (items, metadata)
        } else {
            let metadata = TruncationMetadata::exact(items.len());
            (items, metadata)
        }
    }

    /// Bound a result set whose exact total was cheaply available.
    ///
    /// Same capping behavior as [`apply`](Self::apply), but the metadata
    /// carries the exact total instead of an open bound.
    #[must_use]
    pub fn apply_with_total(
        &self,
        mut items: Vec<Value>,
        total: usize,
    ) -> (Vec<Value>, TruncationMetadata) {
        if items.len() > self.threshold {
            items.truncate(self.threshold);
        }
        let total = total.max(items.len());
        if total > items.len() {
            let metadata = TruncationMetadata::capped(
                items.len(),
                TotalCount::Exact(total),
                truncation_warning(self.threshold),
            );
            (items, metadata)
        } else {
            let metadata = TruncationMetadata::exact(total);
            (items, metadata)
        }
    }
}

impl Default for TruncationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TRUNCATION_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({"row": i})).collect()
    }

    // ---- Probe semantics ----

    #[test]
    fn probe_limit_is_threshold_plus_one() {
        assert_eq!(TruncationGuard::new(50).probe_limit(), 51);
        assert_eq!(TruncationGuard::default().probe_limit(), 51);
    }

    #[test]
    fn empty_set_is_exact_zero() {
        let (items, meta) = TruncationGuard::new(50).apply(rows(0));
        assert!(items.is_empty());
        assert!(!meta.truncated);
        assert_eq!(meta.total_count, TotalCount::Exact(0));
        assert!(meta.warning.is_none());
    }

    #[test]
    fn under_threshold_is_exact() {
        let (items, meta) = TruncationGuard::new(50).apply(rows(17));
        assert_eq!(items.len(), 17);
        assert!(!meta.truncated);
        assert_eq!(meta.returned_count, 17);
        assert_eq!(meta.total_count, TotalCount::Exact(17));
    }

    #[test]
    fn exactly_threshold_is_exact() {
        // The probe asked for 51 and got 50 back: the count is proven exact.
        let (items, meta) = TruncationGuard::new(50).apply(rows(50));
        assert_eq!(items.len(), 50);
        assert!(!meta.truncated);
        assert_eq!(meta.total_count, TotalCount::Exact(50));
        assert!(meta.warning.is_none());
    }

    #[test]
    fn probe_overflow_truncates_with_open_bound() {
        // 51 rows back from a 51-row probe: more than 50 exist.
        let (items, meta) = TruncationGuard::new(50).apply(rows(51));
        assert_eq!(items.len(), 50);
        assert!(meta.truncated);
        assert_eq!(meta.returned_count, 50);
        assert_eq!(meta.total_count, TotalCount::AtLeast(50));
        let warning = meta.warning.unwrap();
        assert!(warning.contains("50"));
        assert!(warning.contains("narrow"));
    }

    #[test]
    fn oversized_result_still_capped_at_threshold() {
        // A collaborator ignoring the probe limit cannot push rows past the cap.
        let (items, meta) = TruncationGuard::new(50).apply(rows(127));
        assert_eq!(items.len(), 50);
        assert!(meta.truncated);
        assert_eq!(meta.total_count, TotalCount::AtLeast(50));
    }

    // ---- Exact totals ----

    #[test]
    fn exact_total_reported_when_available() {
        let (items, meta) = TruncationGuard::new(50).apply_with_total(rows(51), 127);
        assert_eq!(items.len(), 50);
        assert!(meta.truncated);
        assert_eq!(meta.total_count, TotalCount::Exact(127));
        assert!(meta.warning.is_some());
    }

    #[test]
    fn exact_total_no_truncation_when_under_threshold() {
        let (items, meta) = TruncationGuard::new(50).apply_with_total(rows(12), 12);
        assert_eq!(items.len(), 12);
        assert!(!meta.truncated);
        assert_eq!(meta.total_count, TotalCount::Exact(12));
    }

    #[test]
    fn exact_total_never_below_returned_count() {
        // An inconsistent collaborator total is floored at what we hold.
        let (items, meta) = TruncationGuard::new(50).apply_with_total(rows(10), 3);
        assert_eq!(items.len(), 10);
        assert_eq!(meta.total_count, TotalCount::Exact(10));
    }

    // ---- Threshold configuration ----

    #[test]
    fn lowered_threshold_applies() {
        let guard = TruncationGuard::new(50).lowered_to(10);
        assert_eq!(guard.threshold(), 10);
        let (items, meta) = guard.apply(rows(11));
        assert_eq!(items.len(), 10);
        assert!(meta.truncated);
        assert_eq!(meta.total_count, TotalCount::AtLeast(10));
    }

    #[test]
    fn threshold_cannot_be_raised() {
        let guard = TruncationGuard::new(50).lowered_to(500);
        assert_eq!(guard.threshold(), 50);
    }

    #[test]
    fn zero_threshold_clamps_to_one() {
        let guard = TruncationGuard::new(0);
        assert_eq!(guard.threshold(), 1);
        let lowered = TruncationGuard::new(50).lowered_to(0);
        assert_eq!(lowered.threshold(), 1);
    }

    #[test]
    fn metadata_invariants_hold_across_sizes() {
        let guard = TruncationGuard::new(5);
        for n in 0..12 {
            let (items, meta) = guard.apply(rows(n));
            assert!(items.len() <= guard.threshold());
            assert_eq!(meta.returned_count, items.len());
            assert!(meta.total_count.base() >= meta.returned_count);
            assert_eq!(meta.truncated, meta.warning.is_some());
        }
    }
}
