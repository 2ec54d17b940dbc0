//! The execution seam between the gateway and domain collaborators.
//!
//! One handler backs one registered tool. Read tools implement [`fetch`];
//! mutating tools implement [`preview`] and [`apply`]. The gateway never
//! reaches a collaborator before authorization has passed, and never calls
//! `apply` before a confirmation resolved to approved.
//!
//! [`fetch`]: ToolHandler::fetch
//! [`preview`]: ToolHandler::preview
//! [`apply`]: ToolHandler::apply

use async_trait::async_trait;
use gatehouse_core::ChangePreview;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a domain collaborator.
///
/// The dispatcher attaches the tool name and maps these onto the gateway
/// error taxonomy (`UPSTREAM_TIMEOUT`, `UPSTREAM_ERROR`, `NOT_FOUND`).
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The collaborator did not answer within its own deadline.
    #[error("collaborator timed out")]
    Timeout,
    /// The collaborator failed outright.
    #[error("{0}")]
    Failed(String),
    /// The referenced target record does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result alias for collaborator calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Typed execution interface for one tool.
///
/// Handlers are registered next to their descriptor and looked up by tool
/// name — no reflection, no duck typing. The default method bodies reject
/// the operations a handler does not support, so a read-only collaborator
/// only implements `fetch`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Fetch up to `limit` matching rows for a read tool.
    ///
    /// The gateway passes the truncation guard's probe limit (threshold plus
    /// one) so it can distinguish "exactly N" from "more than N" without a
    /// count query.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] when the collaborator fails, times out,
    /// or does not serve reads.
    async fn fetch(&self, params: &Value, limit: usize) -> UpstreamResult<Vec<Value>> {
        let _ = (params, limit);
        Err(UpstreamError::Failed("tool does not serve reads".to_string()))
    }

    /// Predict what a staged mutation will change, with old/new values where
    /// the collaborator can supply them cheaply.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] when the collaborator fails, the target
    /// record is absent, or the tool does not mutate.
    async fn preview(&self, params: &Value) -> UpstreamResult<ChangePreview> {
        let _ = params;
        Err(UpstreamError::Failed("tool does not mutate".to_string()))
    }

    /// Apply a confirmed mutation with the stored payload.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] when the collaborator fails, the target
    /// record is absent, or the tool does not mutate.
    async fn apply(&self, params: &Value) -> UpstreamResult<Value> {
        let _ = params;
        Err(UpstreamError::Failed("tool does not mutate".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ReadOnly;

    #[async_trait]
    impl ToolHandler for ReadOnly {
        async fn fetch(&self, _params: &Value, limit: usize) -> UpstreamResult<Vec<Value>> {
            Ok((0..limit.min(3)).map(|i| json!(i)).collect())
        }
    }

    #[tokio::test]
    async fn test_default_methods_reject_unsupported_operations() {
        let handler = ReadOnly;
        let rows = handler.fetch(&json!({}), 10).await.unwrap();
        assert_eq!(rows.len(), 3);

        let preview = handler.preview(&json!({})).await;
        assert!(matches!(preview, Err(UpstreamError::Failed(_))));

        let applied = handler.apply(&json!({})).await;
        assert!(matches!(applied, Err(UpstreamError::Failed(_))));
    }

    #[test]
    fn test_upstream_error_display() {
        assert_eq!(UpstreamError::Timeout.to_string(), "collaborator timed out");
        assert_eq!(
            UpstreamError::NotFound("employee emp-9".to_string()).to_string(),
            "not found: employee emp-9"
        );
    }
}
