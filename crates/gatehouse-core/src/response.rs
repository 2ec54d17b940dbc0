//! The three-shape tool response and its metadata payloads.
//!
//! Every call into the gateway terminates in exactly one of three shapes,
//! discriminated by `status` on the wire:
//!
//! 1. `success` — data, plus truncation metadata when a result set was capped
//! 2. `error` — machine-readable code, message, optional self-correction hint
//! 3. `pending_confirmation` — a mutation was staged, never applied
//!
//! Streaming envelopes may precede the terminal event but never alter the
//! discriminant.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::{ErrorCode, GatewayError};
use crate::ids::ConfirmationId;

/// Terminal response for one tool invocation or resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ToolResult {
    /// The call completed; `data` carries the collaborator's result.
    Success {
        /// Result payload.
        data: Value,
        /// Truncation metadata, present when a result set was bounded.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        metadata: Option<TruncationMetadata>,
    },
    /// The call failed with an explicit, explainable rejection.
    Error {
        /// Machine-readable code from the gateway taxonomy.
        code: ErrorCode,
        /// Human-readable message.
        message: String,
        /// Hint for self-correction by the calling agent.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        suggested_action: Option<String>,
    },
    /// A mutation was staged and awaits human resolution.
    PendingConfirmation {
        /// Handle for the later resolution call.
        confirmation_id: ConfirmationId,
        /// Human-readable summary of the intended change.
        message: String,
        /// What the approver will see, including the verbatim parameters.
        confirmation_data: ConfirmationData,
    },
}

impl ToolResult {
    /// A success response without metadata.
    #[must_use]
    pub fn success(data: Value) -> Self {
        ToolResult::Success {
            data,
            metadata: None,
        }
    }

    /// A success response carrying truncation metadata.
    #[must_use]
    pub fn success_with(data: Value, metadata: TruncationMetadata) -> Self {
        ToolResult::Success {
            data,
            metadata: Some(metadata),
        }
    }

    /// A pending-confirmation response for a staged mutation.
    #[must_use]
    pub fn pending(
        confirmation_id: ConfirmationId,
        message: impl Into<String>,
        confirmation_data: ConfirmationData,
    ) -> Self {
        ToolResult::PendingConfirmation {
            confirmation_id,
            message: message.into(),
            confirmation_data,
        }
    }

    /// Whether this is a `success` response.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    /// Whether this is an `error` response.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error { .. })
    }

    /// Whether this is a `pending_confirmation` response.
    #[must_use]
    pub fn is_pending_confirmation(&self) -> bool {
        matches!(self, ToolResult::PendingConfirmation { .. })
    }

    /// The error code, when this is an `error` response.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ToolResult::Error { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<GatewayError> for ToolResult {
    fn from(err: GatewayError) -> Self {
        ToolResult::Error {
            code: err.code(),
            suggested_action: err.suggested_action(),
            message: err.to_string(),
        }
    }
}

/// Exact or open-bound total for a possibly-capped result set.
///
/// Serializes as a plain integer when exact, or as `"{n}+"` when the probe
/// only established a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalCount {
    /// The backing set holds exactly this many matching rows.
    Exact(usize),
    /// The backing set holds at least this many matching rows.
    AtLeast(usize),
}

impl TotalCount {
    /// The count this bound starts from.
    #[must_use]
    pub fn base(&self) -> usize {
        match *self {
            TotalCount::Exact(n) | TotalCount::AtLeast(n) => n,
        }
    }
}

impl fmt::Display for TotalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TotalCount::Exact(n) => write!(f, "{n}"),
            TotalCount::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

impl Serialize for TotalCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            TotalCount::Exact(n) => serializer.serialize_u64(
                u64::try_from(n).map_err(|_| serde::ser::Error::custom("count out of range"))?,
            ),
            TotalCount::AtLeast(n) => serializer.serialize_str(&format!("{n}+")),
        }
    }
}

impl<'de> Deserialize<'de> for TotalCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TotalCountVisitor;

        impl Visitor<'_> for TotalCountVisitor {
            type Value = TotalCount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an exact integer count or an \"N+\" lower bound")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(TotalCount::Exact)
                    .map_err(|_| E::custom("count out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(TotalCount::Exact)
                    .map_err(|_| E::custom("count must be non-negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let base = v
                    .strip_suffix('+')
                    .ok_or_else(|| E::custom("expected an \"N+\" lower bound"))?;
                base.parse::<usize>()
                    .map(TotalCount::AtLeast)
                    .map_err(|_| E::custom("malformed lower bound"))
            }
        }

        deserializer.deserialize_any(TotalCountVisitor)
    }
}

/// Machine-readable indication that a result set was capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncationMetadata {
    /// Whether the result set was capped at the threshold.
    pub truncated: bool,
    /// Number of rows actually returned. Never exceeds the threshold.
    pub returned_count: usize,
    /// Exact total when known, open lower bound otherwise.
    pub total_count: TotalCount,
    /// Fixed-format instruction to narrow filters; non-empty only when
    /// `truncated`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
}

impl TruncationMetadata {
    /// Metadata for a result set that fit under the threshold.
    #[must_use]
    pub fn exact(count: usize) -> Self {
        Self {
            truncated: false,
            returned_count: count,
            total_count: TotalCount::Exact(count),
            warning: None,
        }
    }

    /// Metadata for a capped result set.
    #[must_use]
    pub fn capped(returned: usize, total: TotalCount, warning: impl Into<String>) -> Self {
        Self {
            truncated: true,
            returned_count: returned,
            total_count: total,
            warning: Some(warning.into()),
        }
    }
}

/// One field-level difference in a staged mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// The field being changed.
    pub field: String,
    /// Current value, when the collaborator could supply it cheaply.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub old_value: Option<Value>,
    /// The value the mutation will write.
    pub new_value: Value,
}

impl FieldChange {
    /// A change to `field` with no known current value.
    #[must_use]
    pub fn new(field: impl Into<String>, new_value: Value) -> Self {
        Self {
            field: field.into(),
            old_value: None,
            new_value,
        }
    }

    /// Attach the current value.
    #[must_use]
    pub fn with_old(mut self, old_value: Value) -> Self {
        self.old_value = Some(old_value);
        self
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old_value {
            Some(old) => write!(f, "{}: {} -> {}", self.field, old, self.new_value),
            None => write!(f, "{}: {}", self.field, self.new_value),
        }
    }
}

/// What a collaborator predicts a staged mutation will change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePreview {
    /// Field-level old/new values where applicable.
    pub changes: Vec<FieldChange>,
    /// Human-readable one-line summary.
    pub summary: String,
}

impl ChangePreview {
    /// A preview with the given summary and no field detail yet.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            changes: Vec::new(),
            summary: summary.into(),
        }
    }

    /// Append a field-level change.
    #[must_use]
    pub fn with_change(mut self, change: FieldChange) -> Self {
        self.changes.push(change);
        self
    }
}

/// Everything shown to the approver of a staged mutation.
///
/// `parameters` carries the verbatim payload that will be applied on
/// approval; it is never altered between issue and apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationData {
    /// The mutating tool.
    pub tool: String,
    /// The exact parameters the mutation will run with.
    pub parameters: Value,
    /// Field-level old/new values where the collaborator supplied them.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub changes: Vec<FieldChange>,
    /// Human-readable summary of the intended change.
    pub summary: String,
}

impl ConfirmationData {
    /// Assemble the approver view from a tool name, its verbatim parameters,
    /// and the collaborator's preview.
    #[must_use]
    pub fn new(tool: impl Into<String>, parameters: Value, preview: ChangePreview) -> Self {
        Self {
            tool: tool.into(),
            parameters,
            changes: preview.changes,
            summary: preview.summary,
        }
    }
}
