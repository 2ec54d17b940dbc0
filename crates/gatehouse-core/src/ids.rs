//! Identifier newtypes.
//!
//! Confirmation ids are opaque, globally unique, and generated at issue time.
//! Principal ids arrive from the identity layer and are treated as opaque
//! strings so they compare directly against subject parameters in payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationId(pub Uuid);

impl ConfirmationId {
    /// Create a new random confirmation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConfirmationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cnf:{}", self.0)
    }
}

/// Stable identifier of an authenticated principal.
///
/// Assigned by the external identity provider; the gateway never mints one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wrap an identity-layer subject identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_id_unique() {
        let id1 = ConfirmationId::new();
        let id2 = ConfirmationId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("cnf:"));
    }

    #[test]
    fn test_confirmation_id_serializes_as_plain_uuid() {
        let id = ConfirmationId::new();
        let json = serde_json::to_string(&id).unwrap();
        // No display prefix on the wire.
        assert!(!json.contains("cnf:"));
        let back: ConfirmationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_principal_id_transparent() {
        let id = PrincipalId::new("emp-1042");
        assert_eq!(id.as_str(), "emp-1042");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"emp-1042\"");
    }
}
