//! Post-merge configuration validation.
//!
//! Catches deployment mistakes at startup instead of at the first denied or
//! misrouted call: catalogs nobody can satisfy, self-service scopes with no
//! subject parameter, approver policies with no approvers.

use std::collections::BTreeSet;
use std::net::SocketAddr;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{GatewayConfig, ResolutionPolicy, ScopeKind, ToolConfig};

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &GatewayConfig) -> ConfigResult<()> {
    validate_server(config)?;
    validate_limits(config)?;
    validate_resolution(config)?;
    validate_tools(config)?;
    Ok(())
}

fn validate_server(config: &GatewayConfig) -> ConfigResult<()> {
    if config.server.listen_addr.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::ValidationError {
            field: "server.listen_addr".to_owned(),
            message: format!(
                "'{}' is not a valid host:port address",
                config.server.listen_addr
            ),
        });
    }
    Ok(())
}

fn validate_limits(config: &GatewayConfig) -> ConfigResult<()> {
    let limits = &config.limits;

    if limits.truncation_threshold == 0 {
        return Err(ConfigError::ValidationError {
            field: "limits.truncation_threshold".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }
    if limits.confirmation_ttl_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "limits.confirmation_ttl_secs".to_owned(),
            message: "must be at least 1 second".to_owned(),
        });
    }
    if limits.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "limits.sweep_interval_secs".to_owned(),
            message: "must be at least 1 second".to_owned(),
        });
    }
    Ok(())
}

fn validate_resolution(config: &GatewayConfig) -> ConfigResult<()> {
    let resolution = &config.resolution;
    if resolution.policy == ResolutionPolicy::Approver && resolution.approver_roles.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "resolution.approver_roles".to_owned(),
            message: "the approver policy needs at least one approver role".to_owned(),
        });
    }
    Ok(())
}

fn validate_tools(config: &GatewayConfig) -> ConfigResult<()> {
    if config.tools.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "tools".to_owned(),
            message: "the tool catalog is empty; the gateway would expose nothing".to_owned(),
        });
    }

    let mut seen = BTreeSet::new();
    for tool in &config.tools {
        if tool.name.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "tools.name".to_owned(),
                message: "tool names must be non-empty".to_owned(),
            });
        }
        if !seen.insert(tool.name.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("tools.{}", tool.name),
                message: "duplicate tool name".to_owned(),
            });
        }
        validate_tool(tool)?;
    }
    Ok(())
}

fn validate_tool(tool: &ToolConfig) -> ConfigResult<()> {
    // Effective allowed set = configured roles plus the domain's supersets.
    // If both are empty, no principal can ever pass authorization.
    if tool.roles.is_empty() && tool.domain.superset_roles().is_empty() {
        return Err(ConfigError::ValidationError {
            field: format!("tools.{}.roles", tool.name),
            message: format!(
                "no role can ever satisfy this tool (no roles configured and the {} domain has no superset roles)",
                tool.domain
            ),
        });
    }

    let mut param_names = BTreeSet::new();
    for param in &tool.params {
        if !param_names.insert(param.name.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("tools.{}.params.{}", tool.name, param.name),
                message: "duplicate parameter name".to_owned(),
            });
        }
    }

    if tool.scope == ScopeKind::OwnRecord {
        if tool.mutating {
            return Err(ConfigError::ValidationError {
                field: format!("tools.{}.scope", tool.name),
                message: "own-record scope applies to read tools only".to_owned(),
            });
        }
        let Some(subject_param) = &tool.subject_param else {
            return Err(ConfigError::ValidationError {
                field: format!("tools.{}.subject_param", tool.name),
                message: "own-record scope requires subject_param".to_owned(),
            });
        };
        if !param_names.contains(subject_param.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("tools.{}.subject_param", tool.name),
                message: format!("'{subject_param}' is not a declared parameter"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_str;

    fn assert_rejects(overlay: &str, field_fragment: &str) {
        match load_str(overlay) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert!(
                    field.contains(field_fragment),
                    "expected failure on '{field_fragment}', got '{field}'"
                );
            },
            other => panic!("expected validation error on '{field_fragment}', got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unparseable_listen_addr() {
        assert_rejects("[server]\nlisten_addr = \"not-an-addr\"\n", "listen_addr");
    }

    #[test]
    fn test_rejects_zero_ttl() {
        assert_rejects(
            "[limits]\nconfirmation_ttl_secs = 0\n",
            "confirmation_ttl_secs",
        );
    }

    #[test]
    fn test_rejects_approver_policy_without_roles() {
        assert_rejects("[resolution]\npolicy = \"approver\"\n", "approver_roles");
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert_rejects("tools = []\n", "tools");
    }

    #[test]
    fn test_rejects_duplicate_tool_names() {
        let overlay = r#"
            [[tools]]
            name = "list_things"
            domain = "sales"
            mutating = false
            roles = ["sales-read"]

            [[tools]]
            name = "list_things"
            domain = "sales"
            mutating = false
            roles = ["sales-read"]
        "#;
        assert_rejects(overlay, "list_things");
    }

    #[test]
    fn test_rejects_unsatisfiable_tool() {
        let overlay = r#"
            [[tools]]
            name = "list_invoices"
            domain = "finance"
            mutating = false
            roles = []
        "#;
        assert_rejects(overlay, "roles");
    }

    #[test]
    fn test_roleless_hr_tool_is_satisfiable_via_supersets() {
        let overlay = r#"
            [[tools]]
            name = "list_org_chart"
            domain = "hr"
            mutating = false
            roles = []
        "#;
        let config = load_str(overlay).unwrap();
        assert_eq!(config.tools.len(), 1);
    }

    #[test]
    fn test_rejects_mutating_own_record_scope() {
        let overlay = r#"
            [[tools]]
            name = "update_own_salary"
            domain = "hr"
            mutating = true
            roles = ["hr-write"]
            scope = "own-record"
            subject_param = "employeeId"

            [[tools.params]]
            name = "employeeId"
            kind = "string"
        "#;
        assert_rejects(overlay, "scope");
    }

    #[test]
    fn test_rejects_undeclared_subject_param() {
        let overlay = r#"
            [[tools]]
            name = "get_employee"
            domain = "hr"
            mutating = false
            roles = ["hr-read"]
            scope = "own-record"
            subject_param = "employeeId"
        "#;
        assert_rejects(overlay, "subject_param");
    }

    #[test]
    fn test_stock_catalog_passes() {
        validate(&crate::loader::load_default().unwrap()).unwrap();
    }
}
