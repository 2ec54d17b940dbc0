//! Payload validation against a descriptor's typed parameter schema.

use gatehouse_core::{FieldViolation, GatewayError, GatewayResult, ToolDescriptor};
use serde_json::Value;

/// Validate `payload` against the descriptor's parameter specs.
///
/// Checks, in order: the payload is a JSON object; every required parameter
/// is present; every present parameter has the declared kind; no undeclared
/// parameter sneaks in. All violations are collected so the caller gets
/// field-level detail in one pass rather than one failure per retry.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] carrying one [`FieldViolation`] per
/// offending parameter.
pub fn validate_params(descriptor: &ToolDescriptor, payload: &Value) -> GatewayResult<()> {
    let Some(object) = payload.as_object() else {
        return Err(GatewayError::Validation {
            violations: vec![FieldViolation::new(
                "parameters",
                "expected a JSON object payload",
            )],
        });
    };

    let mut violations = Vec::new();

    for spec in &descriptor.params {
        match object.get(&spec.name) {
            None if spec.required => {
                violations.push(FieldViolation::new(
                    spec.name.clone(),
                    "missing required parameter",
                ));
            },
            None => {},
            Some(Value::Null) if !spec.required => {},
            Some(value) if !spec.kind.matches(value) => {
                violations.push(FieldViolation::new(
                    spec.name.clone(),
                    format!("expected {}, got {}", spec.kind, kind_of(value)),
                ));
            },
            Some(_) => {},
        }
    }

    for name in object.keys() {
        if descriptor.param(name).is_none() {
            violations.push(FieldViolation::new(
                name.clone(),
                "not a parameter of this tool",
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::Validation { violations })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{Domain, ErrorCode, ParamKind, ParamSpec, Role, ToolDescriptor};
    use serde_json::json;

    fn update_salary() -> ToolDescriptor {
        ToolDescriptor::mutating("update_salary", Domain::Hr)
            .with_role(Role::HrWrite)
            .with_param(ParamSpec::required("employee_id", ParamKind::String))
            .with_param(ParamSpec::required("salary", ParamKind::Integer))
            .with_param(ParamSpec::optional("effective_date", ParamKind::String))
    }

    fn violations(err: GatewayError) -> Vec<FieldViolation> {
        match err {
            GatewayError::Validation { violations } => violations,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        let payload = json!({"employee_id": "emp-3", "salary": 92_000});
        assert!(validate_params(&update_salary(), &payload).is_ok());
    }

    #[test]
    fn test_optional_param_may_be_absent_or_null() {
        let absent = json!({"employee_id": "emp-3", "salary": 1});
        assert!(validate_params(&update_salary(), &absent).is_ok());

        let null = json!({"employee_id": "emp-3", "salary": 1, "effective_date": null});
        assert!(validate_params(&update_salary(), &null).is_ok());
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = validate_params(&update_salary(), &json!({"salary": 90_000})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        let violations = violations(err);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "employee_id");
        assert!(violations[0].problem.contains("missing"));
    }

    #[test]
    fn test_wrong_kind_reported_with_both_kinds() {
        let payload = json!({"employee_id": "emp-3", "salary": "ninety thousand"});
        let violations = violations(validate_params(&update_salary(), &payload).unwrap_err());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "salary");
        assert_eq!(violations[0].problem, "expected integer, got string");
    }

    #[test]
    fn test_undeclared_parameter_rejected() {
        let payload = json!({"employee_id": "emp-3", "salary": 1, "bonus": 500});
        let violations = violations(validate_params(&update_salary(), &payload).unwrap_err());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "bonus");
    }

    #[test]
    fn test_all_violations_collected_in_one_pass() {
        let payload = json!({"salary": true, "bonus": 500});
        let violations = violations(validate_params(&update_salary(), &payload).unwrap_err());
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"employee_id"));
        assert!(fields.contains(&"salary"));
        assert!(fields.contains(&"bonus"));
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_non_object_payload() {
        let err = validate_params(&update_salary(), &json!([1, 2, 3])).unwrap_err();
        let violations = violations(err);
        assert_eq!(violations[0].field, "parameters");
    }

    #[test]
    fn test_required_null_is_a_kind_violation() {
        let payload = json!({"employee_id": null, "salary": 1});
        let violations = violations(validate_params(&update_salary(), &payload).unwrap_err());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "employee_id");
        assert_eq!(violations[0].problem, "expected string, got null");
    }
}
