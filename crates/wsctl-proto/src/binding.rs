//! Parameter binding.
//!
//! Raw command-line strings are parsed into typed JSON values according to
//! each parameter's [`ParamKind`]. An empty string binds an explicit null,
//! which is kept distinct from "not provided" so required-parameter errors
//! can say which one happened.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::descriptor::{OperationDescriptor, ParamKind, ParamSpec};
use crate::error::ProtoError;

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Explicitly null.
    Null,
    /// A typed value.
    Value(Value),
}

impl Bound {
    /// The value, unless null.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Null => None,
            Self::Value(value) => Some(value),
        }
    }
}

/// Bound parameter values for one invocation, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<&'static str, Bound>,
}

impl Bindings {
    /// Empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` as the parameter named `name` and bind it.
    ///
    /// Later bindings of the same parameter replace earlier ones.
    pub fn bind_raw(
        &mut self,
        op: &OperationDescriptor,
        name: &str,
        raw: &[String],
    ) -> Result<(), ProtoError> {
        let spec = op.param(name).ok_or_else(|| ProtoError::UnknownParameter {
            operation: op.name,
            param: name.to_string(),
        })?;
        let bound = parse_raw(spec, raw)?;
        self.values.insert(spec.name, bound);
        Ok(())
    }

    /// Bind an already typed value.
    pub fn bind(&mut self, spec: &'static ParamSpec, bound: Bound) {
        self.values.insert(spec.name, bound);
    }

    /// Binding for `name`, if provided (null included).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bound> {
        self.values.get(name)
    }

    /// Non-null value for `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Bound::as_value)
    }

    /// Non-null string value for `name`.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    /// Whether the caller provided `name`, null included.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check every required parameter of `op` is bound to a non-null value.
    pub fn validate(&self, op: &OperationDescriptor) -> Result<(), ProtoError> {
        self.validate_excluding(op, None)
    }

    /// [`validate`](Self::validate), skipping `excluded`, which is bound
    /// later (the pipeline parameter of a stdin run).
    pub fn validate_excluding(
        &self,
        op: &OperationDescriptor,
        excluded: Option<&str>,
    ) -> Result<(), ProtoError> {
        let checked = op
            .params
            .iter()
            .filter(|spec| spec.required && Some(spec.name) != excluded);
        for spec in checked {
            match self.values.get(spec.name) {
                None => {
                    return Err(ProtoError::MissingRequired {
                        operation: op.name,
                        param: spec.name,
                    });
                }
                Some(Bound::Null) => {
                    return Err(ProtoError::NullRequired {
                        operation: op.name,
                        param: spec.name,
                    });
                }
                Some(Bound::Value(_)) => {}
            }
        }
        Ok(())
    }
}

/// Parse raw command-line strings as a value of `spec.kind`.
pub fn parse_raw(spec: &ParamSpec, raw: &[String]) -> Result<Bound, ProtoError> {
    if raw.is_empty() || (raw.len() == 1 && raw[0].is_empty()) {
        return Ok(Bound::Null);
    }

    let invalid = |reason: String| ProtoError::InvalidValue {
        param: spec.name,
        reason,
    };

    let single = || match raw {
        [text] => Ok(text),
        _ => Err(invalid(format!(
            "expects a single {} value, got {}",
            spec.kind.label(),
            raw.len()
        ))),
    };

    let value = match spec.kind {
        ParamKind::StringList => parse_list(raw, None, &invalid)?,
        ParamKind::EnumList(allowed) => parse_list(raw, Some(allowed), &invalid)?,
        ParamKind::String => Value::String(single()?.clone()),
        ParamKind::Integer => {
            let text = single()?;
            text.trim()
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|e| invalid(format!("'{text}' is not an integer: {e}")))?
        }
        ParamKind::Boolean => {
            let text = single()?;
            match text.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(invalid(format!("'{text}' is not true or false"))),
            }
        }
        ParamKind::Document => {
            let doc: Value = serde_json::from_str(single()?)
                .map_err(|e| invalid(format!("not valid JSON: {e}")))?;
            if !(doc.is_object() || doc.is_array()) {
                return Err(invalid("expected a JSON object or array".into()));
            }
            doc
        }
        ParamKind::Enum(allowed) => {
            let text = single()?;
            canonical_constant(allowed, text)
                .map(Value::String)
                .ok_or_else(|| invalid(format!("'{text}' is not one of {}", allowed.join(", "))))?
        }
    };
    Ok(Bound::Value(value))
}

fn parse_list(
    raw: &[String],
    allowed: Option<&[&str]>,
    invalid: impl Fn(String) -> ProtoError,
) -> Result<Value, ProtoError> {
    let mut items = Vec::with_capacity(raw.len());
    for item in raw {
        if item.is_empty() {
            return Err(invalid("list elements cannot be empty".into()));
        }
        let item = match allowed {
            Some(allowed) => canonical_constant(allowed, item).ok_or_else(|| {
                invalid(format!("'{item}' is not one of {}", allowed.join(", ")))
            })?,
            None => item.clone(),
        };
        items.push(Value::String(item));
    }
    Ok(Value::Array(items))
}

fn canonical_constant(allowed: &[&str], text: &str) -> Option<String> {
    allowed
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(text))
        .map(|candidate| (*candidate).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_operation;
    use serde_json::json;
    use test_case::test_case;

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_string_binds_null() {
        let spec = ParamSpec::new("LinkId", ParamKind::String);
        assert_eq!(parse_raw(&spec, &raw(&[""])).expect("parse"), Bound::Null);
    }

    #[test_case(ParamKind::Integer, "25", json!(25) ; "integer")]
    #[test_case(ParamKind::Boolean, "TRUE", json!(true) ; "boolean any case")]
    #[test_case(ParamKind::Boolean, "false", json!(false) ; "boolean false")]
    #[test_case(ParamKind::String, "ws-abc123", json!("ws-abc123") ; "string as is")]
    #[test_case(ParamKind::Document, r#"[{"Key":"team","Value":"a"}]"#, json!([{"Key":"team","Value":"a"}]) ; "document array")]
    #[test_case(ParamKind::Enum(&["AVAILABLE", "ADMIN_MAINTENANCE"]), "available", json!("AVAILABLE") ; "enum canonical spelling")]
    fn scalar_kinds_parse(kind: ParamKind, text: &str, expected: Value) {
        let spec = ParamSpec::new("P", kind);
        assert_eq!(
            parse_raw(&spec, &raw(&[text])).expect("parse"),
            Bound::Value(expected)
        );
    }

    #[test_case(ParamKind::Integer, "ten" ; "integer text")]
    #[test_case(ParamKind::Boolean, "yes" ; "boolean word")]
    #[test_case(ParamKind::Document, "{broken" ; "malformed json")]
    #[test_case(ParamKind::Document, "42" ; "json scalar")]
    #[test_case(ParamKind::Enum(&["ENABLED"]), "DISABLED" ; "unknown constant")]
    fn bad_values_are_rejected(kind: ParamKind, text: &str) {
        let spec = ParamSpec::new("P", kind);
        let err = parse_raw(&spec, &raw(&[text])).expect_err("should reject");
        assert_eq!(err.kind(), "InvalidValue");
    }

    #[test]
    fn list_collects_every_value() {
        let spec = ParamSpec::new("WorkspaceIds", ParamKind::StringList);
        let bound = parse_raw(&spec, &raw(&["ws-1", "ws-2"])).expect("parse");
        assert_eq!(bound, Bound::Value(json!(["ws-1", "ws-2"])));
    }

    #[test]
    fn enum_list_canonicalizes_each_member() {
        let spec = ParamSpec::new("LinkStatusFilter", ParamKind::EnumList(&["LINKED", "REJECTED"]));
        let bound = parse_raw(&spec, &raw(&["linked", "Rejected"])).expect("parse");
        assert_eq!(bound, Bound::Value(json!(["LINKED", "REJECTED"])));
    }

    #[test_case(ParamKind::EnumList(&["LINKED"]), &["LINKED", "PENDING"] ; "unknown member")]
    #[test_case(ParamKind::StringList, &["ws-1", ""] ; "empty member")]
    fn bad_list_members_are_rejected(kind: ParamKind, values: &[&str]) {
        let spec = ParamSpec::new("Values", kind);
        let err = parse_raw(&spec, &raw(values)).expect_err("should fail");
        assert!(matches!(err, ProtoError::InvalidValue { .. }));
    }

    #[test]
    fn scalar_rejects_several_values() {
        let spec = ParamSpec::new("LinkId", ParamKind::String);
        assert!(parse_raw(&spec, &raw(&["a", "b"])).is_err());
    }

    #[test]
    fn required_absent_vs_null() {
        let op = find_operation("RejectAccountLinkInvitation").expect("op");

        let bindings = Bindings::new();
        assert!(matches!(
            bindings.validate(op),
            Err(ProtoError::MissingRequired { param: "LinkId", .. })
        ));

        let mut bindings = Bindings::new();
        bindings.bind_raw(op, "LinkId", &raw(&[""])).expect("bind");
        assert!(matches!(
            bindings.validate(op),
            Err(ProtoError::NullRequired { param: "LinkId", .. })
        ));

        let mut bindings = Bindings::new();
        bindings.bind_raw(op, "linkid", &raw(&["link-1"])).expect("bind");
        assert!(bindings.validate(op).is_ok());
        assert_eq!(bindings.string("LinkId"), Some("link-1"));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let op = find_operation("DescribeAccount").expect("op");
        let err = Bindings::new()
            .bind_raw(op, "Bogus", &raw(&["x"]))
            .expect_err("unknown");
        assert_eq!(err.kind(), "UnknownParameter");
    }
}
