//! Output projection.
//!
//! A [`Selector`] is resolved once per invocation against the operation's
//! declared response fields and parameters, so projecting never looks a name
//! up by reflection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::binding::Bindings;
use crate::descriptor::{OperationDescriptor, Output};
use crate::error::ProtoError;

/// `*`, `Field` or `^Param`.
static SELECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*|\^?[A-Za-z][A-Za-z0-9]*)$").unwrap_or_else(|_| unreachable!())
});

/// Which part of a call becomes the visible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The entire response.
    Whole,
    /// One documented response field.
    Field(&'static str),
    /// Echo a bound input parameter.
    Param(&'static str),
    /// Nothing is emitted.
    Nothing,
}

impl Selector {
    /// The operation's default projection.
    #[must_use]
    pub const fn default_for(op: &OperationDescriptor) -> Self {
        match op.output {
            Output::Field(field) => Self::Field(field),
            Output::Whole => Self::Whole,
            Output::Nothing => Self::Nothing,
        }
    }

    /// Resolve `--select` / `--pass-thru` for `op`.
    pub fn resolve(
        op: &OperationDescriptor,
        select: Option<&str>,
        pass_thru: bool,
    ) -> Result<Self, ProtoError> {
        match (select, pass_thru) {
            (Some(_), true) => Err(ProtoError::ConflictingFlags(
                "--select cannot be combined with --pass-thru".into(),
            )),
            (Some(expr), false) => Self::parse(op, expr),
            (None, true) => op.pass_thru.map(Self::Param).ok_or_else(|| {
                ProtoError::ConflictingFlags(format!("{} does not support --pass-thru", op.name))
            }),
            (None, false) => Ok(Self::default_for(op)),
        }
    }

    /// Parse a selector expression against `op`.
    pub fn parse(op: &OperationDescriptor, expr: &str) -> Result<Self, ProtoError> {
        let expr = expr.trim();
        let invalid = |reason: String| ProtoError::InvalidSelector {
            expr: expr.to_string(),
            reason,
        };

        if !SELECT_REGEX.is_match(expr) {
            return Err(invalid("expected '*', a response field or '^Parameter'".into()));
        }
        if expr == "*" {
            return Ok(Self::Whole);
        }
        if let Some(param) = expr.strip_prefix('^') {
            return op
                .param(param)
                .map(|spec| Self::Param(spec.name))
                .ok_or_else(|| invalid(format!("{} has no parameter '{param}'", op.name)));
        }
        op.response_field(expr).map(Self::Field).ok_or_else(|| {
            if op.response_fields.is_empty() {
                invalid(format!("{} returns no fields", op.name))
            } else {
                invalid(format!(
                    "{} returns {}",
                    op.name,
                    op.response_fields.join(", ")
                ))
            }
        })
    }

    /// Apply the selector to a response.
    #[must_use]
    pub fn project(&self, response: &Value, bindings: &Bindings) -> Value {
        match self {
            Self::Whole => response.clone(),
            Self::Field(field) => response.get(*field).cloned().unwrap_or(Value::Null),
            Self::Param(param) => bindings.value(param).cloned().unwrap_or(Value::Null),
            Self::Nothing => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_operation;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("*", Selector::Whole ; "whole response")]
    #[test_case("WorkspacesConnectionStatus", Selector::Field("WorkspacesConnectionStatus") ; "documented field")]
    #[test_case("nexttoken", Selector::Field("NextToken") ; "field any case")]
    #[test_case("^WorkspaceIds", Selector::Param("WorkspaceIds") ; "parameter echo")]
    fn parses(expr: &str, expected: Selector) {
        let op = find_operation("DescribeWorkspacesConnectionStatus").expect("op");
        assert_eq!(Selector::parse(op, expr).expect("parse"), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("Workspaces.0" ; "path syntax")]
    #[test_case("^" ; "bare caret")]
    #[test_case("Bogus" ; "undocumented field")]
    #[test_case("^Bogus" ; "undeclared parameter")]
    fn rejects(expr: &str) {
        let op = find_operation("DescribeWorkspacesConnectionStatus").expect("op");
        let err = Selector::parse(op, expr).expect_err("should reject");
        assert_eq!(err.kind(), "InvalidSelector");
    }

    #[test]
    fn select_and_pass_thru_conflict() {
        let op = find_operation("ModifyWorkspaceState").expect("op");
        let err = Selector::resolve(op, Some("*"), true).expect_err("conflict");
        assert_eq!(err.kind(), "ConflictingFlags");
    }

    #[test]
    fn pass_thru_echoes_declared_param() {
        let op = find_operation("ModifyWorkspaceState").expect("op");
        assert_eq!(
            Selector::resolve(op, None, true).expect("resolve"),
            Selector::Param("WorkspaceId")
        );
        let op = find_operation("DescribeWorkspaces").expect("op");
        assert!(Selector::resolve(op, None, true).is_err());
    }

    #[test]
    fn projection() {
        let op = find_operation("DescribeTags").expect("op");
        let mut bindings = Bindings::new();
        bindings
            .bind_raw(op, "ResourceId", &["ws-1".to_string()])
            .expect("bind");
        let response = json!({ "TagList": [{ "Key": "team", "Value": "a" }] });

        assert_eq!(
            Selector::default_for(op).project(&response, &bindings),
            json!([{ "Key": "team", "Value": "a" }])
        );
        assert_eq!(Selector::Whole.project(&response, &bindings), response);
        assert_eq!(
            Selector::Param("ResourceId").project(&response, &bindings),
            json!("ws-1")
        );
        assert_eq!(Selector::Nothing.project(&response, &bindings), Value::Null);
    }
}
