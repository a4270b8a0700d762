//! Request construction.

use serde_json::{Map, Value};

use crate::binding::{Bindings, Bound};
use crate::descriptor::{OperationDescriptor, WireShape};

/// Build the JSON request body for `op` from `bindings`.
///
/// Null and absent parameters are omitted. Values are copied as bound.
#[must_use]
pub fn build_request(op: &OperationDescriptor, bindings: &Bindings) -> Map<String, Value> {
    let mut request = Map::new();
    for spec in op.params {
        let Some(Bound::Value(value)) = bindings.get(spec.name) else {
            continue;
        };
        match spec.wire {
            WireShape::Field => {
                request.insert(spec.name.to_string(), value.clone());
            }
            WireShape::WrapEach { field, key } => {
                let elements = match value {
                    Value::Array(items) => items.iter().map(|item| wrap(key, item)).collect(),
                    other => vec![wrap(key, other)],
                };
                request.insert(field.to_string(), Value::Array(elements));
            }
        }
    }
    request
}

/// Set (or clear) the continuation token on a request.
pub fn set_token(request: &mut Map<String, Value>, field: &str, token: Option<&str>) {
    match token {
        Some(token) => {
            request.insert(field.to_string(), Value::String(token.to_string()));
        }
        None => {
            request.remove(field);
        }
    }
}

fn wrap(key: &str, value: &Value) -> Value {
    let mut element = Map::with_capacity(1);
    element.insert(key.to_string(), value.clone());
    Value::Object(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_operation;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn unset_optionals_are_omitted() {
        let op = find_operation("RejectAccountLinkInvitation").expect("op");
        let mut bindings = Bindings::new();
        bindings.bind_raw(op, "LinkId", &strings(&["link-123"])).expect("bind");
        bindings.bind_raw(op, "ClientToken", &strings(&[""])).expect("bind");

        let request = build_request(op, &bindings);
        assert_eq!(Value::Object(request), json!({ "LinkId": "link-123" }));
    }

    #[test]
    fn batch_ids_are_wrapped() {
        let op = find_operation("TerminateWorkspaces").expect("op");
        let mut bindings = Bindings::new();
        bindings
            .bind_raw(op, "WorkspaceId", &strings(&["ws-1", "ws-2"]))
            .expect("bind");

        let request = build_request(op, &bindings);
        assert_eq!(
            Value::Object(request),
            json!({
                "TerminateWorkspaceRequests": [
                    { "WorkspaceId": "ws-1" },
                    { "WorkspaceId": "ws-2" }
                ]
            })
        );
    }

    #[test]
    fn typed_values_are_not_coerced() {
        let op = find_operation("DescribeWorkspaces").expect("op");
        let mut bindings = Bindings::new();
        bindings.bind_raw(op, "Limit", &strings(&["5"])).expect("bind");
        bindings.bind_raw(op, "UserName", &strings(&["5"])).expect("bind");

        let request = build_request(op, &bindings);
        assert_eq!(request["Limit"], json!(5));
        assert_eq!(request["UserName"], json!("5"));
    }

    #[test]
    fn token_set_and_cleared() {
        let mut request = Map::new();
        set_token(&mut request, "NextToken", Some("abc"));
        assert_eq!(request["NextToken"], json!("abc"));
        set_token(&mut request, "NextToken", None);
        assert!(request.is_empty());
    }
}
