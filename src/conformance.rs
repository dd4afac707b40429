//! Conformance support for generated API tests.
//!
//! Renders walked field trees as JSON Schema, produces deterministic sample
//! payloads, and checks payloads against an endpoint's fields.

use serde_json::{json, Map, Value};

use crate::endpoint::Endpoint;
use crate::error::{ConformanceError, PayloadError};
use crate::types::{Direction, CHOICE_KIND, LIST_PLACEHOLDER};
use crate::walker::FieldNode;

/// Render a field tree as a JSON Schema.
///
/// An unnamed array-of-schema root becomes an array schema.
pub fn to_json_schema(fields: &[FieldNode]) -> Value {
    match list_root(fields) {
        Some(children) => json!({ "type": "array", "items": object_schema(children) }),
        None => object_schema(fields),
    }
}

/// Which top-level fields a sample payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Every field.
    #[default]
    All,
    /// Required fields only.
    OnlyRequired,
    /// Required fields minus the last one; a conforming server rejects it.
    WithoutRequired,
}

/// Deterministic sample payload for a field tree, with every field.
pub fn sample_payload(fields: &[FieldNode]) -> Value {
    sample_payload_with(fields, SampleMode::All)
}

/// Deterministic sample payload for a field tree.
///
/// `mode` selects the top-level fields; nested objects are always complete.
pub fn sample_payload_with(fields: &[FieldNode], mode: SampleMode) -> Value {
    match list_root(fields) {
        Some(children) => Value::Array(vec![sample_top_level(children, mode)]),
        None => sample_top_level(fields, mode),
    }
}

fn sample_top_level(fields: &[FieldNode], mode: SampleMode) -> Value {
    let mut selected: Vec<&FieldNode> = fields
        .iter()
        .filter(|field| mode == SampleMode::All || field.required)
        .collect();
    if mode == SampleMode::WithoutRequired {
        selected.pop();
    }
    let object: Map<String, Value> = selected
        .into_iter()
        .map(|field| (field.name.clone(), sample_node(field)))
        .collect();
    Value::Object(object)
}

/// Input fields used to build a request for `verb`.
///
/// PATCH without its own input fields borrows PUT's.
pub fn request_fields<'a>(endpoint: &'a Endpoint, verb: &str) -> &'a [FieldNode] {
    let verb = verb.to_uppercase();
    let fields = endpoint.fields_for(Direction::In, &verb).unwrap_or_default();
    if fields.is_empty() && verb == "PATCH" {
        return endpoint
            .fields_for(Direction::In, "PUT")
            .unwrap_or_default();
    }
    fields
}

/// Check `payload` against a field tree.
///
/// # Errors
///
/// Returns `ConformanceError::Invalid` listing every mismatch, or
/// `ConformanceError::InvalidSchema` if the rendered schema is rejected.
pub fn check_payload(fields: &[FieldNode], payload: &Value) -> Result<(), ConformanceError> {
    let schema = to_json_schema(fields);
    let validator =
        jsonschema::validator_for(&schema).map_err(|e| ConformanceError::InvalidSchema {
            message: e.to_string(),
        })?;

    let errors: Vec<PayloadError> = validator
        .iter_errors(payload)
        .map(|e| PayloadError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConformanceError::Invalid { errors })
    }
}

fn list_root(fields: &[FieldNode]) -> Option<&[FieldNode]> {
    match fields {
        [root] if root.name == LIST_PLACEHOLDER => root.children.as_deref(),
        _ => None,
    }
}

fn object_schema(fields: &[FieldNode]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), node_schema(field));
        if field.required {
            required.push(Value::String(field.name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn node_schema(field: &FieldNode) -> Value {
    let item = match &field.children {
        Some(children) => object_schema(children),
        None => scalar_schema(field),
    };
    if field.is_many {
        json!({ "type": "array", "items": item })
    } else {
        item
    }
}

fn scalar_schema(field: &FieldNode) -> Value {
    if field.kind == CHOICE_KIND {
        let values: Vec<Value> = field
            .choices
            .iter()
            .flatten()
            .map(|(value, _)| value.clone())
            .collect();
        return json!({ "enum": values });
    }
    match json_type(&field.kind) {
        Some(ty) => json!({ "type": ty }),
        // unknown kinds accept anything
        None => json!({}),
    }
}

fn json_type(kind: &str) -> Option<&'static str> {
    match kind {
        "integer" => Some("integer"),
        "float" | "decimal" => Some("number"),
        "boolean" => Some("boolean"),
        "char" | "email" | "url" | "slug" | "uuid" | "date" | "datetime" | "time" => {
            Some("string")
        }
        _ => None,
    }
}

fn sample_object(fields: &[FieldNode]) -> Value {
    let object: Map<String, Value> = fields
        .iter()
        .map(|field| (field.name.clone(), sample_node(field)))
        .collect();
    Value::Object(object)
}

fn sample_node(field: &FieldNode) -> Value {
    let item = match &field.children {
        Some(children) => sample_object(children),
        None => sample_scalar(field),
    };
    if field.is_many {
        Value::Array(vec![item])
    } else {
        item
    }
}

fn sample_scalar(field: &FieldNode) -> Value {
    if field.kind == CHOICE_KIND {
        return field
            .choices
            .as_ref()
            .and_then(|choices| choices.first())
            .map(|(value, _)| value.clone())
            .unwrap_or(Value::Null);
    }
    match field.kind.as_str() {
        "integer" => json!(1),
        "float" | "decimal" => json!(1.0),
        "boolean" => json!(true),
        "email" => json!("test@example.com"),
        kind if json_type(kind) == Some("string") => json!("test"),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, kind: &str) -> FieldNode {
        FieldNode {
            name: name.into(),
            kind: kind.into(),
            required: false,
            label: String::new(),
            description: String::new(),
            is_many: false,
            choices: None,
            children: None,
        }
    }

    fn tree() -> Vec<FieldNode> {
        let mut id = node("id", "integer");
        id.required = true;
        let mut status = node("status", CHOICE_KIND);
        status.choices = Some(vec![
            (json!("open"), "Open".into()),
            (json!("closed"), "Closed".into()),
        ]);
        let mut tags = node("tags", "list");
        tags.is_many = true;
        tags.children = Some(vec![node("label", "char")]);
        vec![id, status, tags]
    }

    #[test]
    fn json_schema_of_tree() {
        let schema = to_json_schema(&tree());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["properties"]["id"], json!({ "type": "integer" }));
        assert_eq!(
            schema["properties"]["status"],
            json!({ "enum": ["open", "closed"] })
        );
        assert_eq!(schema["properties"]["tags"]["type"], "array");
        assert_eq!(
            schema["properties"]["tags"]["items"]["properties"]["label"],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn json_schema_of_list_root() {
        let mut root = node(LIST_PLACEHOLDER, "list");
        root.is_many = true;
        root.children = Some(vec![node("id", "integer")]);
        let schema = to_json_schema(&[root]);
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["properties"]["id"]["type"], "integer");
    }

    #[test]
    fn sample_payload_uses_first_choice() {
        let sample = sample_payload(&tree());
        assert_eq!(
            sample,
            json!({ "id": 1, "status": "open", "tags": [{ "label": "test" }] })
        );
    }

    fn required_tree() -> Vec<FieldNode> {
        let mut fields = tree();
        fields[1].required = true;
        fields
    }

    #[test]
    fn sample_only_required_fields() {
        let fields = required_tree();
        let sample = sample_payload_with(&fields, SampleMode::OnlyRequired);
        assert_eq!(sample, json!({ "id": 1, "status": "open" }));
        check_payload(&fields, &sample).unwrap();
    }

    #[test]
    fn sample_without_required_fails_check() {
        let fields = required_tree();
        let sample = sample_payload_with(&fields, SampleMode::WithoutRequired);
        assert_eq!(sample, json!({ "id": 1 }));

        let Err(ConformanceError::Invalid { errors }) = check_payload(&fields, &sample) else {
            panic!("expected missing required field");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("status"));
    }

    #[test]
    fn sample_modes_apply_to_list_items() {
        let mut root = node(LIST_PLACEHOLDER, "list");
        root.is_many = true;
        root.children = Some(required_tree());
        let sample = sample_payload_with(&[root], SampleMode::OnlyRequired);
        assert_eq!(sample, json!([{ "id": 1, "status": "open" }]));
    }

    #[test]
    fn sample_payload_conforms() {
        let fields = tree();
        check_payload(&fields, &sample_payload(&fields)).unwrap();
    }

    #[test]
    fn check_payload_reports_mismatches() {
        let result = check_payload(&tree(), &json!({ "status": "unknown" }));
        let Err(ConformanceError::Invalid { errors }) = result else {
            panic!("expected invalid payload");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.path == "/status"));
    }

    #[test]
    fn patch_borrows_put_fields() {
        let mut input = indexmap::IndexMap::new();
        input.insert("PUT".to_string(), tree());
        input.insert("PATCH".to_string(), Vec::new());
        let mut fields = crate::endpoint::EndpointFields::new();
        fields.insert(Direction::In, input);
        let endpoint = Endpoint {
            path: "/users/<pk>/".into(),
            permitted_verbs: vec!["PATCH".into(), "PUT".into()],
            docstring: String::new(),
            method_docstrings: indexmap::IndexMap::new(),
            permission_name: String::new(),
            fields,
        };

        assert_eq!(request_fields(&endpoint, "patch").len(), 3);
        assert!(request_fields(&endpoint, "POST").is_empty());
    }

    #[test]
    fn unknown_kind_accepts_anything() {
        let fields = vec![node("extra", "json")];
        check_payload(&fields, &json!({ "extra": { "nested": [1, 2] } })).unwrap();
        assert_eq!(sample_payload(&fields), json!({ "extra": null }));
    }
}
