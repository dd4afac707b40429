//! Core types for endpoint schema extraction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Verbs a view may advertise when it does not declare its own list.
pub const DEFAULT_HTTP_METHOD_NAMES: &[&str] = &[
    "get", "post", "put", "patch", "delete", "head", "options", "trace",
];

/// Pseudo-verb key applying a declaration to every verb.
pub const ALL_VERBS_KEY: &str = "ALL";

/// Keys whose bare schema describes what a route returns.
pub const OUTPUT_BEARING_KEYS: &[&str] = &["GET", ALL_VERBS_KEY];

/// Keys whose bare schema describes what a route accepts.
pub const INPUT_BEARING_KEYS: &[&str] = &["POST", "PUT", "PATCH", "DELETE", ALL_VERBS_KEY];

/// Name given to the synthetic node of an unnamed array-of-schema.
pub const LIST_PLACEHOLDER: &str = "[list]";

/// Field kind carrying enumerated choices.
pub const CHOICE_KIND: &str = "choice";

/// Field kind of a computed field with no fixed type.
pub const METHOD_KIND: &str = "method";

/// Field names excluded from a walked schema.
pub type ExclusionSet = BTreeSet<String>;

/// Returns the JSON type name for log and error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Direction of a payload relative to the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Request payload.
    In,
    /// Response payload.
    Out,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::In, Direction::Out];

    /// Returns the declaration key for this direction.
    pub fn key(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Create direction from a request flag (true = In, false = Out).
    pub fn from_request_flag(is_request: bool) -> Self {
        if is_request {
            Direction::In
        } else {
            Direction::Out
        }
    }
}

/// Sort and deduplicate verbs: ascending, with `DELETE` always last.
pub fn sort_verbs<I, S>(verbs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let unique: BTreeSet<String> = verbs.into_iter().map(Into::into).collect();
    let (mut sorted, delete): (Vec<String>, Vec<String>) =
        unique.into_iter().partition(|verb| verb != "DELETE");
    sorted.extend(delete);
    sorted
}

/// What the catalog does with a route whose extraction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteErrorPolicy {
    /// Drop the route from the catalog and keep going.
    #[default]
    Skip,
    /// Fail the whole catalog build.
    Abort,
}

/// Extraction settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// When true, documentation output is refused.
    pub hide_docs: bool,
    /// View attribute holding the schema declaration.
    pub serializers_attr_name: String,
    /// View attribute holding the field exclusions.
    pub exclude_fields_attr_name: String,
    /// Schema meta attribute mapping computed fields to schemas.
    pub method_fields_attr_name: String,
    /// Deepest nesting the walker follows before giving up.
    pub max_depth: usize,
    pub on_route_error: RouteErrorPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hide_docs: false,
            serializers_attr_name: "docs_serializer_classes".to_string(),
            exclude_fields_attr_name: "docs_exclude_fields".to_string(),
            method_fields_attr_name: "doc_method_fields_classes".to_string(),
            max_depth: 32,
            on_route_error: RouteErrorPolicy::Skip,
        }
    }
}

impl Settings {
    /// Set the recursion ceiling of the schema walker.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the per-route error policy.
    pub fn on_route_error(mut self, policy: RouteErrorPolicy) -> Self {
        self.on_route_error = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direction_keys() {
        assert_eq!(Direction::In.key(), "in");
        assert_eq!(Direction::Out.key(), "out");
        assert_eq!(serde_json::to_value(Direction::In).unwrap(), json!("in"));
    }

    #[test]
    fn sort_verbs_puts_delete_last() {
        let sorted = sort_verbs(["DELETE", "PUT", "GET", "PATCH"]);
        assert_eq!(sorted, vec!["GET", "PATCH", "PUT", "DELETE"]);
    }

    #[test]
    fn sort_verbs_deduplicates() {
        let sorted = sort_verbs(["POST", "GET", "POST", "GET"]);
        assert_eq!(sorted, vec!["GET", "POST"]);
    }

    #[test]
    fn settings_defaults_fill_missing_keys() {
        let settings: Settings = serde_json::from_value(json!({ "max_depth": 4 })).unwrap();
        assert_eq!(settings.max_depth, 4);
        assert_eq!(settings.serializers_attr_name, "docs_serializer_classes");
        assert_eq!(settings.on_route_error, RouteErrorPolicy::Skip);
    }

    #[test]
    fn settings_parse_abort_policy() {
        let settings: Settings =
            serde_json::from_value(json!({ "on_route_error": "abort" })).unwrap();
        assert_eq!(settings.on_route_error, RouteErrorPolicy::Abort);
    }
}
