//! Serde-backed route, view, router and schema definitions.
//!
//! An [`ApiDefinition`] is a JSON document describing a REST application:
//!
//! ```json
//! {
//!   "routes": [{ "pattern": "^users/$", "view": "UserList" }],
//!   "views": {
//!     "UserList": {
//!       "handlers": { "get": { "doc": "List users." } },
//!       "serializer_class": "User"
//!     }
//!   },
//!   "schemas": {
//!     "User": { "fields": [{ "name": "id", "kind": "integer", "required": true }] }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capability::{
    ChoiceCapable, RouteProvider, SchemaCapable, SchemaSource, VerbCapable, ViewCapable,
};
use crate::types::{CHOICE_KIND, DEFAULT_HTTP_METHOD_NAMES, METHOD_KIND};

/// A complete application definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDefinition {
    #[serde(default)]
    pub routes: Vec<RouteDef>,
    #[serde(default)]
    pub views: IndexMap<String, ViewDef>,
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterDef>,
}

/// One registered URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    /// Raw regular expression the route was registered with.
    pub pattern: String,
    /// Pattern of the include this route is nested under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Name of the bound view, also its identity in router registrations.
    pub view: String,
    /// Viewset route suffix ("List" or "Instance").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Router registration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDef {
    #[serde(default = "default_trailing_slash")]
    pub trailing_slash: String,
    #[serde(default = "default_lookup_regex")]
    pub lookup_regex: String,
    #[serde(default)]
    pub registrations: Vec<RouteRegistration>,
}

fn default_trailing_slash() -> String {
    "/".to_string()
}

fn default_lookup_regex() -> String {
    "(?P<pk>[^/.]+)".to_string()
}

impl Default for RouterDef {
    fn default() -> Self {
        Self {
            trailing_slash: default_trailing_slash(),
            lookup_regex: default_lookup_regex(),
            registrations: Vec::new(),
        }
    }
}

/// One viewset route generated by a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRegistration {
    pub prefix: String,
    /// Identity (view name) of the registered viewset.
    pub viewset: String,
    /// URL format with `{prefix}`, `{lookup}` and `{trailing_slash}` placeholders.
    pub url_template: String,
    /// Lowercase verb to handler name.
    #[serde(default)]
    pub verb_to_handler: IndexMap<String, String>,
}

impl RouteRegistration {
    /// Substitute the router's values into the URL template.
    pub fn url_pattern(&self, lookup: &str, trailing_slash: &str) -> String {
        self.url_template
            .replace("{prefix}", &self.prefix)
            .replace("{lookup}", lookup)
            .replace("{trailing_slash}", trailing_slash)
    }
}

/// A handler attribute of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Handler this attribute is an alias of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// A view class.
///
/// Keys not listed here are kept in `attributes` and are where schema and
/// exclusion declarations live, under their configured names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method_names: Option<Vec<String>>,
    #[serde(default)]
    pub handlers: IndexMap<String, HandlerDef>,
    #[serde(default)]
    pub model_viewset: bool,
    #[serde(default)]
    pub permission_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serializer_class: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A schema definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Declared fields; absent when the schema cannot enumerate them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDecl>>,
    /// Child schema of an array-of-schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<(Value, String)>>,
    #[serde(default)]
    pub many: bool,
    /// Nested schema reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl FieldDecl {
    /// Whether this is a computed field with no fixed type.
    pub fn is_method_field(&self) -> bool {
        self.kind == METHOD_KIND
    }
}

impl ChoiceCapable for FieldDecl {
    fn choices(&self) -> Option<&[(Value, String)]> {
        if self.kind != CHOICE_KIND {
            return None;
        }
        Some(self.choices.as_deref().unwrap_or_default())
    }
}

impl SchemaCapable for SchemaDef {
    fn fields(&self) -> Option<&[FieldDecl]> {
        self.fields.as_deref()
    }

    fn list_child(&self) -> Option<&str> {
        self.list_of.as_deref()
    }

    fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    fn required(&self) -> bool {
        self.required
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    fn method_field_class(&self, attr: &str, field: &str) -> Option<&str> {
        self.meta.get(attr)?.get(field)?.as_str()
    }
}

impl VerbCapable for ViewDef {
    fn http_method_names(&self) -> Vec<String> {
        match &self.http_method_names {
            Some(names) => names.iter().map(|n| n.to_lowercase()).collect(),
            None => DEFAULT_HTTP_METHOD_NAMES
                .iter()
                .map(|n| n.to_string())
                .collect(),
        }
    }

    fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    fn handler_identity<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let handler = self.handlers.get(name)?;
        Some(handler.target.as_deref().unwrap_or(name))
    }

    fn handler_doc(&self, name: &str) -> Option<&str> {
        self.handlers.get(name)?.doc.as_deref()
    }

    fn is_model_viewset(&self) -> bool {
        self.model_viewset
    }
}

impl ViewCapable for ViewDef {
    fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    fn permission_names(&self) -> &[String] {
        &self.permission_classes
    }

    fn declaration(&self, attr: &str) -> Option<&Value> {
        self.attributes.get(attr)
    }

    fn serializer_class(&self) -> Option<&str> {
        self.serializer_class.as_deref()
    }
}

impl SchemaSource for ApiDefinition {
    fn schema(&self, name: &str) -> Option<&dyn SchemaCapable> {
        self.schemas.get(name).map(|s| s as &dyn SchemaCapable)
    }
}

impl RouteProvider for ApiDefinition {
    fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    fn view(&self, name: &str) -> Option<&dyn ViewCapable> {
        self.views.get(name).map(|v| v as &dyn ViewCapable)
    }

    fn router(&self) -> Option<&RouterDef> {
        self.router.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn view_keeps_unknown_keys_as_declarations() {
        let view: ViewDef = serde_json::from_value(json!({
            "handlers": { "get": {} },
            "docs_serializer_classes": { "GET": "User" }
        }))
        .unwrap();

        assert_eq!(
            view.declaration("docs_serializer_classes"),
            Some(&json!({ "GET": "User" }))
        );
        assert!(view.declaration("handlers").is_none());
    }

    #[test]
    fn view_defaults_http_method_names() {
        let view = ViewDef::default();
        let names = view.http_method_names();
        assert_eq!(names.first().map(String::as_str), Some("get"));
        assert!(names.contains(&"options".to_string()));
    }

    #[test]
    fn handler_identity_follows_alias() {
        let view: ViewDef = serde_json::from_value(json!({
            "handlers": {
                "update": { "doc": "Update." },
                "partial_update": { "target": "update" }
            }
        }))
        .unwrap();

        assert_eq!(view.handler_identity("update"), Some("update"));
        assert_eq!(view.handler_identity("partial_update"), Some("update"));
        assert_eq!(view.handler_identity("destroy"), None);
    }

    #[test]
    fn registration_substitutes_template() {
        let registration = RouteRegistration {
            prefix: "users".into(),
            viewset: "UserViewSet".into(),
            url_template: "^{prefix}/{lookup}{trailing_slash}$".into(),
            verb_to_handler: IndexMap::new(),
        };
        let router = RouterDef::default();
        assert_eq!(
            registration.url_pattern(&router.lookup_regex, &router.trailing_slash),
            "^users/(?P<pk>[^/.]+)/$"
        );
    }

    #[test]
    fn choices_only_on_choice_kind() {
        let field: FieldDecl = serde_json::from_value(json!({
            "name": "status",
            "kind": "char",
            "choices": [["a", "A"]]
        }))
        .unwrap();
        assert!(field.choices().is_none());

        let field: FieldDecl = serde_json::from_value(json!({
            "name": "status",
            "kind": "choice"
        }))
        .unwrap();
        assert_eq!(field.choices(), Some(&[][..]));
    }

    #[test]
    fn method_field_class_reads_meta() {
        let schema: SchemaDef = serde_json::from_value(json!({
            "fields": [],
            "meta": { "doc_method_fields_classes": { "stats": "Stats" } }
        }))
        .unwrap();
        assert_eq!(
            schema.method_field_class("doc_method_fields_classes", "stats"),
            Some("Stats")
        );
        assert_eq!(
            schema.method_field_class("doc_method_fields_classes", "other"),
            None
        );
    }
}
