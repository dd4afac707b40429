//! Capability interfaces the extraction engine reads its inputs through.
//!
//! The engine never probes for optional attributes. Host adapters implement
//! these traits; [`crate::definition`] provides the serde-backed ones.

use serde_json::Value;

use crate::definition::{FieldDecl, RouteDef, RouterDef};

/// A field that may carry enumerated `(value, label)` pairs.
pub trait ChoiceCapable {
    fn choices(&self) -> Option<&[(Value, String)]>;
}

/// A structured-data definition whose fields can be walked.
pub trait SchemaCapable {
    /// Declared fields in declaration order.
    ///
    /// `None` when the schema cannot enumerate its fields.
    fn fields(&self) -> Option<&[FieldDecl]>;

    /// Child schema when instances are arrays of another schema.
    fn list_child(&self) -> Option<&str>;

    /// Name the schema is bound to when used as a field.
    fn field_name(&self) -> Option<&str>;

    fn required(&self) -> bool;

    fn label(&self) -> Option<&str>;

    fn description(&self) -> Option<&str>;

    /// Alternate schema documenting the computed field `field`, looked up in
    /// the meta attribute named `attr`.
    fn method_field_class(&self, attr: &str, field: &str) -> Option<&str>;

    /// Kind tag used when the schema itself appears as a field.
    fn kind(&self) -> &str {
        if self.list_child().is_some() {
            "list"
        } else {
            "nested"
        }
    }
}

/// Resolves schema references.
pub trait SchemaSource {
    fn schema(&self, name: &str) -> Option<&dyn SchemaCapable>;
}

/// Verb and handler capabilities of a view.
pub trait VerbCapable {
    /// Structurally supported verbs, lowercase, in the view's order.
    fn http_method_names(&self) -> Vec<String>;

    /// Whether the view exposes a handler attribute called `name`.
    fn has_handler(&self, name: &str) -> bool;

    /// Identity of the underlying handler bound to `name`.
    ///
    /// Two names resolving to the same identity are the same operation.
    fn handler_identity<'a>(&'a self, name: &'a str) -> Option<&'a str>;

    fn handler_doc(&self, name: &str) -> Option<&str>;

    /// Whether the view is a model viewset whose verbs follow the route suffix.
    fn is_model_viewset(&self) -> bool;
}

/// Everything the endpoint builder reads from a view.
pub trait ViewCapable: VerbCapable {
    fn docstring(&self) -> Option<&str>;

    /// Permission requirement names in declaration order.
    fn permission_names(&self) -> &[String];

    /// Raw declaration attribute looked up by its configured name.
    fn declaration(&self, attr: &str) -> Option<&Value>;

    /// Default schema of the view.
    fn serializer_class(&self) -> Option<&str>;
}

/// Enumerates routes and the views and router they are bound to.
pub trait RouteProvider {
    fn routes(&self) -> &[RouteDef];

    fn view(&self, name: &str) -> Option<&dyn ViewCapable>;

    fn router(&self) -> Option<&RouterDef>;
}
