//! Endpoint building - one resolved description per route.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assignment::{resolve_assignments, ExclusionDeclaration, SchemaDeclaration};
use crate::capability::{SchemaSource, ViewCapable};
use crate::definition::{RouteDef, RouterDef};
use crate::error::ExtractError;
use crate::path::compose_path;
use crate::types::{Direction, Settings};
use crate::verbs::resolve_verbs;
use crate::walker::{FieldNode, Walker};

/// Field trees per direction, then per permitted verb.
pub type EndpointFields = IndexMap<Direction, IndexMap<String, Vec<FieldNode>>>;

/// Fully resolved description of one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub permitted_verbs: Vec<String>,
    pub docstring: String,
    pub method_docstrings: IndexMap<String, String>,
    pub permission_name: String,
    pub fields: EndpointFields,
}

impl Endpoint {
    /// Field tree for `verb` in `direction`, if the verb is permitted.
    pub fn fields_for(&self, direction: Direction, verb: &str) -> Option<&[FieldNode]> {
        self.fields
            .get(&direction)?
            .get(&verb.to_uppercase())
            .map(Vec::as_slice)
    }

    pub fn permits(&self, verb: &str) -> bool {
        let verb = verb.to_uppercase();
        self.permitted_verbs.iter().any(|v| *v == verb)
    }
}

/// Builds [`Endpoint`]s from route, view, router and schema definitions.
pub struct EndpointBuilder<'a> {
    schemas: &'a dyn SchemaSource,
    router: Option<&'a RouterDef>,
    settings: &'a Settings,
}

impl<'a> EndpointBuilder<'a> {
    pub fn new(schemas: &'a dyn SchemaSource, settings: &'a Settings) -> Self {
        Self {
            schemas,
            router: None,
            settings,
        }
    }

    /// Cross-reference verbs against this router's registrations.
    pub fn router(mut self, router: Option<&'a RouterDef>) -> Self {
        self.router = router;
        self
    }

    /// Build the endpoint of `route`, bound to `view`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::SchemaTooDeep` if an assigned schema nests past
    /// the configured depth.
    pub fn build(
        &self,
        route: &RouteDef,
        view: &dyn ViewCapable,
    ) -> Result<Endpoint, ExtractError> {
        let path = compose_path(&route.pattern, route.parent.as_deref());

        let resolution = resolve_verbs(route, view, self.router);
        if resolution.verbs.is_empty() {
            warn!(path = %path, view = %route.view, "route accepts no verbs");
        }

        let docstring = resolution
            .docstring
            .as_deref()
            .or_else(|| view.docstring())
            .map(clean_docstring)
            .unwrap_or_default();

        let declared = SchemaDeclaration::from_view(view, self.settings);
        let exclusions = ExclusionDeclaration::from_view(view, self.settings);
        let assignments = resolve_assignments(&declared, &resolution.verbs, &exclusions);

        let walker = Walker::new(self.schemas, self.settings);
        let mut fields = EndpointFields::new();
        for (direction, by_verb) in &assignments {
            let mut walked = IndexMap::new();
            for (verb, assignment) in by_verb {
                let nodes = walker.walk(assignment.schema.as_deref(), &assignment.exclude)?;
                walked.insert(verb.clone(), nodes);
            }
            fields.insert(*direction, walked);
        }

        let method_docstrings = resolution
            .verbs
            .iter()
            .filter_map(|verb| {
                let doc = view.handler_doc(&verb.to_lowercase())?;
                let doc = clean_docstring(doc);
                (!doc.is_empty()).then(|| (verb.clone(), doc))
            })
            .collect();

        // only the first requirement is surfaced
        let permission_name = view
            .permission_names()
            .first()
            .cloned()
            .unwrap_or_default();

        Ok(Endpoint {
            path,
            permitted_verbs: resolution.verbs,
            docstring,
            method_docstrings,
            permission_name,
            fields,
        })
    }
}

/// Normalize a docstring: trim surrounding blank lines and remove the common
/// indentation of every line after the first.
pub fn clean_docstring(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let mut lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines.remove(0).trim().to_string());
    for line in lines {
        // indent counts chars, leading whitespace may be multibyte
        let body = line
            .char_indices()
            .nth(indent)
            .map_or("", |(idx, _)| &line[idx..]);
        cleaned.push(body.trim_end().to_string());
    }

    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    while cleaned.first().is_some_and(|line| line.trim().is_empty()) {
        cleaned.remove(0);
    }
    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ApiDefinition, ViewDef};
    use serde_json::{json, Value};

    fn definition(value: Value) -> ApiDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn route(pattern: &str, view: &str) -> RouteDef {
        RouteDef {
            pattern: pattern.into(),
            parent: None,
            view: view.into(),
            suffix: None,
        }
    }

    #[test]
    fn clean_docstring_dedents() {
        let doc = "Summary line.\n\n        Details here.\n          indented more.\n    ";
        assert_eq!(
            clean_docstring(doc),
            "Summary line.\n\nDetails here.\n  indented more."
        );
    }

    #[test]
    fn clean_docstring_strips_leading_blank_lines() {
        assert_eq!(clean_docstring("\n\n    Body.\n"), "Body.");
        assert_eq!(clean_docstring(""), "");
    }

    #[test]
    fn clean_docstring_multibyte_indent() {
        assert_eq!(
            clean_docstring("Summary.\n\u{3000}Keep me.\n\u{a0}\u{a0}Nested."),
            "Summary.\nKeep me.\n\u{a0}Nested."
        );
        assert_eq!(
            clean_docstring("Summary.\n\u{3000}Keep me.\n  Other."),
            "Summary.\nKeep me.\n Other."
        );
    }

    #[test]
    fn build_collects_metadata() {
        let def = definition(json!({
            "schemas": {
                "User": { "fields": [{ "name": "id", "kind": "integer" }] }
            }
        }));
        let view: ViewDef = serde_json::from_value(json!({
            "docstring": "Users.",
            "handlers": { "get": { "doc": "  Fetch a user.  " }, "put": {} },
            "permission_classes": ["IsAuthenticated", "IsAdminUser"],
            "serializer_class": "User"
        }))
        .unwrap();
        let settings = Settings::default();
        let mut users = route(r"^(?P<pk>\d+)/$", "User");
        users.parent = Some("^users/".into());

        let endpoint = EndpointBuilder::new(&def, &settings)
            .build(&users, &view)
            .unwrap();

        assert_eq!(endpoint.path, "/users/<pk>/");
        assert_eq!(endpoint.permitted_verbs, vec!["GET", "PUT"]);
        assert_eq!(endpoint.docstring, "Users.");
        assert_eq!(endpoint.permission_name, "IsAuthenticated");
        assert_eq!(endpoint.method_docstrings["GET"], "Fetch a user.");
        assert!(!endpoint.method_docstrings.contains_key("PUT"));
    }

    #[test]
    fn fields_defined_for_every_permitted_verb() {
        let def = definition(json!({
            "schemas": { "User": { "fields": [{ "name": "id", "kind": "integer" }] } }
        }));
        let view: ViewDef = serde_json::from_value(json!({
            "handlers": { "get": {}, "post": {}, "delete": {} },
            "serializer_class": "User"
        }))
        .unwrap();
        let settings = Settings::default();
        let endpoint = EndpointBuilder::new(&def, &settings)
            .build(&route("^users/$", "Users"), &view)
            .unwrap();

        for direction in Direction::BOTH {
            let verbs: Vec<&String> = endpoint.fields[&direction].keys().collect();
            assert_eq!(verbs, vec!["GET", "POST", "DELETE"]);
        }
        assert!(endpoint.fields_for(Direction::In, "OPTIONS").is_none());
        assert_eq!(endpoint.fields_for(Direction::Out, "get").unwrap().len(), 1);
    }

    #[test]
    fn view_without_verbs_builds_empty_endpoint() {
        let def = ApiDefinition::default();
        let view = ViewDef::default();
        let settings = Settings::default();
        let endpoint = EndpointBuilder::new(&def, &settings)
            .build(&route("^ping/$", "Ping"), &view)
            .unwrap();
        assert!(endpoint.permitted_verbs.is_empty());
        assert!(endpoint.fields[&Direction::In].is_empty());
        assert_eq!(endpoint.permission_name, "");
    }

    #[test]
    fn self_referential_schema_fails_build() {
        let def = definition(json!({
            "schemas": {
                "Node": { "fields": [{ "name": "next", "kind": "nested", "schema": "Node" }] }
            }
        }));
        let view: ViewDef = serde_json::from_value(json!({
            "handlers": { "get": {} },
            "serializer_class": "Node"
        }))
        .unwrap();
        let settings = Settings::default().max_depth(4);
        let result =
            EndpointBuilder::new(&def, &settings).build(&route("^nodes/$", "Nodes"), &view);
        assert!(matches!(result, Err(ExtractError::SchemaTooDeep { .. })));
    }
}
