//! Schema walking - turns a schema definition into a field tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::capability::{ChoiceCapable, SchemaCapable, SchemaSource};
use crate::definition::FieldDecl;
use crate::error::ExtractError;
use crate::types::{ExclusionSet, Settings, LIST_PLACEHOLDER};

/// One entry of a walked field tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    pub kind: String,
    pub required: bool,
    pub label: String,
    pub description: String,
    pub is_many: bool,
    /// Present only for choice fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<(Value, String)>>,
    /// Present only for nested and array-of-nested fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FieldNode>>,
}

/// Walks schemas resolved through a [`SchemaSource`].
pub struct Walker<'a> {
    source: &'a dyn SchemaSource,
    settings: &'a Settings,
}

impl<'a> Walker<'a> {
    pub fn new(source: &'a dyn SchemaSource, settings: &'a Settings) -> Self {
        Self { source, settings }
    }

    /// Walk `schema` into a field tree, skipping top-level fields in `exclude`.
    ///
    /// An absent or unknown schema yields an empty tree. Exclusions apply to
    /// this schema only, never to the schemas nested inside it.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::SchemaTooDeep` when nesting exceeds
    /// `Settings::max_depth`, which is how a self-referential schema ends.
    pub fn walk(
        &self,
        schema: Option<&str>,
        exclude: &ExclusionSet,
    ) -> Result<Vec<FieldNode>, ExtractError> {
        self.walk_at(schema, exclude, 0)
    }

    fn walk_at(
        &self,
        schema: Option<&str>,
        exclude: &ExclusionSet,
        depth: usize,
    ) -> Result<Vec<FieldNode>, ExtractError> {
        let Some(name) = schema else {
            return Ok(Vec::new());
        };

        if depth > self.settings.max_depth {
            return Err(ExtractError::SchemaTooDeep {
                schema: name.to_string(),
                limit: self.settings.max_depth,
            });
        }

        let Some(def) = self.source.schema(name) else {
            warn!(schema = name, "unknown schema reference, walking as empty");
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();

        if let Some(child) = def.list_child() {
            let children = self.walk_at(Some(child), exclude, depth + 1)?;
            nodes.push(FieldNode {
                name: def.field_name().unwrap_or(LIST_PLACEHOLDER).to_string(),
                kind: def.kind().to_string(),
                required: def.required(),
                label: def.label().unwrap_or_default().to_string(),
                description: def.description().unwrap_or_default().to_string(),
                is_many: true,
                choices: None,
                children: Some(children),
            });
        }

        let Some(fields) = def.fields() else {
            if def.list_child().is_none() {
                debug!(schema = name, "schema does not enumerate fields");
            }
            return Ok(nodes);
        };

        for field in fields {
            if exclude.contains(&field.name) {
                continue;
            }
            nodes.push(self.field_node(def, field, depth)?);
        }

        Ok(nodes)
    }

    fn field_node(
        &self,
        parent: &dyn SchemaCapable,
        field: &FieldDecl,
        depth: usize,
    ) -> Result<FieldNode, ExtractError> {
        if field.is_method_field() {
            if let Some(node) = self.method_field_node(parent, field, depth)? {
                return Ok(node);
            }
        }

        let children = match field.schema.as_deref() {
            Some(nested) => Some(self.nested_children(nested, depth + 1)?),
            None => None,
        };
        // an array-of-schema reference is array-valued whether or not `many` is set
        let is_many = field.many
            || field
                .schema
                .as_deref()
                .and_then(|nested| self.source.schema(nested))
                .is_some_and(|def| def.list_child().is_some());

        Ok(FieldNode {
            name: field.name.clone(),
            kind: field.kind.clone(),
            required: field.required,
            label: field.label.clone().unwrap_or_default(),
            description: field.help_text.clone().unwrap_or_default(),
            is_many,
            choices: field.choices().map(<[_]>::to_vec),
            children,
        })
    }

    /// Re-point a computed field at the schema documenting it, if any.
    fn method_field_node(
        &self,
        parent: &dyn SchemaCapable,
        field: &FieldDecl,
        depth: usize,
    ) -> Result<Option<FieldNode>, ExtractError> {
        let attr = &self.settings.method_fields_attr_name;
        let Some(alternate) = parent.method_field_class(attr, &field.name) else {
            return Ok(None);
        };
        let Some(def) = self.source.schema(alternate) else {
            warn!(
                field = %field.name,
                schema = alternate,
                "method field points at unknown schema"
            );
            return Ok(None);
        };

        Ok(Some(FieldNode {
            name: field.name.clone(),
            kind: def.kind().to_string(),
            required: def.required(),
            label: field.label.clone().unwrap_or_default(),
            description: def.description().unwrap_or_default().to_string(),
            is_many: def.list_child().is_some(),
            choices: None,
            children: Some(self.nested_children(alternate, depth + 1)?),
        }))
    }

    /// Fields of a nested schema; an array-of-schema contributes its child's.
    fn nested_children(&self, name: &str, depth: usize) -> Result<Vec<FieldNode>, ExtractError> {
        let none = ExclusionSet::new();
        match self.source.schema(name).and_then(|def| def.list_child()) {
            Some(child) => self.walk_at(Some(child), &none, depth + 1),
            None => self.walk_at(Some(name), &none, depth),
        }
    }
}
