//! Schema assignment - decides which schema and exclusion set feed the
//! walker for every (direction, verb) of a route.
//!
//! # Declaration Shapes
//!
//! | Declaration | Meaning |
//! |-------------|---------|
//! | none | every direction and verb is empty |
//! | `"Schema"` (via `serializer_class`) | reused across verbs, direction by heuristic |
//! | `{ "GET": "Schema" }` | per verb, direction by heuristic |
//! | `{ "POST": { "in": "A", "out": "B" } }` | per verb and direction |
//!
//! Per-verb maps may mix the last two forms and may use the `ALL` key.
//!
//! # Heuristic Direction
//!
//! A bare schema declared under a key in `{GET, ALL}` is an output schema when
//! the route permits GET. Under a key in `{POST, PUT, PATCH, DELETE, ALL}` it
//! is an input schema when the route permits any of those verbs. `ALL` is in
//! both classes, so it can assign the same schema to both directions.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::capability::ViewCapable;
use crate::types::{
    json_type_name, Direction, ExclusionSet, Settings, ALL_VERBS_KEY, INPUT_BEARING_KEYS,
    OUTPUT_BEARING_KEYS,
};

/// Schemas declared for one verb key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbSchemas {
    /// One schema, direction decided by heuristic.
    Shared(String),
    /// Explicit schema per direction.
    Directed {
        input: Option<String>,
        output: Option<String>,
    },
}

/// Normalized schema declaration of a view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaDeclaration {
    #[default]
    Absent,
    Single(String),
    PerVerb(IndexMap<String, VerbSchemas>),
}

impl SchemaDeclaration {
    /// Read the declaration of `view`.
    ///
    /// The attribute named `Settings::serializers_attr_name` wins when it is a
    /// map; otherwise the view's `serializer_class` is used as a single schema.
    pub fn from_view(view: &dyn ViewCapable, settings: &Settings) -> Self {
        match view.declaration(&settings.serializers_attr_name) {
            Some(Value::Object(map)) => return Self::from_map(map),
            Some(other) => warn!(
                attr = %settings.serializers_attr_name,
                actual = json_type_name(other),
                "schema declaration is not a map, ignoring"
            ),
            None => {}
        }

        match view.serializer_class() {
            Some(schema) => SchemaDeclaration::Single(schema.to_string()),
            None => SchemaDeclaration::Absent,
        }
    }

    fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut verbs = IndexMap::new();
        for (key, value) in map {
            let entry = match value {
                Value::String(schema) => VerbSchemas::Shared(schema.clone()),
                Value::Object(directed) => VerbSchemas::Directed {
                    input: direction_value(directed, Direction::In)
                        .and_then(Value::as_str)
                        .map(String::from),
                    output: direction_value(directed, Direction::Out)
                        .and_then(Value::as_str)
                        .map(String::from),
                },
                other => {
                    warn!(
                        verb = %key,
                        actual = json_type_name(other),
                        "malformed schema declaration, ignoring"
                    );
                    continue;
                }
            };
            verbs.insert(key.to_uppercase(), entry);
        }
        SchemaDeclaration::PerVerb(verbs)
    }
}

/// Exclusions declared for one verb key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerbExclusion {
    /// Applies to a direction without its own list.
    pub all: ExclusionSet,
    pub input: ExclusionSet,
    pub output: ExclusionSet,
}

impl VerbExclusion {
    /// Concrete exclusion set for `direction`.
    pub fn for_direction(&self, direction: Direction) -> ExclusionSet {
        let specific = match direction {
            Direction::In => &self.input,
            Direction::Out => &self.output,
        };
        if specific.is_empty() {
            self.all.clone()
        } else {
            specific.clone()
        }
    }
}

/// Normalized exclusion declaration of a view, keyed by uppercase verb.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionDeclaration {
    verbs: IndexMap<String, VerbExclusion>,
}

impl ExclusionDeclaration {
    /// Read the attribute named `Settings::exclude_fields_attr_name` of `view`.
    ///
    /// Malformed values are treated as empty.
    pub fn from_view(view: &dyn ViewCapable, settings: &Settings) -> Self {
        match view.declaration(&settings.exclude_fields_attr_name) {
            Some(Value::Object(map)) => Self::from_map(map),
            Some(other) => {
                warn!(
                    attr = %settings.exclude_fields_attr_name,
                    actual = json_type_name(other),
                    "exclusion declaration is not a map, ignoring"
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Build from a JSON map of verb to exclusions.
    pub fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut verbs = IndexMap::new();
        for (key, value) in map {
            let exclusion = match value {
                Value::Array(_) => VerbExclusion {
                    all: field_names(value, key),
                    ..Default::default()
                },
                Value::Object(directed) => VerbExclusion {
                    input: direction_value(directed, Direction::In)
                        .map(|v| field_names(v, key))
                        .unwrap_or_default(),
                    output: direction_value(directed, Direction::Out)
                        .map(|v| field_names(v, key))
                        .unwrap_or_default(),
                    ..Default::default()
                },
                other => {
                    warn!(
                        verb = %key,
                        actual = json_type_name(other),
                        "malformed exclusion declaration, treating as empty"
                    );
                    VerbExclusion::default()
                }
            };
            verbs.insert(key.to_uppercase(), exclusion);
        }
        Self { verbs }
    }

    /// Exclusion set for `verb` in `direction`, falling back to the `ALL` key.
    pub fn resolve(&self, verb: &str, direction: Direction) -> ExclusionSet {
        self.verbs
            .get(verb)
            .or_else(|| self.verbs.get(ALL_VERBS_KEY))
            .map(|exclusion| exclusion.for_direction(direction))
            .unwrap_or_default()
    }
}

/// Schema and exclusions feeding one walk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaAssignment {
    pub schema: Option<String>,
    pub exclude: ExclusionSet,
}

/// Assignments per direction, then per permitted verb.
pub type Assignments = IndexMap<Direction, IndexMap<String, SchemaAssignment>>;

/// Decide the schema assignment for every permitted verb.
///
/// Every permitted verb gets an entry in both directions, with `schema`
/// left empty when nothing applies.
pub fn resolve_assignments(
    declared: &SchemaDeclaration,
    permitted_verbs: &[String],
    exclusions: &ExclusionDeclaration,
) -> Assignments {
    let mut assignments: Assignments = Direction::BOTH
        .iter()
        .map(|direction| (*direction, IndexMap::new()))
        .collect();

    for verb in permitted_verbs {
        let (input, output) = schemas_for_verb(declared, verb, permitted_verbs);

        for (direction, schema) in [(Direction::In, input), (Direction::Out, output)] {
            let assignment = SchemaAssignment {
                exclude: exclusions.resolve(verb, direction),
                schema,
            };
            if let Some(by_verb) = assignments.get_mut(&direction) {
                by_verb.insert(verb.clone(), assignment);
            }
        }
    }

    assignments
}

/// (input, output) schemas for `verb`.
fn schemas_for_verb(
    declared: &SchemaDeclaration,
    verb: &str,
    permitted_verbs: &[String],
) -> (Option<String>, Option<String>) {
    match declared {
        SchemaDeclaration::Absent => (None, None),
        SchemaDeclaration::Single(schema) => heuristic(verb, schema, permitted_verbs),
        SchemaDeclaration::PerVerb(map) => {
            let (key, entry) = match map.get(verb) {
                Some(entry) => (verb, entry),
                None => match map.get(ALL_VERBS_KEY) {
                    Some(entry) => (ALL_VERBS_KEY, entry),
                    None => return (None, None),
                },
            };
            match entry {
                VerbSchemas::Shared(schema) => heuristic(key, schema, permitted_verbs),
                VerbSchemas::Directed { input, output } => (input.clone(), output.clone()),
            }
        }
    }
}

fn heuristic(
    key: &str,
    schema: &str,
    permitted_verbs: &[String],
) -> (Option<String>, Option<String>) {
    let permits = |verb: &str| permitted_verbs.iter().any(|v| v == verb);

    let output =
        (OUTPUT_BEARING_KEYS.contains(&key) && permits("GET")).then(|| schema.to_string());
    let input = (INPUT_BEARING_KEYS.contains(&key)
        && INPUT_BEARING_KEYS.iter().any(|verb| permits(*verb)))
    .then(|| schema.to_string());

    (input, output)
}

fn direction_value(map: &serde_json::Map<String, Value>, direction: Direction) -> Option<&Value> {
    let key = direction.key();
    map.get(key).or_else(|| map.get(&key.to_uppercase()))
}

fn field_names(value: &Value, verb: &str) -> ExclusionSet {
    match value.as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        None => {
            warn!(
                verb = %verb,
                actual = json_type_name(value),
                "exclusion list is not an array, treating as empty"
            );
            ExclusionSet::new()
        }
    }
}
